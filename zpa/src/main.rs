use std::env;
use tfplug::ServerConfig;
use zpa::ZpaProvider;

#[tokio::main]
async fn main() -> tfplug::Result<()> {
    let exe_dir = env::current_exe()?
        .parent()
        .map(|dir| dir.to_path_buf())
        .ok_or("executable has no parent directory")?;

    // Only read when Terraform asks for mTLS through PLUGIN_CLIENT_CERT
    let config = ServerConfig::default()
        .with_cert_path(exe_dir.join("../../certs/localhost+2.pem"))
        .with_key_path(exe_dir.join("../../certs/localhost+2-key.pem"));

    tfplug::serve(ZpaProvider::new(), config).await
}
