use std::io::Result;

fn main() -> Result<()> {
    let protoc = protoc_bin_vendored::protoc_bin_path()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;
    let include = protoc_bin_vendored::include_path()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;
    std::env::set_var("PROTOC", protoc);

    println!("cargo:rerun-if-changed=proto/tfplugin6.9.proto");

    tonic_build::configure()
        .build_client(false)
        .build_server(true)
        .compile_protos(
            &["proto/tfplugin6.9.proto"],
            &[std::path::PathBuf::from("proto"), include],
        )
}
