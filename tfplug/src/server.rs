//! Server module for running Terraform providers
//!
//! This module starts the provider's gRPC server and performs the go-plugin
//! handshake Terraform expects on stdout.

use crate::error::{Result, TfplugError};
use crate::grpc::GrpcProviderServer;
use crate::proto::provider_server::ProviderServer;
use crate::provider::Provider;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};
use tracing::{debug, info};

/// Environment variable and value go-plugin uses to confirm the binary was
/// launched by Terraform
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

/// Client certificate Terraform sends when it wants mutual TLS
const CLIENT_CERT_ENV: &str = "PLUGIN_CLIENT_CERT";

const CORE_PROTOCOL_VERSION: u32 = 1;
const PLUGIN_PROTOCOL_VERSION: u32 = 6;

/// Log level for the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Parses Terraform's TF_LOG values; JSON means trace
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "JSON" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            "OFF" => Some(LogLevel::Off),
            _ => None,
        }
    }

    /// TF_LOG_PROVIDER wins over TF_LOG
    pub fn from_env() -> Option<Self> {
        ["TF_LOG_PROVIDER", "TF_LOG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find_map(|value| Self::parse(&value))
    }

    fn filter(self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to TLS certificate file
    pub cert_path: PathBuf,
    /// Path to TLS key file
    pub key_path: PathBuf,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Whether to enable logging
    pub enable_logging: bool,
    /// Log level
    pub log_level: LogLevel,
    /// Timeout for graceful shutdown
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("./certs/localhost.pem"),
            key_path: PathBuf::from("./certs/localhost-key.pem"),
            max_message_size: 256 << 20, // 256MB
            enable_logging: true,
            log_level: LogLevel::from_env().unwrap_or(LogLevel::Info),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the certificate path
    pub fn with_cert_path(mut self, path: PathBuf) -> Self {
        self.cert_path = path;
        self
    }

    /// Set the key path
    pub fn with_key_path(mut self, path: PathBuf) -> Self {
        self.key_path = path;
        self
    }

    /// Set the maximum message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Terraform captures provider stderr into its own log, so no colours
fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level.filter())
        .try_init();
}

fn check_magic_cookie() -> Result<()> {
    match std::env::var(MAGIC_COOKIE_KEY) {
        Ok(value) if value == MAGIC_COOKIE_VALUE => Ok(()),
        _ => {
            eprintln!(
                "This binary is a plugin. These are not meant to be executed directly.\n\
                 Please execute the program that consumes these plugins, which will\n\
                 load any plugins automatically"
            );
            Err(TfplugError::HandshakeError(format!(
                "{} is missing or invalid",
                MAGIC_COOKIE_KEY
            )))
        }
    }
}

/// The handshake carries the server certificate as unpadded base64 DER,
/// which is the body of the PEM block with the padding removed
fn pem_to_handshake_cert(pem: &str) -> Result<String> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.starts_with("-----BEGIN CERTIFICATE-----"))
        .skip(1)
        .take_while(|line| !line.starts_with("-----END"))
        .collect();

    if body.is_empty() {
        return Err(TfplugError::TlsError(
            "no certificate found in PEM data".to_string(),
        ));
    }

    Ok(body.trim_end_matches('=').to_string())
}

fn handshake_line(addr: std::net::SocketAddr, cert: Option<&str>) -> String {
    let mut line = format!(
        "{}|{}|tcp|{}|grpc",
        CORE_PROTOCOL_VERSION, PLUGIN_PROTOCOL_VERSION, addr
    );
    if let Some(cert) = cert {
        line.push('|');
        line.push_str(cert);
    }
    line
}

/// Builds mutual TLS when Terraform asked for it through PLUGIN_CLIENT_CERT
async fn tls_config(config: &ServerConfig) -> Result<Option<(ServerTlsConfig, String)>> {
    let Ok(client_cert) = std::env::var(CLIENT_CERT_ENV) else {
        return Ok(None);
    };

    let cert = tokio::fs::read(&config.cert_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read certificate: {}", e)))?;

    let key = tokio::fs::read(&config.key_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read key: {}", e)))?;

    let handshake_cert = pem_to_handshake_cert(&String::from_utf8_lossy(&cert))?;

    let tls = ServerTlsConfig::new()
        .identity(Identity::from_pem(cert, key))
        .client_ca_root(Certificate::from_pem(client_cert));

    Ok(Some((tls, handshake_cert)))
}

/// Main entry point for running a provider
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    if config.enable_logging {
        init_logging(config.log_level);
    }

    check_magic_cookie()?;

    // Ignore the error when another crate already installed a provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let grpc_server = GrpcProviderServer::new(provider);
    let provider_service = ProviderServer::new(grpc_server)
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let actual_addr = listener.local_addr()?;

    let mut builder = Server::builder();
    let handshake = match tls_config(&config).await? {
        Some((tls, cert)) => {
            builder = builder.tls_config(tls)?;
            handshake_line(actual_addr, Some(&cert))
        }
        None => {
            debug!("{} not set, serving without TLS", CLIENT_CERT_ENV);
            handshake_line(actual_addr, None)
        }
    };

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", handshake)?;
    stdout.flush()?;

    info!(address = %actual_addr, "Provider server listening");

    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);
    builder
        .add_service(provider_service)
        .serve_with_incoming(incoming)
        .await?;

    Ok(())
}

/// Convenience function to run a provider with default configuration
pub async fn serve_default<P: Provider + 'static>(provider: P) -> Result<()> {
    serve(provider, ServerConfig::default()).await
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;

    const TEST_PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIU\nQUJDRA==\n-----END CERTIFICATE-----\n";

    #[test]
    fn handshake_line_without_tls() {
        let addr: std::net::SocketAddr = "127.0.0.1:4242".parse().unwrap();
        assert_eq!(handshake_line(addr, None), "1|6|tcp|127.0.0.1:4242|grpc");
    }

    #[test]
    fn handshake_line_with_certificate() {
        let addr: std::net::SocketAddr = "127.0.0.1:4242".parse().unwrap();
        let cert = pem_to_handshake_cert(TEST_PEM).unwrap();
        assert_eq!(cert, "MIIBszCCAVmgAwIBAgIUQUJDRA");
        assert_eq!(
            handshake_line(addr, Some(&cert)),
            "1|6|tcp|127.0.0.1:4242|grpc|MIIBszCCAVmgAwIBAgIUQUJDRA"
        );
    }

    #[test]
    fn pem_without_certificate_is_rejected() {
        assert!(pem_to_handshake_cert("not a pem").is_err());
    }

    #[test]
    fn log_level_parses_terraform_values() {
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("JSON"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse(" warn "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    #[serial]
    fn provider_log_level_wins_over_global() {
        std::env::set_var("TF_LOG", "ERROR");
        std::env::set_var("TF_LOG_PROVIDER", "DEBUG");
        assert_eq!(LogLevel::from_env(), Some(LogLevel::Debug));

        std::env::remove_var("TF_LOG_PROVIDER");
        assert_eq!(LogLevel::from_env(), Some(LogLevel::Error));

        std::env::remove_var("TF_LOG");
        assert_eq!(LogLevel::from_env(), None);
    }

    #[test]
    #[serial]
    fn magic_cookie_is_required() {
        std::env::remove_var(MAGIC_COOKIE_KEY);
        assert!(check_magic_cookie().is_err());

        std::env::set_var(MAGIC_COOKIE_KEY, MAGIC_COOKIE_VALUE);
        assert!(check_magic_cookie().is_ok());

        std::env::remove_var(MAGIC_COOKIE_KEY);
    }

    #[tokio::test]
    #[serial]
    async fn tls_is_skipped_without_client_certificate() {
        std::env::remove_var(CLIENT_CERT_ENV);
        let tls = tls_config(&ServerConfig::default()).await.unwrap();
        assert!(tls.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn tls_requires_certificate_files_when_requested() {
        std::env::set_var(CLIENT_CERT_ENV, TEST_PEM);
        let config = ServerConfig::default()
            .with_cert_path(PathBuf::from("/nonexistent/cert.pem"))
            .with_key_path(PathBuf::from("/nonexistent/key.pem"));

        let result = tls_config(&config).await;
        std::env::remove_var(CLIENT_CERT_ENV);

        assert!(matches!(result, Err(TfplugError::TlsError(_))));
    }
}
