//! HTTP client construction for the ZPA API: pooling, timeouts and proxy

use std::time::Duration;

use super::error::ApiError;

pub struct ConnectionPoolConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(240),
            tcp_keepalive: Some(Duration::from_secs(30)),
            proxy: None,
            user_agent: None,
        }
    }
}

impl ConnectionPoolConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connection_timeout)
            .pool_idle_timeout(self.idle_timeout)
            .pool_max_idle_per_host(self.max_idle_connections);

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        if let Some(proxy) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| ApiError::InvalidConfig(format!("invalid proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_proxy() {
        let config = ConnectionPoolConfig {
            proxy: Some("http://proxy.example.com:3128".to_string()),
            user_agent: Some("test-agent".to_string()),
            ..Default::default()
        };
        tokio_test::assert_ok!(config.build_client());
    }

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let config = ConnectionPoolConfig {
            proxy: Some("http://[::1".to_string()),
            ..Default::default()
        };
        tokio_test::assert_err!(config.build_client());
    }
}
