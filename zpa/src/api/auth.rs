//! Bearer token acquisition for the OneAPI and legacy sign-in flows

use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::common::string_or_number;
use super::error::ApiError;

/// Audience requested from the OneAPI identity service
pub const ONEAPI_AUDIENCE: &str = "https://api.zscaler.com";

/// Tokens are refreshed this long before they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token response carries no expiry
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Upper bound on the lifetime trusted from a token response
const MAX_EXPIRES_IN: u64 = 86_400;

#[derive(Clone)]
pub enum Credentials {
    /// OAuth2 client credentials against `{vanity}.zslogin.net`
    OneApi {
        token_url: String,
        client_id: String,
        client_secret: String,
    },
    /// `POST {base_url}/signin` with the ZPA API key pair
    Legacy {
        client_id: String,
        client_secret: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::OneApi {
                token_url,
                client_id,
                ..
            } => f
                .debug_struct("OneApi")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Credentials::Legacy { client_id, .. } => f
                .debug_struct("Legacy")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    pub fn client_id(&self) -> &str {
        match self {
            Credentials::OneApi { client_id, .. } | Credentials::Legacy { client_id, .. } => {
                client_id
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token_type: Option<String>,
    access_token: String,
    #[serde(default, deserialize_with = "string_or_number")]
    expires_in: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

/// Caches one bearer token and fetches a new one on first use or expiry.
/// The mutex is held across the fetch so concurrent callers share one sign-in.
pub struct TokenSource {
    credentials: Credentials,
    base_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credentials: Credentials, base_url: &str) -> Self {
        Self {
            credentials,
            base_url: base_url.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn token(&self, http: &reqwest::Client) -> Result<String, ApiError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.fetch(http).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch(&self, http: &reqwest::Client) -> Result<CachedToken, ApiError> {
        let request = match &self.credentials {
            Credentials::OneApi {
                token_url,
                client_id,
                client_secret,
            } => {
                tracing::debug!(client_id = %client_id, "Requesting OneAPI access token");
                http.post(token_url).form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("audience", ONEAPI_AUDIENCE),
                ])
            }
            Credentials::Legacy {
                client_id,
                client_secret,
            } => {
                tracing::debug!(client_id = %client_id, "Signing in with legacy ZPA credentials");
                http.post(format!("{}/signin", self.base_url)).form(&[
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                ])
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::error!(
                client_id = %self.credentials.client_id(),
                status = status.as_u16(),
                "Failed to obtain access token"
            );
            return Err(ApiError::AuthError(format!(
                "failed to sign in {}: HTTP {}: {}",
                self.credentials.client_id(),
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::ParseError(format!("invalid token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(ApiError::AuthError(
                "token response did not include an access token".to_string(),
            ));
        }

        if let Some(kind) = token.token_type.as_deref() {
            if !kind.eq_ignore_ascii_case("bearer") {
                tracing::warn!(token_type = %kind, "Unexpected token type, using it as a bearer token");
            }
        }

        let expires_in = token
            .expires_in
            .trim()
            .parse::<u64>()
            .unwrap_or(DEFAULT_EXPIRES_IN)
            .min(MAX_EXPIRES_IN);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        })
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn http() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[tokio::test]
    async fn test_oneapi_token_is_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth2/v1/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                Matcher::UrlEncoded("client_id".into(), "id".into()),
                Matcher::UrlEncoded("client_secret".into(), "secret".into()),
                Matcher::UrlEncoded("audience".into(), ONEAPI_AUDIENCE.into()),
            ]))
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","access_token":"abc","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let source = TokenSource::new(
            Credentials::OneApi {
                token_url: format!("{}/oauth2/v1/token", server.url()),
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            "http://unused",
        );

        let client = http();
        assert_eq!(source.token(&client).await.unwrap(), "abc");
        assert_eq!(source.token(&client).await.unwrap(), "abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_legacy_signin_with_string_expiry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/signin")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client_id".into(), "legacy".into()),
                Matcher::UrlEncoded("client_secret".into(), "pw".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","access_token":"legacy-token","expires_in":"3600"}"#)
            .create_async()
            .await;

        let source = TokenSource::new(
            Credentials::Legacy {
                client_id: "legacy".to_string(),
                client_secret: "pw".to_string(),
            },
            &server.url(),
        );

        assert_eq!(source.token(&http()).await.unwrap(), "legacy-token");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refetched() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/signin")
            .with_status(200)
            .with_body(r#"{"access_token":"short","expires_in":10}"#)
            .expect(2)
            .create_async()
            .await;

        let source = TokenSource::new(
            Credentials::Legacy {
                client_id: "id".to_string(),
                client_secret: "pw".to_string(),
            },
            &server.url(),
        );

        let client = http();
        source.token(&client).await.unwrap();
        source.token(&client).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_signin_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/signin")
            .with_status(401)
            .with_body(r#"{"id":"invalid.credentials"}"#)
            .create_async()
            .await;

        let source = TokenSource::new(
            Credentials::Legacy {
                client_id: "id".to_string(),
                client_secret: "bad".to_string(),
            },
            &server.url(),
        );

        match source.token(&http()).await {
            Err(ApiError::AuthError(message)) => assert!(message.contains("HTTP 401")),
            other => panic!("expected auth error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_oversized_expiry_is_clamped() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/signin")
            .with_status(200)
            .with_body(
                r#"{"token_type":"Bearer","access_token":"long-lived","expires_in":"18446744073709551615"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let source = TokenSource::new(
            Credentials::Legacy {
                client_id: "legacy".to_string(),
                client_secret: "pw".to_string(),
            },
            &server.url(),
        );

        let client = http();
        assert_eq!(source.token(&client).await.unwrap(), "long-lived");
        assert_eq!(source.token(&client).await.unwrap(), "long-lived");

        let cached = source.cached.lock().await.clone().unwrap();
        assert!(cached.expires_at <= Instant::now() + Duration::from_secs(MAX_EXPIRES_IN));
        mock.assert_async().await;
    }

    #[test]
    fn test_debug_hides_secret() {
        let creds = Credentials::OneApi {
            token_url: "https://acme.zslogin.net/oauth2/v1/token".to_string(),
            client_id: "id".to_string(),
            client_secret: "very-secret".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("very-secret"));
        assert_eq!(creds.client_id(), "id");
    }
}
