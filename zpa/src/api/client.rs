use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, RETRY_AFTER};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::auth::{Credentials, TokenSource};
use super::common::{
    find_named, mgmt_config_v1, mgmt_config_v2, user_config_v1, ApiErrorDetails,
    ApiErrorResponse, ApiQueryParams, ListPage, Named, PaginationParams,
};
use super::error::ApiError;
use super::pool::ConnectionPoolConfig;

/// Query parameter carrying the micro-tenant scope
pub const MICROTENANT_PARAM: &str = "microtenantId";

/// ZPA API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    scope: Scope,
}

/// Micro-tenant scope of a client handle
#[derive(Clone, Debug, PartialEq)]
enum Scope {
    /// The provider-level microtenant_id, if any
    Default,
    Tenant(String),
    /// Customer-wide objects that do not take a micro-tenant
    Unscoped,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    customer_id: String,
    default_microtenant: Option<String>,
    tokens: TokenSource,
    retry_config: RetryConfig,
    semaphore: Semaphore,
    parallelism: usize,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 100,
            min_wait: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
            timeout_seconds: 240,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff for the given zero-based attempt, clamped to
    /// `[min_wait, max_wait]`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.min(16));
        self.min_wait
            .saturating_mul(factor)
            .clamp(self.min_wait, self.max_wait.max(self.min_wait))
    }

    /// A server-requested wait, capped at `max_wait`
    pub fn bounded(&self, requested: Duration) -> Duration {
        requested.min(self.max_wait.max(self.min_wait))
    }
}

/// Everything needed to build a client; produced by the provider configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub customer_id: String,
    pub microtenant_id: Option<String>,
    pub credentials: Credentials,
    pub retry_config: RetryConfig,
    pub parallelism: usize,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

impl Client {
    /// Create a new API client. No request is made until the first call.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        if config.customer_id.trim().is_empty() {
            return Err(ApiError::InvalidConfig("customer_id is required".to_string()));
        }

        let pool_config = ConnectionPoolConfig {
            request_timeout: Duration::from_secs(config.retry_config.timeout_seconds),
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        };

        let http_client = pool_config.build_client()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let parallelism = config.parallelism.max(1);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                tokens: TokenSource::new(config.credentials, &base_url),
                base_url,
                customer_id: config.customer_id,
                default_microtenant: config
                    .microtenant_id
                    .filter(|id| !id.trim().is_empty()),
                retry_config: config.retry_config,
                semaphore: Semaphore::new(parallelism),
                parallelism,
            }),
            scope: Scope::Default,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn customer_id(&self) -> &str {
        &self.inner.customer_id
    }

    /// `/mgmtconfig/v1/admin/customers/{customer_id}`
    pub fn mgmt_v1(&self) -> String {
        mgmt_config_v1(&self.inner.customer_id)
    }

    /// `/mgmtconfig/v2/admin/customers/{customer_id}`
    pub fn mgmt_v2(&self) -> String {
        mgmt_config_v2(&self.inner.customer_id)
    }

    /// `/userconfig/v1/customers/{customer_id}`
    pub fn user_config_v1(&self) -> String {
        user_config_v1(&self.inner.customer_id)
    }

    /// Handle scoped to a micro-tenant. Blank ids keep the current scope.
    pub fn with_microtenant(&self, microtenant_id: &str) -> Self {
        let id = microtenant_id.trim();
        if id.is_empty() {
            return self.clone();
        }
        Self {
            inner: Arc::clone(&self.inner),
            scope: Scope::Tenant(id.to_string()),
        }
    }

    /// Handle that never sends a micro-tenant
    pub fn without_microtenant(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            scope: Scope::Unscoped,
        }
    }

    /// Micro-tenant sent with requests from this handle
    pub fn microtenant_id(&self) -> Option<&str> {
        match &self.scope {
            Scope::Default => self.inner.default_microtenant.as_deref(),
            Scope::Tenant(id) => Some(id),
            Scope::Unscoped => None,
        }
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with_params(path, &ApiQueryParams::new()).await
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let mut params = params.clone();
        if let Some(id) = self.microtenant_id() {
            if !params.contains(MICROTENANT_PARAM) {
                params = params.add(MICROTENANT_PARAM, id);
            }
        }
        let full_path = format!("{}{}", path, params.to_query_string());
        self.execute_with_retry(&full_path).await
    }

    /// Fetch one page of a listing
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        pagination: &PaginationParams,
    ) -> Result<ListPage<T>, ApiError> {
        self.get_with_params(path, &pagination.to_query_params())
            .await
    }

    /// Fetch every page of a listing. The first page reports the page count,
    /// the rest are fetched concurrently up to the configured parallelism.
    pub async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        search: Option<&str>,
    ) -> Result<Vec<T>, ApiError> {
        let mut pagination = PaginationParams::new();
        if let Some(search) = search {
            pagination = pagination.with_search(search);
        }

        let first: ListPage<T> = self.get_page(path, &pagination).await?;
        let total_pages = first.total_pages;
        let mut items = first.list;

        if total_pages > 1 {
            tracing::debug!(path = %path, total_pages, "Fetching remaining pages");
            let pages: Vec<ListPage<T>> = stream::iter(2..=total_pages)
                .map(|page| {
                    let pagination = pagination.clone().with_page(page);
                    async move { self.get_page::<T>(path, &pagination).await }
                })
                .buffered(self.inner.parallelism)
                .try_collect()
                .await?;
            for page in pages {
                items.extend(page.list);
            }
        }

        Ok(items)
    }

    /// Search a listing by name and return the case-insensitive exact match
    pub async fn find_by_name<T: DeserializeOwned + Named>(
        &self,
        path: &str,
        name: &str,
    ) -> Result<Option<T>, ApiError> {
        let items = self.get_all_pages::<T>(path, Some(name)).await?;
        tracing::debug!(path = %path, name = %name, candidates = items.len(), "Name lookup");
        Ok(find_named(items, name))
    }

    /// Execute request with retry logic
    async fn execute_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let _permit = self
            .inner
            .semaphore
            .acquire()
            .await
            .map_err(|_| ApiError::ServiceUnavailable)?;

        let url = format!("{}{}", self.inner.base_url, path);
        let retry = &self.inner.retry_config;
        let mut attempt = 0;
        let mut reauthenticated = false;
        let mut last_error = None;

        while attempt <= retry.max_retries {
            let token = self.inner.tokens.token(&self.inner.http_client).await?;

            tracing::debug!("GET request to: {}", url);

            let wait = match self
                .inner
                .http_client
                .get(&url)
                .bearer_auth(&token)
                .header(ACCEPT, "application/json")
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        if reauthenticated {
                            return Err(ApiError::AuthError(format!(
                                "request to {} was rejected after re-authentication",
                                path
                            )));
                        }
                        tracing::debug!("Token rejected, signing in again");
                        self.inner.tokens.invalidate().await;
                        reauthenticated = true;
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ApiError::NotFound(path.to_string()));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return self.handle_error_response(response).await;
                    }

                    retry_after(&response)
                        .map(|requested| retry.bounded(requested))
                        .unwrap_or_else(|| retry.backoff(attempt))
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ApiError::Timeout(retry.timeout_seconds));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }

                    retry.backoff(attempt)
                }
            };

            attempt += 1;
            if attempt > retry.max_retries {
                break;
            }

            tracing::warn!(
                "Retrying request to {} after {}ms (attempt {})",
                path,
                wait.as_millis(),
                attempt
            );
            tokio::time::sleep(wait).await;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::trace!("API response body: {}", text);

        let body = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let details = serde_json::from_str::<ApiErrorResponse>(&text)
            .ok()
            .map(|err| {
                Box::new(ApiErrorDetails {
                    id: err.id,
                    reason: err.reason,
                })
            });

        Err(ApiError::ApiError {
            status,
            message: text,
            details,
        })
    }

    pub fn app_connectors(&self) -> super::app_connector::AppConnectorApi<'_> {
        super::app_connector::AppConnectorApi::new(self)
    }

    pub fn applications(&self) -> super::application::ApplicationApi<'_> {
        super::application::ApplicationApi::new(self)
    }

    pub fn certificates(&self) -> super::certificate::CertificateApi<'_> {
        super::certificate::CertificateApi::new(self)
    }

    pub fn identity(&self) -> super::identity::IdentityApi {
        super::identity::IdentityApi::new(self)
    }

    pub fn policy(&self) -> super::policy::PolicyApi<'_> {
        super::policy::PolicyApi::new(self)
    }

    pub fn service_edges(&self) -> super::service_edge::ServiceEdgeApi<'_> {
        super::service_edge::ServiceEdgeApi::new(self)
    }

    pub fn lss(&self) -> super::lss::LssApi {
        super::lss::LssApi::new(self)
    }
}

/// `Retry-After` in delta-seconds form
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Widget {
        id: String,
        name: String,
    }

    impl Named for Widget {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn fast_retries(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            min_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(5),
            timeout_seconds: 5,
        }
    }

    fn test_client(server: &ServerGuard, retry_config: RetryConfig) -> Client {
        Client::new(ClientConfig {
            base_url: server.url(),
            customer_id: "123".to_string(),
            microtenant_id: None,
            credentials: Credentials::Legacy {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            retry_config,
            parallelism: 2,
            proxy: None,
            user_agent: Some("test".to_string()),
        })
        .unwrap()
    }

    async fn mock_signin(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/signin")
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","access_token":"tok","expires_in":"3600"}"#)
            .create_async()
            .await
    }

    #[test]
    fn test_backoff_is_clamped() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff(0), Duration::from_secs(2));
        assert_eq!(retry.backoff(1), Duration::from_secs(4));
        assert_eq!(retry.backoff(2), Duration::from_secs(8));
        assert_eq!(retry.backoff(3), Duration::from_secs(10));
        assert_eq!(retry.backoff(60), Duration::from_secs(10));
        assert_eq!(retry.bounded(Duration::from_secs(86_400)), Duration::from_secs(10));
        assert_eq!(retry.bounded(Duration::from_secs(3)), Duration::from_secs(3));
    }

    #[test]
    fn test_missing_customer_id() {
        let result = Client::new(ClientConfig {
            base_url: "https://config.private.zscaler.com".to_string(),
            customer_id: " ".to_string(),
            microtenant_id: None,
            credentials: Credentials::Legacy {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            retry_config: RetryConfig::default(),
            parallelism: 1,
            proxy: None,
            user_agent: None,
        });
        assert!(matches!(result, Err(ApiError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let signin = mock_signin(&mut server).await;
        let mock = server
            .mock("GET", "/mgmtconfig/v1/admin/customers/123/widget/1")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(r#"{"id":"1","name":"one"}"#)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(0));
        let path = format!("{}/widget/1", client.mgmt_v1());
        let widget: Widget = client.get(&path).await.unwrap();

        assert_eq!(widget.id, "1");
        signin.assert_async().await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        let limited = server
            .mock("GET", "/widget/1")
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/widget/1")
            .with_status(200)
            .with_body(r#"{"id":"1","name":"one"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(3));
        let widget: Widget = client.get("/widget/1").await.unwrap();

        assert_eq!(widget.name, "one");
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_long_retry_after_is_capped() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        let limited = server
            .mock("GET", "/widget/1")
            .with_status(429)
            .with_header("retry-after", "86400")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/widget/1")
            .with_status(200)
            .with_body(r#"{"id":"1","name":"one"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(1));
        let request = client.get::<Widget>("/widget/1");
        let widget = tokio::time::timeout(Duration::from_secs(5), request)
            .await
            .expect("retry wait should be capped at max_wait")
            .unwrap();

        assert_eq!(widget.id, "1");
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        let mock = server
            .mock("GET", "/widget/404")
            .with_status(404)
            .with_body(r#"{"id":"resource.not.found"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(5));
        let result: Result<Widget, _> = client.get("/widget/404").await;

        assert!(matches!(result, Err(ref e) if e.is_not_found()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        let mock = server
            .mock("GET", "/widget/1")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(2));
        let result: Result<Widget, _> = client.get("/widget/1").await;

        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_carries_details() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        server
            .mock("GET", "/widget/bad")
            .with_status(400)
            .with_body(r#"{"id":"invalid.input","reason":"bad id"}"#)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(2));
        match client.get::<Widget>("/widget/bad").await {
            Err(ApiError::ApiError {
                status, details, ..
            }) => {
                assert_eq!(status, 400);
                let details = details.unwrap();
                assert_eq!(details.reason.as_deref(), Some("bad id"));
            }
            other => panic!("unexpected result: {:?}", other.map(|w| w.id)),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_token_once() {
        let mut server = Server::new_async().await;
        let signin = server
            .mock("POST", "/signin")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
            .expect(2)
            .create_async()
            .await;
        let rejected = server
            .mock("GET", "/widget/1")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(3));
        let result: Result<Widget, _> = client.get("/widget/1").await;

        assert!(matches!(result, Err(ApiError::AuthError(_))));
        signin.assert_async().await;
        rejected.assert_async().await;
    }

    #[tokio::test]
    async fn test_microtenant_scoping() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        let scoped = server
            .mock("GET", "/widget/1")
            .match_query(Matcher::UrlEncoded(MICROTENANT_PARAM.into(), "mt-1".into()))
            .with_status(200)
            .with_body(r#"{"id":"1","name":"one"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(0));
        assert_eq!(client.microtenant_id(), None);

        let tenant = client.with_microtenant(" mt-1 ");
        assert_eq!(tenant.microtenant_id(), Some("mt-1"));
        assert_eq!(tenant.without_microtenant().microtenant_id(), None);
        assert_eq!(client.with_microtenant("  ").microtenant_id(), None);

        let _: Widget = tenant.get("/widget/1").await.unwrap();
        scoped.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_all_pages_and_find_by_name() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        let page1 = server
            .mock("GET", "/widget")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("pagesize".into(), "500".into()),
                Matcher::UrlEncoded("search".into(), "Two".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"totalPages":"2","list":[{"id":"1","name":"one"}]}"#)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/widget")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("search".into(), "Two".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"totalPages":"2","list":[{"id":"2","name":"two"}]}"#)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(0));
        let found: Option<Widget> = client.find_by_name("/widget", "Two").await.unwrap();

        assert_eq!(found.unwrap().id, "2");
        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_by_name_without_match() {
        let mut server = Server::new_async().await;
        mock_signin(&mut server).await;
        server
            .mock("GET", "/widget")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"totalPages":"1","list":[{"id":"1","name":"one-two"}]}"#)
            .create_async()
            .await;

        let client = test_client(&server, fast_retries(0));
        let found: Option<Widget> = client.find_by_name("/widget", "one").await.unwrap();
        assert!(found.is_none());
    }
}
