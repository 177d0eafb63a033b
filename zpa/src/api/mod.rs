pub mod app_connector;
pub mod application;
pub mod auth;
pub mod certificate;
pub mod client;
pub mod common;
pub mod error;
pub mod identity;
pub mod lss;
pub mod policy;
pub mod pool;
pub mod service_edge;

pub use auth::Credentials;
pub use client::{Client, ClientConfig, RetryConfig};
pub use common::{ApiQueryParams, IdName, PaginationParams};
pub use error::ApiError;

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    fn client_for(server: &ServerGuard, microtenant_id: Option<&str>) -> Client {
        Client::new(ClientConfig {
            base_url: server.url(),
            customer_id: "216196257331281920".to_string(),
            microtenant_id: microtenant_id.map(str::to_string),
            credentials: Credentials::Legacy {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
            },
            retry_config: RetryConfig {
                max_retries: 2,
                min_wait: Duration::from_millis(1),
                max_wait: Duration::from_millis(2),
                timeout_seconds: 5,
            },
            parallelism: 1,
            proxy: None,
            user_agent: None,
        })
        .unwrap()
    }

    async fn signin(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/signin")
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","access_token":"abc","expires_in":3600}"#)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn service_edge_group_by_name_uses_v1_listing() {
        let mut server = Server::new_async().await;
        let _signin = signin(&mut server).await;
        let mock = server
            .mock(
                "GET",
                "/mgmtconfig/v1/admin/customers/216196257331281920/serviceEdgeGroup",
            )
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search".into(), "edge group".into()),
                Matcher::UrlEncoded("microtenantId".into(), "777".into()),
            ]))
            .with_body(r#"{"totalPages":"1","list":[{"id":"10","name":"Edge Group","enabled":true}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("777"));
        let group = client
            .service_edges()
            .get_group_by_name("edge group")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(group.id, "10");
        assert!(group.enabled);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn lss_status_codes_are_unscoped() {
        let mut server = Server::new_async().await;
        let _signin = signin(&mut server).await;
        let mock = server
            .mock("GET", "/mgmtconfig/v2/admin/lssConfig/statusCodes")
            .match_query(Matcher::Missing)
            .with_body(r#"{"zpn_auth_log":{"A":{"code":1}}}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("777"));
        let codes = client.lss().get_status_codes().await.unwrap();
        assert!(codes.zpn_auth_log.contains_key("A"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn idp_lookup_ignores_microtenant() {
        let mut server = Server::new_async().await;
        let _signin = signin(&mut server).await;
        let mock = server
            .mock("GET", "/mgmtconfig/v1/admin/customers/216196257331281920/idp/5")
            .match_query(Matcher::Missing)
            .with_body(r#"{"id":"5","name":"Okta"}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("777"));
        let idp = client.identity().get_idp("5").await.unwrap();
        assert_eq!(idp.name, "Okta");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_object_maps_to_not_found() {
        let mut server = Server::new_async().await;
        let _signin = signin(&mut server).await;
        let _mock = server
            .mock(
                "GET",
                "/mgmtconfig/v1/admin/customers/216196257331281920/serviceEdge/404",
            )
            .with_status(404)
            .with_body(r#"{"id":"resource.not.found","reason":"gone"}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client
            .service_edges()
            .get_service_edge("404")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
