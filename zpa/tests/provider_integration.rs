//! Provider lifecycle against a mock ZPA API: configure, hand the client to
//! a data source, read

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use mockito::{Matcher, Server, ServerGuard};
use serial_test::serial;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::types::{AttributePath, ClientCapabilities, Dynamic, DynamicValue};
use zpa::ZpaProvider;

const CUSTOMER_ID: &str = "216196257331281920";

fn clear_env() {
    for var in [
        "ZSCALER_CLIENT_ID",
        "ZSCALER_CLIENT_SECRET",
        "ZSCALER_PRIVATE_KEY",
        "ZSCALER_VANITY_DOMAIN",
        "ZSCALER_CLOUD",
        "ZPA_CUSTOMER_ID",
        "ZPA_MICROTENANT_ID",
        "ZSCALER_USE_LEGACY_CLIENT",
        "ZPA_CLIENT_ID",
        "ZPA_CLIENT_SECRET",
        "ZPA_CLOUD",
        "ZSCALER_HTTP_PROXY",
    ] {
        std::env::remove_var(var);
    }
}

async fn mock_signin(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/signin")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "api-key-id".into()),
            Matcher::UrlEncoded("client_secret".into(), "api-key-secret".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"token_type":"Bearer","access_token":"legacy-token","expires_in":"3600"}"#)
        .expect(1)
        .create_async()
        .await
}

/// Configures the provider in legacy mode against the mock server and reads
/// one data source with the resulting provider data
async fn configure_and_read(
    server: &ServerGuard,
    type_name: &str,
    config: Dynamic,
) -> ReadDataSourceResponse {
    let mut provider = ZpaProvider::new();
    let configured = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config: DynamicValue::new(Dynamic::object([
                    ("use_legacy_client", Dynamic::Bool(true)),
                    ("zpa_client_id", Dynamic::from("api-key-id")),
                    ("zpa_client_secret", Dynamic::from("api-key-secret")),
                    ("zpa_customer_id", Dynamic::from(CUSTOMER_ID)),
                    ("zpa_cloud", Dynamic::String(server.url())),
                    ("max_retries", Dynamic::Number(1.0)),
                ])),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(configured.diagnostics.is_empty());

    let factories = provider.data_sources();
    let mut data_source = factories.get(type_name).unwrap()();
    let response = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: configured.provider_data,
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());

    data_source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: type_name.to_string(),
                config: DynamicValue::new(config),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn segment_group_lookup_by_name() {
    clear_env();
    let mut server = Server::new_async().await;
    let signin = mock_signin(&mut server).await;

    let listing = server
        .mock(
            "GET",
            format!("/mgmtconfig/v1/admin/customers/{}/segmentGroup", CUSTOMER_ID).as_str(),
        )
        .match_header("authorization", "Bearer legacy-token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("search".into(), "Browser Access Apps".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{
                "totalPages": "1",
                "list": [
                    {"id": "72058304855015574", "name": "Browser Access Apps Legacy", "enabled": true},
                    {
                        "id": "72058304855015575",
                        "name": "browser access apps",
                        "description": "",
                        "enabled": "true",
                        "configSpace": "DEFAULT",
                        "creationTime": 1625698796,
                        "modifiedBy": "72058304855015424"
                    }
                ]
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let response = configure_and_read(
        &server,
        "zpa_segment_group",
        Dynamic::object([("name", Dynamic::from("Browser Access Apps"))]),
    )
    .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = &response.state;
    assert_eq!(
        state.get_string(&AttributePath::new("id")).unwrap(),
        "72058304855015575"
    );
    assert!(state.get_bool(&AttributePath::new("enabled")).unwrap());
    assert_eq!(
        state.get_string(&AttributePath::new("creation_time")).unwrap(),
        "1625698796"
    );
    assert_eq!(
        state.get(&AttributePath::new("description")),
        Some(&Dynamic::Null)
    );
    assert_eq!(
        state.get(&AttributePath::new("microtenant_id")),
        Some(&Dynamic::Null)
    );

    signin.assert_async().await;
    listing.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn missing_id_reports_not_found() {
    clear_env();
    let mut server = Server::new_async().await;
    let _signin = mock_signin(&mut server).await;

    let _missing = server
        .mock(
            "GET",
            format!(
                "/mgmtconfig/v1/admin/customers/{}/segmentGroup/12345",
                CUSTOMER_ID
            )
            .as_str(),
        )
        .with_status(404)
        .with_body(r#"{"id":"resource.not.found","reason":"Resource not found"}"#)
        .create_async()
        .await;

    let response = configure_and_read(
        &server,
        "zpa_segment_group",
        Dynamic::object([("id", Dynamic::from("12345"))]),
    )
    .await;

    assert!(response.state.is_null());
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Not Found");
    assert_eq!(
        response.diagnostics[0].detail,
        "Segment group with id \"12345\" or name \"\" not found."
    );
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn microtenant_id_scopes_the_request() {
    clear_env();
    let mut server = Server::new_async().await;
    let _signin = mock_signin(&mut server).await;

    let scoped = server
        .mock(
            "GET",
            format!(
                "/mgmtconfig/v1/admin/customers/{}/segmentGroup/777",
                CUSTOMER_ID
            )
            .as_str(),
        )
        .match_query(Matcher::UrlEncoded(
            "microtenantId".into(),
            "216196257331285825".into(),
        ))
        .with_status(200)
        .with_body(
            r#"{"id":"777","name":"Tenant Apps","enabled":false,"microtenantId":"216196257331285825","microtenantName":"Tenant A"}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let response = configure_and_read(
        &server,
        "zpa_segment_group",
        Dynamic::object([
            ("id", Dynamic::from("777")),
            ("microtenant_id", Dynamic::from("216196257331285825")),
        ]),
    )
    .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = &response.state;
    assert_eq!(
        state.get_string(&AttributePath::new("microtenant_id")).unwrap(),
        "216196257331285825"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("microtenant_name")).unwrap(),
        "Tenant A"
    );
    assert!(!state.get_bool(&AttributePath::new("enabled")).unwrap());

    scoped.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn scim_group_lookup_by_name_resolves_idp_first() {
    clear_env();
    let mut server = Server::new_async().await;
    let _signin = mock_signin(&mut server).await;

    let idp = server
        .mock(
            "GET",
            format!("/mgmtconfig/v2/admin/customers/{}/idp", CUSTOMER_ID).as_str(),
        )
        .match_query(Matcher::UrlEncoded("search".into(), "Okta".into()))
        .with_status(200)
        .with_body(r#"{"totalPages":"1","list":[{"id":"72058304855021553","name":"Okta"}]}"#)
        .expect(1)
        .create_async()
        .await;
    let groups = server
        .mock(
            "GET",
            format!(
                "/userconfig/v1/customers/{}/scimgroup/idpId/72058304855021553",
                CUSTOMER_ID
            )
            .as_str(),
        )
        .match_query(Matcher::UrlEncoded("search".into(), "Engineering".into()))
        .with_status(200)
        .with_body(
            r#"{
                "totalPages": 1,
                "list": [{
                    "id": 2079446,
                    "name": "Engineering",
                    "idpId": 72058304855021553,
                    "idpGroupId": "00g1m2n3",
                    "creationTime": 1631718059,
                    "modifiedTime": 1631718100
                }]
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let response = configure_and_read(
        &server,
        "zpa_scim_groups",
        Dynamic::object([
            ("name", Dynamic::from("Engineering")),
            ("idp_name", Dynamic::from("Okta")),
        ]),
    )
    .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = &response.state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "2079446");
    assert_eq!(
        state.get_string(&AttributePath::new("idp_id")).unwrap(),
        "72058304855021553"
    );
    assert_eq!(state.get_string(&AttributePath::new("idp_name")).unwrap(), "Okta");
    assert_eq!(
        state.get_number(&AttributePath::new("modified_time")).unwrap(),
        1631718100.0
    );

    idp.assert_async().await;
    groups.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn scim_group_by_name_requires_an_idp() {
    clear_env();
    let mut server = Server::new_async().await;
    let _signin = mock_signin(&mut server).await;

    let response = configure_and_read(
        &server,
        "zpa_scim_groups",
        Dynamic::object([("name", Dynamic::from("Engineering"))]),
    )
    .await;

    assert!(response.state.is_null());
    assert_eq!(response.diagnostics[0].summary, "Missing Required Attribute");
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn lss_status_codes_are_read_without_lookup_inputs() {
    clear_env();
    let mut server = Server::new_async().await;
    let _signin = mock_signin(&mut server).await;

    let _codes = server
        .mock(
            "GET",
            "/mgmtconfig/v2/admin/lssConfig/statusCodes",
        )
        .with_status(200)
        .with_body(
            r#"{
                "zpn_auth_log": {"zpn_status_auth_success": "Authentication successful"},
                "zpn_trans_log": {"zpn_status_ok": "Transaction successful"}
            }"#,
        )
        .create_async()
        .await;

    let response = configure_and_read(
        &server,
        "zpa_lss_config_status_codes",
        Dynamic::Map(HashMap::new()),
    )
    .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .state
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "lss_status_codes"
    );
    let trans = response
        .state
        .get_map(&AttributePath::new("zpn_trans_log"))
        .unwrap();
    assert!(trans.contains_key("zpn_status_ok"));
}
