//! LSS status codes data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::Dynamic;

use super::helpers::{
    client_error, computed_string, configure_provider_data, map_interface_to_string_map,
    state_response, unconfigured_provider,
};
use crate::api::lss::LssStatusCodes;
use crate::ZpaProviderData;

const LSS_STATUS_CODES_ID: &str = "lss_status_codes";

const LOG_TYPES: &[&str] = &[
    "zpn_auth_log",
    "zpn_ast_auth_log",
    "zpn_trans_log",
    "zpn_sys_auth_log",
];

#[derive(Default)]
pub struct LssConfigStatusCodesDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl LssConfigStatusCodesDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `zpn_auth_log` carries the connector auth table, same as `zpn_ast_auth_log`
fn flatten(codes: &LssStatusCodes) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::from(LSS_STATUS_CODES_ID)),
        ("zpn_auth_log", map_interface_to_string_map(&codes.zpn_ast_auth_log)),
        ("zpn_ast_auth_log", map_interface_to_string_map(&codes.zpn_ast_auth_log)),
        ("zpn_trans_log", map_interface_to_string_map(&codes.zpn_trans_log)),
        ("zpn_sys_auth_log", map_interface_to_string_map(&codes.zpn_sys_auth_log)),
    ])
}

#[async_trait]
impl DataSource for LssConfigStatusCodesDataSource {
    fn type_name(&self) -> &str {
        "zpa_lss_config_status_codes"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves the LSS status codes maps for each log type.")
            .attribute(computed_string("id"));
        let schema = LOG_TYPES
            .iter()
            .fold(builder, |builder, name| {
                builder.attribute(
                    AttributeBuilder::new(name, AttributeType::map_of(AttributeType::String))
                        .description(&format!("Status codes for {}.", name))
                        .computed()
                        .build(),
                )
            })
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return ReadDataSourceResponse::error(unconfigured_provider());
        };

        tracing::debug!("Retrieving LSS status codes");

        match provider_data.client.lss().get_status_codes().await {
            Ok(codes) => state_response(flatten(&codes)),
            Err(e) => ReadDataSourceResponse::error(client_error("LSS status codes", &e)),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for LssConfigStatusCodesDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let (provider_data, response) = configure_provider_data(self.type_name(), request);
        if provider_data.is_some() {
            self.provider_data = provider_data;
        }
        response
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn auth_log_mirrors_connector_auth_codes() {
        let codes: LssStatusCodes = serde_json::from_str(
            r#"{
                "zpn_auth_log": {"zpn_status_auth_success": "Authentication successful"},
                "zpn_ast_auth_log": {"zpn_status_ast_ok": "Connector authenticated"},
                "zpn_trans_log": {}
            }"#,
        )
        .unwrap();
        let Dynamic::Map(state) = flatten(&codes) else {
            panic!("expected an object");
        };
        assert_eq!(state["id"], Dynamic::from("lss_status_codes"));
        assert_eq!(state["zpn_auth_log"], state["zpn_ast_auth_log"]);
        let Dynamic::Map(auth) = &state["zpn_auth_log"] else {
            panic!("expected a map");
        };
        assert_eq!(
            auth["zpn_status_ast_ok"],
            Dynamic::from("\"Connector authenticated\"")
        );
        assert!(!auth.contains_key("zpn_status_auth_success"));
        assert_eq!(state["zpn_trans_log"], Dynamic::Null);
        assert_eq!(state["zpn_sys_auth_log"], Dynamic::Null);
    }
}
