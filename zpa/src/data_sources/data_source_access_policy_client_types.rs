//! Access policy client types data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::SchemaBuilder;
use tfplug::types::Dynamic;

use super::helpers::{
    client_error, computed_string, configure_provider_data, state_response, string_or_null,
    unconfigured_provider,
};
use crate::api::policy::ClientTypes;
use crate::ZpaProviderData;

const CLIENT_TYPES_ID: &str = "access_policy_client_types";

/// Attribute names double as keys of the `/clientTypes` response
const CLIENT_TYPES: &[&str] = &[
    "zpn_client_type_exporter",
    "zpn_client_type_exporter_noauth",
    "zpn_client_type_browser_isolation",
    "zpn_client_type_machine_tunnel",
    "zpn_client_type_ip_anchoring",
    "zpn_client_type_edge_connector",
    "zpn_client_type_zapp",
    "zpn_client_type_slogger",
    "zpn_client_type_branch_connector",
    "zpn_client_type_zapp_partner",
    "zpn_client_type_vdi",
    "zpn_client_type_zia_inspection",
];

#[derive(Default)]
pub struct AccessPolicyClientTypesDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl AccessPolicyClientTypesDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(client_types: &ClientTypes) -> Dynamic {
    let values = CLIENT_TYPES.iter().map(|name| {
        let value = client_types
            .get(*name)
            .map(|v| string_or_null(v))
            .unwrap_or(Dynamic::Null);
        (*name, value)
    });
    Dynamic::object(std::iter::once(("id", Dynamic::from(CLIENT_TYPES_ID))).chain(values))
}

#[async_trait]
impl DataSource for AccessPolicyClientTypesDataSource {
    fn type_name(&self) -> &str {
        "zpa_access_policy_client_types"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description(
                "Retrieves the available ZPA client type identifiers for use in access policies.",
            )
            .attribute(computed_string("id"));
        let schema = CLIENT_TYPES
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)))
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

        tracing::debug!("Retrieving access policy client types");

        match provider_data.client.policy().get_client_types().await {
            Ok(client_types) => state_response(flatten(&client_types)),
            Err(e) => {
                ReadDataSourceResponse::error(client_error("access policy client types", &e))
            }
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for AccessPolicyClientTypesDataSource {
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
