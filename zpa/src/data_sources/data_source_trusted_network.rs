//! Trusted network data source implementation

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
    computed_string, configure_provider_data, id_attribute, lookup_response, name_attribute,
    not_found_as_none, read_identifier, string_or_null, unconfigured_provider,
};
use crate::api::policy::TrustedNetwork;
use crate::ZpaProviderData;

const NETWORK_STRINGS: &[&str] = &[
    "creation_time",
    "domain",
    "master_customer_id",
    "modified_by",
    "modified_time",
    "network_id",
    "zscaler_cloud",
];

#[derive(Default)]
pub struct TrustedNetworkDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl TrustedNetworkDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(network: &TrustedNetwork) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(network.id.clone())),
        ("name", string_or_null(&network.name)),
        ("creation_time", string_or_null(&network.creation_time)),
        ("domain", string_or_null(&network.domain)),
        ("master_customer_id", string_or_null(&network.master_customer_id)),
        ("modified_by", string_or_null(&network.modified_by)),
        ("modified_time", string_or_null(&network.modified_time)),
        ("network_id", string_or_null(&network.network_id)),
        ("zscaler_cloud", string_or_null(&network.zscaler_cloud)),
    ])
}

#[async_trait]
impl DataSource for TrustedNetworkDataSource {
    fn type_name(&self) -> &str {
        "zpa_trusted_network"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA trusted network by ID or name.")
            .attribute(id_attribute("trusted network"))
            .attribute(name_attribute("trusted network"));
        let schema = NETWORK_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)))
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return ReadDataSourceResponse::error(unconfigured_provider());
        };

        let identifier = match read_identifier(&request.config) {
            Ok(identifier) => identifier,
            Err(diag) => return ReadDataSourceResponse::error(diag),
        };
        let api = provider_data.client.policy();

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading trusted network");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_trusted_network(id).await),
            None => api.get_trusted_network_by_name(&identifier.name).await,
        };

        lookup_response(result, "trusted network", &identifier, flatten)
    }
}

#[async_trait]
impl DataSourceWithConfigure for TrustedNetworkDataSource {
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
    fn flatten_keeps_master_customer_and_nulls_blanks() {
        let network: TrustedNetwork = serde_json::from_str(
            r#"{
                "id": "72058304855088543",
                "name": "Corp-Trusted-Networks",
                "masterCustomerId": 216196257331281920,
                "networkId": "869ad7c1-ffe7-4b6b-a29a-d5b1d05d1bf4",
                "domain": " ",
                "zscalerCloud": "zscalertwo"
            }"#,
        )
        .unwrap();

        let Dynamic::Map(state) = flatten(&network) else {
            panic!("expected an object");
        };
        assert_eq!(state["master_customer_id"], Dynamic::from("216196257331281920"));
        assert_eq!(state["zscaler_cloud"], Dynamic::from("zscalertwo"));
        assert_eq!(state["domain"], Dynamic::Null);
        assert_eq!(state["modified_time"], Dynamic::Null);
        for name in NETWORK_STRINGS {
            assert!(state.contains_key(*name), "{}", name);
        }
    }
}
