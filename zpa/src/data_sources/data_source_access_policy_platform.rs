//! Access policy platforms data source implementation

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
use crate::api::policy::Platforms;
use crate::ZpaProviderData;

const PLATFORMS_ID: &str = "platforms";

#[derive(Default)]
pub struct AccessPolicyPlatformDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl AccessPolicyPlatformDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(platforms: &Platforms) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::from(PLATFORMS_ID)),
        ("linux", string_or_null(&platforms.linux)),
        ("android", string_or_null(&platforms.android)),
        ("windows", string_or_null(&platforms.windows)),
        ("ios", string_or_null(&platforms.ios)),
        ("mac", string_or_null(&platforms.mac)),
    ])
}

#[async_trait]
impl DataSource for AccessPolicyPlatformDataSource {
    fn type_name(&self) -> &str {
        "zpa_access_policy_platform"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = ["id", "linux", "android", "windows", "ios", "mac"]
            .iter()
            .fold(
                SchemaBuilder::new()
                    .version(0)
                    .description("Retrieves the platforms usable in access policy conditions."),
                |builder, name| builder.attribute(computed_string(name)),
            )
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

        tracing::debug!("Retrieving access policy platforms");

        match provider_data.client.policy().get_platforms().await {
            Ok(platforms) => state_response(flatten(&platforms)),
            Err(e) => ReadDataSourceResponse::error(client_error("access policy platforms", &e)),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for AccessPolicyPlatformDataSource {
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
