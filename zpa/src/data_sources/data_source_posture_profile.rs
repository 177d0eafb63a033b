//! Posture profile data source implementation

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
use crate::api::policy::PostureProfile;
use crate::ZpaProviderData;

const PROFILE_STRINGS: &[&str] = &[
    "master_customer_id",
    "domain",
    "posture_udid",
    "zscaler_cloud",
    "zscaler_customer_id",
    "creation_time",
    "modified_time",
    "modified_by",
];

#[derive(Default)]
pub struct PostureProfileDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl PostureProfileDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(profile: &PostureProfile) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(profile.id.clone())),
        ("name", string_or_null(&profile.name)),
        ("master_customer_id", string_or_null(&profile.master_customer_id)),
        ("domain", string_or_null(&profile.domain)),
        ("posture_udid", string_or_null(&profile.posture_udid)),
        ("zscaler_cloud", string_or_null(&profile.zscaler_cloud)),
        ("zscaler_customer_id", string_or_null(&profile.zscaler_customer_id)),
        ("creation_time", string_or_null(&profile.creation_time)),
        ("modified_time", string_or_null(&profile.modified_time)),
        ("modified_by", string_or_null(&profile.modified_by)),
    ])
}

#[async_trait]
impl DataSource for PostureProfileDataSource {
    fn type_name(&self) -> &str {
        "zpa_posture_profile"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA posture profile by ID or name.")
            .attribute(id_attribute("posture profile"))
            .attribute(name_attribute("posture profile"));
        let schema = PROFILE_STRINGS
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

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading posture profile");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_posture_profile(id).await),
            None => api.get_posture_profile_by_name(&identifier.name).await,
        };

        lookup_response(result, "posture profile", &identifier, flatten)
    }
}

#[async_trait]
impl DataSourceWithConfigure for PostureProfileDataSource {
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

    #[tokio::test]
    async fn read_without_configure_fails() {
        let ds = PostureProfileDataSource::new();
        let response = ds
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "zpa_posture_profile".to_string(),
                    config: tfplug::types::DynamicValue::new(Dynamic::object([(
                        "name",
                        Dynamic::from("CrowdStrike_ZPA_ZTA_40"),
                    )])),
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Unconfigured Provider");
    }
}
