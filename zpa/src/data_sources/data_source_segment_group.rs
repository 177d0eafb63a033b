//! Segment group data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, SchemaBuilder};
use tfplug::types::{Dynamic, DynamicValue};

use super::helpers::{
    client_error, configure_provider_data, micro_tenant, microtenant_state, not_found,
    not_found_as_none, read_identifier, string_or_null, unconfigured_provider,
};
use crate::api::application::SegmentGroup;
use crate::ZpaProviderData;

#[derive(Default)]
pub struct SegmentGroupDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl SegmentGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(group: &SegmentGroup, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(group.id.clone())),
        ("name", string_or_null(&group.name)),
        ("description", string_or_null(&group.description)),
        ("enabled", Dynamic::Bool(group.enabled)),
        ("config_space", string_or_null(&group.config_space)),
        ("creation_time", string_or_null(&group.creation_time)),
        ("modified_by", string_or_null(&group.modified_by)),
        ("modified_time", string_or_null(&group.modified_time)),
        (
            "microtenant_id",
            microtenant_state(microtenant_id, &group.microtenant_id),
        ),
        ("microtenant_name", string_or_null(&group.microtenant_name)),
    ])
}

#[async_trait]
impl DataSource for SegmentGroupDataSource {
    fn type_name(&self) -> &str {
        "zpa_segment_group"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA segment group by ID or name.")
            .attribute(
                AttributeBuilder::string("id")
                    .description("The ID of the segment group.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .description("The name of the segment group.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(AttributeBuilder::string("description").computed().build())
            .attribute(AttributeBuilder::bool("enabled").computed().build())
            .attribute(AttributeBuilder::string("config_space").computed().build())
            .attribute(AttributeBuilder::string("creation_time").computed().build())
            .attribute(AttributeBuilder::string("modified_by").computed().build())
            .attribute(AttributeBuilder::string("modified_time").computed().build())
            .attribute(
                AttributeBuilder::string("microtenant_id")
                    .description("The microtenant to search in.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(AttributeBuilder::string("microtenant_name").computed().build())
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
        let microtenant_id = micro_tenant(&request.config);
        let client = provider_data.scoped_client(microtenant_id.as_deref());
        let api = client.applications();

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading segment group");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_segment_group(id).await),
            None => api.get_segment_group_by_name(&identifier.name).await,
        };

        match result {
            Ok(Some(group)) => ReadDataSourceResponse {
                state: DynamicValue::new(flatten(&group, microtenant_id.as_deref())),
                diagnostics: vec![],
                deferred: None,
            },
            Ok(None) => ReadDataSourceResponse::error(not_found("segment group", &identifier)),
            Err(e) => ReadDataSourceResponse::error(client_error("segment group", &e)),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for SegmentGroupDataSource {
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
