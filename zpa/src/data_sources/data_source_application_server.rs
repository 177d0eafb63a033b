//! Application server data source implementation

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
    computed_bool, computed_string, configure_provider_data, id_attribute, lookup_response,
    micro_tenant, microtenant_id_attribute, microtenant_state, name_attribute, not_found_as_none,
    read_identifier, string_or_null, string_set_or_null, unconfigured_provider,
};
use crate::api::application::AppServer;
use crate::ZpaProviderData;

#[derive(Default)]
pub struct ApplicationServerDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl ApplicationServerDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(server: &AppServer, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(server.id.clone())),
        ("name", string_or_null(&server.name)),
        ("description", string_or_null(&server.description)),
        ("enabled", Dynamic::Bool(server.enabled)),
        ("address", string_or_null(&server.address)),
        ("app_server_group_ids", string_set_or_null(&server.app_server_group_ids)),
        ("config_space", string_or_null(&server.config_space)),
        ("creation_time", string_or_null(&server.creation_time)),
        ("modifiedby", string_or_null(&server.modified_by)),
        ("modified_time", string_or_null(&server.modified_time)),
        ("microtenant_id", microtenant_state(microtenant_id, &server.microtenant_id)),
        ("microtenant_name", string_or_null(&server.microtenant_name)),
    ])
}

#[async_trait]
impl DataSource for ApplicationServerDataSource {
    fn type_name(&self) -> &str {
        "zpa_application_server"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Retrieves an application server by ID or name.")
            .attribute(id_attribute("application server"))
            .attribute(name_attribute("application server"))
            .attribute(computed_string("description"))
            .attribute(computed_bool("enabled"))
            .attribute(computed_string("address"))
            .attribute(
                AttributeBuilder::new(
                    "app_server_group_ids",
                    AttributeType::set_of(AttributeType::String),
                )
                .description("Server groups the application server belongs to.")
                .computed()
                .build(),
            )
            .attribute(computed_string("config_space"))
            .attribute(computed_string("creation_time"))
            .attribute(computed_string("modifiedby"))
            .attribute(computed_string("modified_time"))
            .attribute(microtenant_id_attribute())
            .attribute(computed_string("microtenant_name"))
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

        let result = match identifier.id() {
            Some(id) => {
                tracing::info!(id = %id, "Fetching application server");
                not_found_as_none(api.get_server(id).await)
            }
            None => {
                tracing::info!(name = %identifier.name, "Fetching application server");
                api.get_server_by_name(&identifier.name).await
            }
        };

        lookup_response(result, "application server", &identifier, |server| {
            flatten(server, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for ApplicationServerDataSource {
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
