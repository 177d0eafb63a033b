//! Server group data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{NestedBlock, NestedBlockBuilder, SchemaBuilder};
use tfplug::types::Dynamic;

use super::helpers::{
    computed_bool, computed_string, configure_provider_data,
    flatten_associated_profile_names_as_list, id_attribute, lookup_response, micro_tenant,
    microtenant_id_attribute, microtenant_state, name_attribute, not_found_as_none,
    read_identifier, string_or_null, unconfigured_provider,
};
use crate::api::application::ServerGroup;
use crate::ZpaProviderData;

#[derive(Default)]
pub struct ServerGroupDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl ServerGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn id_name_block(type_name: &str) -> NestedBlock {
    NestedBlockBuilder::set(type_name)
        .attribute(computed_string("id"))
        .attribute(computed_string("name"))
        .build()
}

fn flatten(group: &ServerGroup, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(group.id.clone())),
        ("name", string_or_null(&group.name)),
        ("description", string_or_null(&group.description)),
        ("enabled", Dynamic::Bool(group.enabled)),
        ("config_space", string_or_null(&group.config_space)),
        ("creation_time", string_or_null(&group.creation_time)),
        ("ip_anchored", Dynamic::Bool(group.ip_anchored)),
        ("dynamic_discovery", Dynamic::Bool(group.dynamic_discovery)),
        ("modifiedby", string_or_null(&group.modified_by)),
        ("modified_time", string_or_null(&group.modified_time)),
        ("microtenant_id", microtenant_state(microtenant_id, &group.microtenant_id)),
        ("microtenant_name", string_or_null(&group.microtenant_name)),
        (
            "applications",
            flatten_associated_profile_names_as_list(&group.applications),
        ),
        (
            "app_connector_groups",
            flatten_associated_profile_names_as_list(&group.app_connector_groups),
        ),
        ("servers", flatten_associated_profile_names_as_list(&group.servers)),
    ])
}

#[async_trait]
impl DataSource for ServerGroupDataSource {
    fn type_name(&self) -> &str {
        "zpa_server_group"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA Server Group by ID or name.")
            .attribute(id_attribute("server group"))
            .attribute(name_attribute("server group"))
            .attribute(computed_string("description"))
            .attribute(computed_bool("enabled"))
            .attribute(computed_string("config_space"))
            .attribute(computed_string("creation_time"))
            .attribute(computed_bool("ip_anchored"))
            .attribute(computed_bool("dynamic_discovery"))
            .attribute(computed_string("modifiedby"))
            .attribute(computed_string("modified_time"))
            .attribute(microtenant_id_attribute())
            .attribute(computed_string("microtenant_name"))
            .block(id_name_block("applications"))
            .block(id_name_block("app_connector_groups"))
            .block(id_name_block("servers"))
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
                tracing::info!(id = %id, "Fetching server group");
                not_found_as_none(api.get_server_group(id).await)
            }
            None => {
                tracing::info!(name = %identifier.name, "Fetching server group");
                api.get_server_group_by_name(&identifier.name).await
            }
        };

        lookup_response(result, "server group", &identifier, |group| {
            flatten(group, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for ServerGroupDataSource {
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
    fn associations_flatten_to_id_name_objects() {
        let group: ServerGroup = serde_json::from_str(
            r#"{
                "id": "5",
                "name": "sg",
                "applications": [{"id": "10", "name": "crm"}],
                "servers": null
            }"#,
        )
        .unwrap();
        let Dynamic::Map(state) = flatten(&group, None) else {
            panic!("expected an object");
        };
        assert_eq!(
            state["applications"],
            Dynamic::List(vec![Dynamic::object([
                ("id", Dynamic::from("10")),
                ("name", Dynamic::from("crm"))
            ])])
        );
        assert_eq!(state["servers"], Dynamic::List(vec![]));
        assert_eq!(state["app_connector_groups"], Dynamic::List(vec![]));
    }
}
