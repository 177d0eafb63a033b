//! App connector group data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{NestedBlockBuilder, SchemaBuilder};
use tfplug::types::Dynamic;

use super::helpers::{
    computed_bool, computed_string, configure_provider_data, id_attribute, lookup_response,
    micro_tenant, microtenant_id_attribute, microtenant_state, name_attribute, not_found_as_none,
    read_identifier, string_or_null, unconfigured_provider,
};
use crate::api::app_connector::{AppConnectorGroup, AppServerGroupSummary};
use crate::ZpaProviderData;

const GROUP_STRINGS: &[&str] = &[
    "city_country",
    "country_code",
    "creation_time",
    "description",
    "dns_query_type",
    "geo_location_id",
    "latitude",
    "location",
    "longitude",
    "modifiedby",
    "modified_time",
    "upgrade_day",
    "upgrade_time_in_secs",
    "version_profile_id",
    "version_profile_name",
    "version_profile_visibility_scope",
    "microtenant_name",
];

const GROUP_BOOLS: &[&str] = &[
    "enabled",
    "override_version_profile",
    "pra_enabled",
    "waf_disabled",
    "lss_app_connector_group",
    "tcp_quick_ack_app",
    "tcp_quick_ack_assistant",
    "tcp_quick_ack_read_assistant",
    "use_in_dr_mode",
];

#[derive(Default)]
pub struct AppConnectorGroupDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl AppConnectorGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten_server_group_summaries(groups: &[AppServerGroupSummary]) -> Dynamic {
    Dynamic::List(
        groups
            .iter()
            .map(|group| {
                Dynamic::object([
                    ("config_space", string_or_null(&group.config_space)),
                    ("creation_time", string_or_null(&group.creation_time)),
                    ("description", string_or_null(&group.description)),
                    ("enabled", Dynamic::Bool(group.enabled)),
                    ("id", string_or_null(&group.id)),
                    ("dynamic_discovery", Dynamic::Bool(group.dynamic_discovery)),
                    ("modifiedby", string_or_null(&group.modified_by)),
                    ("modified_time", string_or_null(&group.modified_time)),
                    ("name", string_or_null(&group.name)),
                ])
            })
            .collect(),
    )
}

fn flatten(group: &AppConnectorGroup, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(group.id.clone())),
        ("name", string_or_null(&group.name)),
        ("city_country", string_or_null(&group.city_country)),
        ("country_code", string_or_null(&group.country_code)),
        ("creation_time", string_or_null(&group.creation_time)),
        ("description", string_or_null(&group.description)),
        ("dns_query_type", string_or_null(&group.dns_query_type)),
        ("enabled", Dynamic::Bool(group.enabled)),
        ("geo_location_id", string_or_null(&group.geo_location_id)),
        ("latitude", string_or_null(&group.latitude)),
        ("location", string_or_null(&group.location)),
        ("longitude", string_or_null(&group.longitude)),
        ("modifiedby", string_or_null(&group.modified_by)),
        ("modified_time", string_or_null(&group.modified_time)),
        ("override_version_profile", Dynamic::Bool(group.override_version_profile)),
        ("pra_enabled", Dynamic::Bool(group.pra_enabled)),
        ("waf_disabled", Dynamic::Bool(group.waf_disabled)),
        ("upgrade_day", string_or_null(&group.upgrade_day)),
        ("upgrade_time_in_secs", string_or_null(&group.upgrade_time_in_secs)),
        ("version_profile_id", string_or_null(&group.version_profile_id)),
        ("version_profile_name", string_or_null(&group.version_profile_name)),
        (
            "version_profile_visibility_scope",
            string_or_null(&group.version_profile_visibility_scope),
        ),
        ("lss_app_connector_group", Dynamic::Bool(group.lss_app_connector_group)),
        ("tcp_quick_ack_app", Dynamic::Bool(group.tcp_quick_ack_app)),
        ("tcp_quick_ack_assistant", Dynamic::Bool(group.tcp_quick_ack_assistant)),
        (
            "tcp_quick_ack_read_assistant",
            Dynamic::Bool(group.tcp_quick_ack_read_assistant),
        ),
        ("use_in_dr_mode", Dynamic::Bool(group.use_in_dr_mode)),
        ("microtenant_id", microtenant_state(microtenant_id, &group.microtenant_id)),
        ("microtenant_name", string_or_null(&group.microtenant_name)),
        ("server_groups", flatten_server_group_summaries(&group.server_groups)),
    ])
}

#[async_trait]
impl DataSource for AppConnectorGroupDataSource {
    fn type_name(&self) -> &str {
        "zpa_app_connector_group"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let server_groups = NestedBlockBuilder::list("server_groups")
            .attribute(computed_string("config_space"))
            .attribute(computed_string("creation_time"))
            .attribute(computed_string("description"))
            .attribute(computed_bool("enabled"))
            .attribute(computed_string("id"))
            .attribute(computed_bool("dynamic_discovery"))
            .attribute(computed_string("modifiedby"))
            .attribute(computed_string("modified_time"))
            .attribute(computed_string("name"))
            .build();

        let builder = SchemaBuilder::new()
            .version(0)
            .description("Data source for retrieving a ZPA App Connector Group")
            .attribute(id_attribute("app connector group"))
            .attribute(name_attribute("app connector group"))
            .attribute(microtenant_id_attribute());
        let builder = GROUP_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)));
        let schema = GROUP_BOOLS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_bool(name)))
            .block(server_groups)
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
        let api = client.app_connectors();

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading app connector group");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_group(id).await),
            None => api.get_group_by_name(&identifier.name).await,
        };

        lookup_response(result, "app connector group", &identifier, |group| {
            flatten(group, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for AppConnectorGroupDataSource {
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
    fn server_groups_use_modifiedby_key() {
        let group = AppConnectorGroup {
            id: "72058304855015574".to_string(),
            name: "Canada Connector Group".to_string(),
            server_groups: vec![AppServerGroupSummary {
                id: "1".to_string(),
                name: "sg".to_string(),
                modified_by: "admin".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let Dynamic::Map(state) = flatten(&group, None) else {
            panic!("expected an object");
        };
        let Dynamic::List(server_groups) = &state["server_groups"] else {
            panic!("expected a list");
        };
        let Dynamic::Map(server_group) = &server_groups[0] else {
            panic!("expected an object");
        };
        assert_eq!(server_group["modifiedby"], Dynamic::from("admin"));
        assert_eq!(state["name"], Dynamic::from("Canada Connector Group"));
    }
}
