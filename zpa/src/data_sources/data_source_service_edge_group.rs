//! Service edge group data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, SchemaBuilder};
use tfplug::types::Dynamic;

use super::helpers::{
    computed_bool, computed_string, configure_provider_data,
    flatten_associated_profile_names_as_list, id_attribute, lookup_response,
    map_interface_to_string_map, micro_tenant, microtenant_id_attribute, microtenant_state,
    name_attribute, not_found_as_none, read_identifier, string_or_null, string_set_or_null,
    unconfigured_provider,
};
use crate::api::app_connector::SubModuleUpgrade;
use crate::api::service_edge::{PrivateBrokerVersion, ServiceEdge, ServiceEdgeGroup};
use crate::ZpaProviderData;

const GROUP_STRINGS: &[&str] = &[
    "alt_cloud",
    "city_country",
    "country_code",
    "creation_time",
    "description",
    "geo_location_id",
    "is_public",
    "latitude",
    "location",
    "longitude",
    "modified_by",
    "modified_time",
    "site_id",
    "site_name",
    "upgrade_day",
    "upgrade_time_in_secs",
    "version_profile_id",
    "version_profile_name",
    "version_profile_visibility_scope",
    "grace_distance_value",
    "grace_distance_value_unit",
    "microtenant_name",
];

const GROUP_BOOLS: &[&str] = &[
    "enabled",
    "override_version_profile",
    "use_in_dr_mode",
    "grace_distance_enabled",
];

const MEMBER_STRINGS: &[&str] = &[
    "id",
    "name",
    "description",
    "current_version",
    "previous_version",
    "platform",
    "private_ip",
    "public_ip",
    "provisioning_key_id",
    "provisioning_key_name",
    "control_channel_status",
    "last_broker_connect_time",
    "last_broker_disconnect_time",
];

const BROKER_STRINGS: &[&str] = &[
    "id",
    "current_version",
    "upgrade_status",
    "upgrade_attempt",
    "last_connect_time",
    "last_disconnect_time",
];

const SUB_MODULE_STRINGS: &[&str] = &[
    "id",
    "current_version",
    "expected_version",
    "role",
    "upgrade_status",
];

#[derive(Default)]
pub struct ServiceEdgeGroupDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl ServiceEdgeGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn strings_block(builder: NestedBlockBuilder, names: &[&str]) -> NestedBlockBuilder {
    names
        .iter()
        .fold(builder, |builder, name| builder.attribute(computed_string(name)))
}

fn service_edges_block() -> NestedBlock {
    let sub_modules = strings_block(NestedBlockBuilder::list("sub_module_upgrades"), SUB_MODULE_STRINGS)
        .build();
    let broker = strings_block(NestedBlockBuilder::single("private_broker_version"), BROKER_STRINGS)
        .block(sub_modules)
        .build();
    strings_block(NestedBlockBuilder::set("service_edges"), MEMBER_STRINGS)
        .attribute(computed_bool("enabled"))
        .attribute(computed_bool("publish_ipv6"))
        .attribute(
            AttributeBuilder::new("listen_ips", AttributeType::set_of(AttributeType::String))
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("publish_ips", AttributeType::set_of(AttributeType::String))
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("enrollment_cert", AttributeType::map_of(AttributeType::String))
                .computed()
                .build(),
        )
        .block(broker)
        .build()
}

fn trusted_networks_block() -> NestedBlock {
    strings_block(NestedBlockBuilder::set("trusted_networks"), &["id", "name"]).build()
}

fn flatten_sub_modules(upgrades: &[SubModuleUpgrade]) -> Dynamic {
    Dynamic::List(
        upgrades
            .iter()
            .map(|upgrade| {
                Dynamic::object([
                    ("id", string_or_null(&upgrade.id)),
                    ("current_version", string_or_null(&upgrade.current_version)),
                    ("expected_version", string_or_null(&upgrade.expected_version)),
                    ("role", string_or_null(&upgrade.role)),
                    ("upgrade_status", string_or_null(&upgrade.upgrade_status)),
                ])
            })
            .collect(),
    )
}

/// Single nested block: an object, or null when the API sent none
fn flatten_broker(version: Option<&PrivateBrokerVersion>) -> Dynamic {
    match version {
        None => Dynamic::Null,
        Some(version) => Dynamic::object([
            ("id", string_or_null(&version.id)),
            ("current_version", string_or_null(&version.current_version)),
            ("upgrade_status", string_or_null(&version.upgrade_status)),
            ("upgrade_attempt", string_or_null(&version.upgrade_attempt)),
            ("last_connect_time", string_or_null(&version.last_connect_time)),
            ("last_disconnect_time", string_or_null(&version.last_disconnect_time)),
            (
                "sub_module_upgrades",
                flatten_sub_modules(&version.zpn_sub_module_upgrade_list),
            ),
        ]),
    }
}

fn flatten_member(edge: &ServiceEdge) -> Dynamic {
    Dynamic::object([
        ("id", string_or_null(&edge.id)),
        ("name", string_or_null(&edge.name)),
        ("description", string_or_null(&edge.description)),
        ("enabled", Dynamic::Bool(edge.enabled)),
        ("current_version", string_or_null(&edge.current_version)),
        ("previous_version", string_or_null(&edge.previous_version)),
        ("platform", string_or_null(&edge.platform)),
        ("private_ip", string_or_null(&edge.private_ip)),
        ("public_ip", string_or_null(&edge.public_ip)),
        ("provisioning_key_id", string_or_null(&edge.provisioning_key_id)),
        ("provisioning_key_name", string_or_null(&edge.provisioning_key_name)),
        ("control_channel_status", string_or_null(&edge.control_channel_status)),
        ("last_broker_connect_time", string_or_null(&edge.last_broker_connect_time)),
        ("last_broker_disconnect_time", string_or_null(&edge.last_broker_disconnect_time)),
        ("listen_ips", string_set_or_null(&edge.listen_ips)),
        ("publish_ips", string_set_or_null(&edge.publish_ips)),
        ("publish_ipv6", Dynamic::Bool(edge.publish_ipv6)),
        ("enrollment_cert", map_interface_to_string_map(&edge.enrollment_cert)),
        (
            "private_broker_version",
            flatten_broker(edge.private_broker_version.as_ref()),
        ),
    ])
}

fn flatten(group: &ServiceEdgeGroup, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(group.id.clone())),
        ("name", string_or_null(&group.name)),
        ("alt_cloud", string_or_null(&group.alt_cloud)),
        ("city_country", string_or_null(&group.city_country)),
        ("country_code", string_or_null(&group.country_code)),
        ("creation_time", string_or_null(&group.creation_time)),
        ("description", string_or_null(&group.description)),
        ("enabled", Dynamic::Bool(group.enabled)),
        ("geo_location_id", string_or_null(&group.geo_location_id)),
        ("is_public", string_or_null(&group.is_public)),
        ("latitude", string_or_null(&group.latitude)),
        ("location", string_or_null(&group.location)),
        ("longitude", string_or_null(&group.longitude)),
        ("override_version_profile", Dynamic::Bool(group.override_version_profile)),
        ("modified_by", string_or_null(&group.modified_by)),
        ("modified_time", string_or_null(&group.modified_time)),
        ("use_in_dr_mode", Dynamic::Bool(group.use_in_dr_mode)),
        ("site_id", string_or_null(&group.site_id)),
        ("site_name", string_or_null(&group.site_name)),
        ("upgrade_day", string_or_null(&group.upgrade_day)),
        ("upgrade_time_in_secs", string_or_null(&group.upgrade_time_in_secs)),
        ("version_profile_id", string_or_null(&group.version_profile_id)),
        ("version_profile_name", string_or_null(&group.version_profile_name)),
        (
            "version_profile_visibility_scope",
            string_or_null(&group.version_profile_visibility_scope),
        ),
        ("grace_distance_enabled", Dynamic::Bool(group.grace_distance_enabled)),
        ("grace_distance_value", string_or_null(&group.grace_distance_value)),
        ("grace_distance_value_unit", string_or_null(&group.grace_distance_value_unit)),
        ("microtenant_id", microtenant_state(microtenant_id, &group.microtenant_id)),
        ("microtenant_name", string_or_null(&group.microtenant_name)),
        (
            "service_edges",
            Dynamic::List(group.service_edges.iter().map(flatten_member).collect()),
        ),
        (
            "trusted_networks",
            flatten_associated_profile_names_as_list(&group.trusted_networks),
        ),
    ])
}

#[async_trait]
impl DataSource for ServiceEdgeGroupDataSource {
    fn type_name(&self) -> &str {
        "zpa_service_edge_group"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA Service Edge Group by ID or name.")
            .attribute(id_attribute("service edge group"))
            .attribute(name_attribute("service edge group"))
            .attribute(microtenant_id_attribute());
        let builder = GROUP_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)));
        let schema = GROUP_BOOLS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_bool(name)))
            .block(service_edges_block())
            .block(trusted_networks_block())
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
        let api = client.service_edges();

        let result = match identifier.id() {
            Some(id) => {
                tracing::info!(id = %id, "Fetching service edge group");
                not_found_as_none(api.get_group(id).await)
            }
            None => {
                tracing::info!(name = %identifier.name, "Fetching service edge group");
                api.get_group_by_name(&identifier.name).await
            }
        };

        lookup_response(result, "service edge group", &identifier, |group| {
            flatten(group, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for ServiceEdgeGroupDataSource {
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
    use tfplug::schema::NestingMode;

    #[test]
    fn members_carry_single_broker_block() {
        let group: ServiceEdgeGroup = serde_json::from_str(
            r#"{
                "id": "1",
                "name": "edges",
                "serviceEdges": [
                    {"id": "2", "name": "pse", "privateBrokerVersion": {
                        "id": "3",
                        "zpnSubModuleUpgradeList": [{"id": "4", "role": "zpn_brokerd"}]
                    }},
                    {"id": "5", "name": "pse-2"}
                ],
                "trustedNetworks": [{"id": "6", "name": "corp"}]
            }"#,
        )
        .unwrap();
        let Dynamic::Map(state) = flatten(&group, None) else {
            panic!("expected an object");
        };
        let Dynamic::List(edges) = &state["service_edges"] else {
            panic!("expected a list");
        };
        let Dynamic::Map(first) = &edges[0] else {
            panic!("expected an object");
        };
        let Dynamic::Map(broker) = &first["private_broker_version"] else {
            panic!("expected an object");
        };
        assert_eq!(
            broker["sub_module_upgrades"],
            flatten_sub_modules(&[SubModuleUpgrade {
                id: "4".to_string(),
                role: "zpn_brokerd".to_string(),
                ..Default::default()
            }])
        );
        let Dynamic::Map(second) = &edges[1] else {
            panic!("expected an object");
        };
        assert_eq!(second["private_broker_version"], Dynamic::Null);
        assert_eq!(
            state["trusted_networks"],
            Dynamic::List(vec![Dynamic::object([
                ("id", Dynamic::from("6")),
                ("name", Dynamic::from("corp"))
            ])])
        );
    }

    #[test]
    fn broker_block_is_single() {
        let block = service_edges_block();
        let broker = block
            .block
            .block_types
            .iter()
            .find(|b| b.type_name == "private_broker_version")
            .expect("broker block");
        assert_eq!(broker.nesting, NestingMode::Single);
    }
}
