//! Service edge (private broker) data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, SchemaBuilder};
use tfplug::types::Dynamic;

use super::data_source_app_connector_controller::{
    flatten_sub_module_upgrades, sub_module_upgrade_block,
};
use super::helpers::{
    computed_bool, computed_string, configure_provider_data, id_attribute, lookup_response,
    map_interface_to_string_map, micro_tenant, microtenant_id_attribute, microtenant_state,
    name_attribute, not_found_as_none, read_identifier, string_or_null, string_set_or_null,
    unconfigured_provider,
};
use crate::api::service_edge::{PrivateBrokerVersion, ServiceEdge};
use crate::ZpaProviderData;

const EDGE_STRINGS: &[&str] = &[
    "application_start_time",
    "service_edge_group_id",
    "service_edge_group_name",
    "control_channel_status",
    "creation_time",
    "ctrl_broker_name",
    "current_version",
    "description",
    "expected_upgrade_time",
    "expected_version",
    "fingerprint",
    "ip_acl",
    "issued_cert_id",
    "last_broker_connect_time",
    "last_broker_connect_time_duration",
    "last_broker_disconnect_time",
    "last_broker_disconnect_time_duration",
    "last_upgrade_time",
    "latitude",
    "location",
    "longitude",
    "modified_by",
    "modified_time",
    "provisioning_key_id",
    "provisioning_key_name",
    "platform",
    "previous_version",
    "private_ip",
    "public_ip",
    "runtime_os",
    "sarge_version",
    "upgrade_attempt",
    "upgrade_status",
    "microtenant_name",
];

const BROKER_STRINGS: &[&str] = &[
    "id",
    "application_start_time",
    "broker_id",
    "creation_time",
    "current_version",
    "last_connect_time",
    "last_disconnect_time",
    "last_upgraded_time",
    "modified_by",
    "modified_time",
    "platform",
    "platform_detail",
    "previous_version",
    "service_edge_group_id",
    "private_ip",
    "public_ip",
    "restart_instructions",
    "restart_time_in_sec",
    "runtime_os",
    "sarge_version",
    "system_start_time",
    "tunnel_id",
    "upgrade_attempt",
    "upgrade_status",
];

#[derive(Default)]
pub struct ServiceEdgeControllerDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl ServiceEdgeControllerDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn private_broker_block() -> NestedBlock {
    BROKER_STRINGS
        .iter()
        .fold(NestedBlockBuilder::list("private_broker_version"), |block, name| {
            block.attribute(computed_string(name))
        })
        .attribute(computed_bool("disable_auto_update"))
        .attribute(computed_bool("lone_warrior"))
        .attribute(computed_bool("upgrade_now_once"))
        .block(sub_module_upgrade_block("zpn_sub_module_upgrade"))
        .build()
}

fn flatten_private_broker_version(version: Option<&PrivateBrokerVersion>) -> Dynamic {
    let Some(version) = version else {
        return Dynamic::List(vec![]);
    };
    Dynamic::List(vec![Dynamic::object([
        ("id", string_or_null(&version.id)),
        ("application_start_time", string_or_null(&version.application_start_time)),
        ("broker_id", string_or_null(&version.broker_id)),
        ("creation_time", string_or_null(&version.creation_time)),
        ("current_version", string_or_null(&version.current_version)),
        ("disable_auto_update", Dynamic::Bool(version.disable_auto_update)),
        ("last_connect_time", string_or_null(&version.last_connect_time)),
        ("last_disconnect_time", string_or_null(&version.last_disconnect_time)),
        ("last_upgraded_time", string_or_null(&version.last_upgraded_time)),
        ("lone_warrior", Dynamic::Bool(version.lone_warrior)),
        ("modified_by", string_or_null(&version.modified_by)),
        ("modified_time", string_or_null(&version.modified_time)),
        ("platform", string_or_null(&version.platform)),
        ("platform_detail", string_or_null(&version.platform_detail)),
        ("previous_version", string_or_null(&version.previous_version)),
        ("service_edge_group_id", string_or_null(&version.service_edge_group_id)),
        ("private_ip", string_or_null(&version.private_ip)),
        ("public_ip", string_or_null(&version.public_ip)),
        ("restart_instructions", string_or_null(&version.restart_instructions)),
        ("restart_time_in_sec", string_or_null(&version.restart_time_in_sec)),
        ("runtime_os", string_or_null(&version.runtime_os)),
        ("sarge_version", string_or_null(&version.sarge_version)),
        ("system_start_time", string_or_null(&version.system_start_time)),
        ("tunnel_id", string_or_null(&version.tunnel_id)),
        ("upgrade_attempt", string_or_null(&version.upgrade_attempt)),
        ("upgrade_status", string_or_null(&version.upgrade_status)),
        ("upgrade_now_once", Dynamic::Bool(version.upgrade_now_once)),
        (
            "zpn_sub_module_upgrade",
            flatten_sub_module_upgrades(&version.zpn_sub_module_upgrade_list),
        ),
    ])])
}

fn flatten(edge: &ServiceEdge, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(edge.id.clone())),
        ("name", string_or_null(&edge.name)),
        ("microtenant_id", microtenant_state(microtenant_id, &edge.microtenant_id)),
        ("microtenant_name", string_or_null(&edge.microtenant_name)),
        ("application_start_time", string_or_null(&edge.application_start_time)),
        ("service_edge_group_id", string_or_null(&edge.service_edge_group_id)),
        ("service_edge_group_name", string_or_null(&edge.service_edge_group_name)),
        ("control_channel_status", string_or_null(&edge.control_channel_status)),
        ("creation_time", string_or_null(&edge.creation_time)),
        ("ctrl_broker_name", string_or_null(&edge.ctrl_broker_name)),
        ("current_version", string_or_null(&edge.current_version)),
        ("description", string_or_null(&edge.description)),
        ("enabled", Dynamic::Bool(edge.enabled)),
        ("expected_upgrade_time", string_or_null(&edge.expected_upgrade_time)),
        ("expected_version", string_or_null(&edge.expected_version)),
        ("fingerprint", string_or_null(&edge.fingerprint)),
        ("ip_acl", string_or_null(&edge.ip_acl)),
        ("issued_cert_id", string_or_null(&edge.issued_cert_id)),
        ("last_broker_connect_time", string_or_null(&edge.last_broker_connect_time)),
        (
            "last_broker_connect_time_duration",
            string_or_null(&edge.last_broker_connect_time_duration),
        ),
        ("last_broker_disconnect_time", string_or_null(&edge.last_broker_disconnect_time)),
        (
            "last_broker_disconnect_time_duration",
            string_or_null(&edge.last_broker_disconnect_time_duration),
        ),
        ("last_upgrade_time", string_or_null(&edge.last_upgrade_time)),
        ("latitude", string_or_null(&edge.latitude)),
        ("location", string_or_null(&edge.location)),
        ("longitude", string_or_null(&edge.longitude)),
        ("modified_by", string_or_null(&edge.modified_by)),
        ("modified_time", string_or_null(&edge.modified_time)),
        ("listen_ips", string_set_or_null(&edge.listen_ips)),
        ("publish_ips", string_set_or_null(&edge.publish_ips)),
        ("publish_ipv6", Dynamic::Bool(edge.publish_ipv6)),
        ("provisioning_key_id", string_or_null(&edge.provisioning_key_id)),
        ("provisioning_key_name", string_or_null(&edge.provisioning_key_name)),
        ("platform", string_or_null(&edge.platform)),
        ("previous_version", string_or_null(&edge.previous_version)),
        ("private_ip", string_or_null(&edge.private_ip)),
        ("public_ip", string_or_null(&edge.public_ip)),
        ("runtime_os", string_or_null(&edge.runtime_os)),
        ("sarge_version", string_or_null(&edge.sarge_version)),
        ("enrollment_cert", map_interface_to_string_map(&edge.enrollment_cert)),
        ("upgrade_attempt", string_or_null(&edge.upgrade_attempt)),
        ("upgrade_status", string_or_null(&edge.upgrade_status)),
        (
            "private_broker_version",
            flatten_private_broker_version(edge.private_broker_version.as_ref()),
        ),
    ])
}

#[async_trait]
impl DataSource for ServiceEdgeControllerDataSource {
    fn type_name(&self) -> &str {
        "zpa_service_edge_controller"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a service edge controller by ID or name.")
            .attribute(id_attribute("service edge controller"))
            .attribute(name_attribute("service edge controller"))
            .attribute(microtenant_id_attribute())
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
                AttributeBuilder::new(
                    "enrollment_cert",
                    AttributeType::map_of(AttributeType::String),
                )
                .computed()
                .build(),
            );
        let schema = EDGE_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)))
            .block(private_broker_block())
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

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading service edge controller");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_service_edge(id).await),
            None => api.get_service_edge_by_name(&identifier.name).await,
        };

        lookup_response(result, "service edge controller", &identifier, |edge| {
            flatten(edge, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for ServiceEdgeControllerDataSource {
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
    fn broker_version_and_ip_acl() {
        let edge: ServiceEdge = serde_json::from_str(
            r#"{
                "id": "7",
                "name": "pse-1",
                "ipAcl": ["10.0.0.0/8", "192.168.0.0/16"],
                "listenIps": ["10.0.0.1", "10.0.0.1"],
                "privateBrokerVersion": {
                    "id": "8",
                    "loneWarrior": true,
                    "zpnSubModuleUpgradeList": [{"id": "9", "role": "zpn_brokerd"}]
                }
            }"#,
        )
        .unwrap();
        let Dynamic::Map(state) = flatten(&edge, Some("mt-1")) else {
            panic!("expected an object");
        };
        assert_eq!(state["ip_acl"], Dynamic::from("10.0.0.0/8, 192.168.0.0/16"));
        assert_eq!(state["microtenant_id"], Dynamic::from("mt-1"));
        assert_eq!(
            state["listen_ips"],
            Dynamic::List(vec![Dynamic::from("10.0.0.1")])
        );
        assert_eq!(state["publish_ips"], Dynamic::Null);

        let Dynamic::List(versions) = &state["private_broker_version"] else {
            panic!("expected a list");
        };
        let Dynamic::Map(version) = &versions[0] else {
            panic!("expected an object");
        };
        assert_eq!(version["lone_warrior"], Dynamic::Bool(true));
        let Dynamic::List(upgrades) = &version["zpn_sub_module_upgrade"] else {
            panic!("expected a list");
        };
        assert_eq!(upgrades.len(), 1);
    }

    #[test]
    fn missing_broker_version_is_empty_block() {
        let edge = ServiceEdge::default();
        let Dynamic::Map(state) = flatten(&edge, None) else {
            panic!("expected an object");
        };
        assert_eq!(state["private_broker_version"], Dynamic::List(vec![]));
    }
}
