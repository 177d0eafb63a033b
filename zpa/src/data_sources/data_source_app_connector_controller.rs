//! App connector controller data source implementation

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
    computed_bool, computed_string, configure_provider_data, id_attribute, lookup_response,
    map_interface_to_string_map, micro_tenant, microtenant_id_attribute, microtenant_state,
    name_attribute, not_found_as_none, read_identifier, string_or_null, unconfigured_provider,
};
use crate::api::app_connector::{AppConnector, AssistantVersion, SubModuleUpgrade};
use crate::ZpaProviderData;

const CONNECTOR_STRINGS: &[&str] = &[
    "application_start_time",
    "app_connector_group_id",
    "app_connector_group_name",
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
    "platform_detail",
    "previous_version",
    "private_ip",
    "public_ip",
    "runtime_os",
    "sarge_version",
    "upgrade_attempt",
    "upgrade_status",
    "microtenant_name",
];

const ASSISTANT_VERSION_STRINGS: &[&str] = &[
    "id",
    "application_start_time",
    "app_connector_group_id",
    "broker_id",
    "creation_time",
    "ctrl_channel_status",
    "current_version",
    "expected_version",
    "last_broker_connect_time",
    "last_broker_disconnect_time",
    "last_upgraded_time",
    "latitude",
    "longitude",
    "modified_by",
    "modified_time",
    "platform",
    "platform_detail",
    "previous_version",
    "private_ip",
    "public_ip",
    "restart_time_in_sec",
    "runtime_os",
    "sarge_version",
    "system_start_time",
    "mtunnel_id",
    "upgrade_attempt",
    "upgrade_status",
];

const SUB_MODULE_UPGRADE_STRINGS: &[&str] = &[
    "id",
    "creation_time",
    "current_version",
    "entity_gid",
    "entity_type",
    "expected_version",
    "modified_by",
    "modified_time",
    "previous_version",
    "role",
    "upgrade_status",
    "upgrade_time",
];

#[derive(Default)]
pub struct AppConnectorControllerDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl AppConnectorControllerDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sub-module upgrade block shared with the service edge data sources
pub fn sub_module_upgrade_block(type_name: &str) -> NestedBlock {
    SUB_MODULE_UPGRADE_STRINGS
        .iter()
        .fold(NestedBlockBuilder::list(type_name), |block, name| {
            block.attribute(computed_string(name))
        })
        .build()
}

pub fn flatten_sub_module_upgrades(upgrades: &[SubModuleUpgrade]) -> Dynamic {
    Dynamic::List(
        upgrades
            .iter()
            .map(|upgrade| {
                Dynamic::object([
                    ("id", string_or_null(&upgrade.id)),
                    ("creation_time", string_or_null(&upgrade.creation_time)),
                    ("current_version", string_or_null(&upgrade.current_version)),
                    ("entity_gid", string_or_null(&upgrade.entity_gid)),
                    ("entity_type", string_or_null(&upgrade.entity_type)),
                    ("expected_version", string_or_null(&upgrade.expected_version)),
                    ("modified_by", string_or_null(&upgrade.modified_by)),
                    ("modified_time", string_or_null(&upgrade.modified_time)),
                    ("previous_version", string_or_null(&upgrade.previous_version)),
                    ("role", string_or_null(&upgrade.role)),
                    ("upgrade_status", string_or_null(&upgrade.upgrade_status)),
                    ("upgrade_time", string_or_null(&upgrade.upgrade_time)),
                ])
            })
            .collect(),
    )
}

/// A missing assistant version (no ID) is an empty block
fn flatten_assistant_version(version: &AssistantVersion) -> Dynamic {
    if version.is_empty() {
        return Dynamic::List(vec![]);
    }
    Dynamic::List(vec![Dynamic::object([
        ("id", string_or_null(&version.id)),
        ("application_start_time", string_or_null(&version.application_start_time)),
        ("app_connector_group_id", string_or_null(&version.app_connector_group_id)),
        ("broker_id", string_or_null(&version.broker_id)),
        ("creation_time", string_or_null(&version.creation_time)),
        ("ctrl_channel_status", string_or_null(&version.ctrl_channel_status)),
        ("current_version", string_or_null(&version.current_version)),
        ("disable_auto_update", Dynamic::Bool(version.disable_auto_update)),
        ("expected_version", string_or_null(&version.expected_version)),
        ("last_broker_connect_time", string_or_null(&version.last_broker_connect_time)),
        ("last_broker_disconnect_time", string_or_null(&version.last_broker_disconnect_time)),
        ("last_upgraded_time", string_or_null(&version.last_upgraded_time)),
        ("lone_warrior", Dynamic::Bool(version.lone_warrior)),
        ("latitude", string_or_null(&version.latitude)),
        ("longitude", string_or_null(&version.longitude)),
        ("modified_by", string_or_null(&version.modified_by)),
        ("modified_time", string_or_null(&version.modified_time)),
        ("platform", string_or_null(&version.platform)),
        ("platform_detail", string_or_null(&version.platform_detail)),
        ("previous_version", string_or_null(&version.previous_version)),
        ("private_ip", string_or_null(&version.private_ip)),
        ("public_ip", string_or_null(&version.public_ip)),
        ("restart_time_in_sec", string_or_null(&version.restart_time_in_sec)),
        ("runtime_os", string_or_null(&version.runtime_os)),
        ("sarge_version", string_or_null(&version.sarge_version)),
        ("system_start_time", string_or_null(&version.system_start_time)),
        ("mtunnel_id", string_or_null(&version.mtunnel_id)),
        ("upgrade_attempt", string_or_null(&version.upgrade_attempt)),
        ("upgrade_status", string_or_null(&version.upgrade_status)),
        ("upgrade_now_once", Dynamic::Bool(version.upgrade_now_once)),
    ])])
}

fn flatten(connector: &AppConnector, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(connector.id.clone())),
        ("name", string_or_null(&connector.name)),
        ("application_start_time", string_or_null(&connector.application_start_time)),
        ("app_connector_group_id", string_or_null(&connector.app_connector_group_id)),
        ("app_connector_group_name", string_or_null(&connector.app_connector_group_name)),
        ("control_channel_status", string_or_null(&connector.control_channel_status)),
        ("creation_time", string_or_null(&connector.creation_time)),
        ("ctrl_broker_name", string_or_null(&connector.ctrl_broker_name)),
        ("current_version", string_or_null(&connector.current_version)),
        ("description", string_or_null(&connector.description)),
        ("enabled", Dynamic::Bool(connector.enabled)),
        ("expected_upgrade_time", string_or_null(&connector.expected_upgrade_time)),
        ("expected_version", string_or_null(&connector.expected_version)),
        ("fingerprint", string_or_null(&connector.fingerprint)),
        ("ip_acl", string_or_null(&connector.ip_acl)),
        ("issued_cert_id", string_or_null(&connector.issued_cert_id)),
        ("last_broker_connect_time", string_or_null(&connector.last_broker_connect_time)),
        (
            "last_broker_connect_time_duration",
            string_or_null(&connector.last_broker_connect_time_duration),
        ),
        ("last_broker_disconnect_time", string_or_null(&connector.last_broker_disconnect_time)),
        (
            "last_broker_disconnect_time_duration",
            string_or_null(&connector.last_broker_disconnect_time_duration),
        ),
        ("last_upgrade_time", string_or_null(&connector.last_upgrade_time)),
        ("latitude", string_or_null(&connector.latitude)),
        ("location", string_or_null(&connector.location)),
        ("longitude", string_or_null(&connector.longitude)),
        ("modified_by", string_or_null(&connector.modified_by)),
        ("modified_time", string_or_null(&connector.modified_time)),
        ("provisioning_key_id", string_or_null(&connector.provisioning_key_id)),
        ("provisioning_key_name", string_or_null(&connector.provisioning_key_name)),
        ("platform", string_or_null(&connector.platform)),
        ("platform_detail", string_or_null(&connector.platform_detail)),
        ("previous_version", string_or_null(&connector.previous_version)),
        ("private_ip", string_or_null(&connector.private_ip)),
        ("public_ip", string_or_null(&connector.public_ip)),
        ("runtime_os", string_or_null(&connector.runtime_os)),
        ("sarge_version", string_or_null(&connector.sarge_version)),
        ("enrollment_cert", map_interface_to_string_map(&connector.enrollment_cert)),
        ("upgrade_attempt", string_or_null(&connector.upgrade_attempt)),
        ("upgrade_status", string_or_null(&connector.upgrade_status)),
        (
            "microtenant_id",
            microtenant_state(microtenant_id, &connector.microtenant_id),
        ),
        ("microtenant_name", string_or_null(&connector.microtenant_name)),
        ("assistant_version", flatten_assistant_version(&connector.assistant_version)),
        (
            "zpn_sub_module_upgrade_list",
            flatten_sub_module_upgrades(&connector.zpn_sub_module_upgrade_list),
        ),
    ])
}

#[async_trait]
impl DataSource for AppConnectorControllerDataSource {
    fn type_name(&self) -> &str {
        "zpa_app_connector_controller"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let assistant_version = ASSISTANT_VERSION_STRINGS
            .iter()
            .fold(NestedBlockBuilder::list("assistant_version"), |block, name| {
                block.attribute(computed_string(name))
            })
            .attribute(computed_bool("disable_auto_update"))
            .attribute(computed_bool("lone_warrior"))
            .attribute(computed_bool("upgrade_now_once"))
            .build();

        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves an app connector controller by ID or name.")
            .attribute(id_attribute("app connector controller"))
            .attribute(name_attribute("app connector controller"))
            .attribute(microtenant_id_attribute())
            .attribute(computed_bool("enabled"))
            .attribute(
                AttributeBuilder::new("enrollment_cert", AttributeType::map_of(AttributeType::String))
                    .description("Enrollment certificate details, each value rendered as JSON.")
                    .computed()
                    .build(),
            );

        let schema = CONNECTOR_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)))
            .block(assistant_version)
            .block(sub_module_upgrade_block("zpn_sub_module_upgrade_list"))
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

        let result = match identifier.id() {
            Some(id) => {
                tracing::debug!(id = %id, "Retrieving app connector controller by ID");
                not_found_as_none(api.get_connector(id).await)
            }
            None => {
                tracing::debug!(name = %identifier.name, "Retrieving app connector controller by name");
                api.get_connector_by_name(&identifier.name).await
            }
        };

        lookup_response(result, "app connector controller", &identifier, |connector| {
            flatten(connector, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for AppConnectorControllerDataSource {
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
    use tfplug::data_source::DataSourceSchemaRequest;

    #[test]
    fn empty_assistant_version_is_an_empty_block() {
        let connector = AppConnector {
            id: "1".to_string(),
            ..Default::default()
        };
        let Dynamic::Map(state) = flatten(&connector, None) else {
            panic!("expected an object");
        };
        assert_eq!(state["assistant_version"], Dynamic::List(vec![]));
        assert_eq!(state["zpn_sub_module_upgrade_list"], Dynamic::List(vec![]));
        assert_eq!(state["enrollment_cert"], Dynamic::Null);
        assert_eq!(state["microtenant_id"], Dynamic::Null);
    }

    #[tokio::test]
    async fn schema_covers_flattened_attributes() {
        let data_source = AppConnectorControllerDataSource::new();
        let response = data_source
            .schema(Context::new(), DataSourceSchemaRequest)
            .await;
        let block = &response.schema.block;

        let connector = AppConnector {
            id: "1".to_string(),
            ..Default::default()
        };
        let Dynamic::Map(state) = flatten(&connector, None) else {
            panic!("expected an object");
        };
        for key in state.keys() {
            assert!(
                block.attribute(key).is_some() || block.nested_block(key).is_some(),
                "{} missing from schema",
                key
            );
        }
        assert_eq!(
            block.attributes.len() + block.block_types.len(),
            state.len()
        );
    }
}
