//! App connector and app connector group API

use serde::Deserialize;
use std::collections::HashMap;

use super::common::{bool_or_string, null_default, string_or_number, Named};
use super::{ApiError, Client};

/// GET /mgmtconfig/v1/admin/customers/{customerId}/connector/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConnector {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub application_start_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub app_connector_group_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub app_connector_group_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub control_channel_status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ctrl_broker_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub current_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub expected_upgrade_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub expected_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub fingerprint: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ip_acl: String,
    #[serde(deserialize_with = "string_or_number")]
    pub issued_cert_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_broker_connect_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_broker_connect_time_duration: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_broker_disconnect_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_broker_disconnect_time_duration: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_upgrade_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub location: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub provisioning_key_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub provisioning_key_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub platform: String,
    #[serde(deserialize_with = "string_or_number")]
    pub platform_detail: String,
    #[serde(deserialize_with = "string_or_number")]
    pub previous_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub private_ip: String,
    #[serde(deserialize_with = "string_or_number")]
    pub public_ip: String,
    #[serde(rename = "runtimeOS", deserialize_with = "string_or_number")]
    pub runtime_os: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sarge_version: String,
    #[serde(deserialize_with = "null_default")]
    pub enrollment_cert: HashMap<String, serde_json::Value>,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_attempt: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(deserialize_with = "null_default")]
    pub assistant_version: AssistantVersion,
    #[serde(deserialize_with = "null_default")]
    pub zpn_sub_module_upgrade_list: Vec<SubModuleUpgrade>,
}

impl Named for AppConnector {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantVersion {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub application_start_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub app_connector_group_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub broker_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ctrl_channel_status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub current_version: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub disable_auto_update: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub expected_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_broker_connect_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_broker_disconnect_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_upgraded_time: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub lone_warrior: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub platform: String,
    #[serde(deserialize_with = "string_or_number")]
    pub platform_detail: String,
    #[serde(deserialize_with = "string_or_number")]
    pub previous_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub private_ip: String,
    #[serde(deserialize_with = "string_or_number")]
    pub public_ip: String,
    #[serde(deserialize_with = "string_or_number")]
    pub restart_time_in_sec: String,
    #[serde(rename = "runtimeOS", deserialize_with = "string_or_number")]
    pub runtime_os: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sarge_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub system_start_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mtunnel_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_attempt: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_status: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub upgrade_now_once: bool,
}

impl AssistantVersion {
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.current_version.is_empty()
    }
}

/// Upgrade record shared by app connectors and service edges
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubModuleUpgrade {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub current_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub entity_gid: String,
    #[serde(deserialize_with = "string_or_number")]
    pub entity_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub expected_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub previous_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub role: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_time: String,
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/appConnectorGroup/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConnectorGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub city_country: String,
    #[serde(deserialize_with = "string_or_number")]
    pub country_code: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "string_or_number")]
    pub dns_query_type: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub geo_location_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub location: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub override_version_profile: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub pra_enabled: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub waf_disabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_day: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_time_in_secs: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version_profile_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version_profile_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version_profile_visibility_scope: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub lss_app_connector_group: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub tcp_quick_ack_app: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub tcp_quick_ack_assistant: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub tcp_quick_ack_read_assistant: bool,
    #[serde(rename = "useInDrMode", deserialize_with = "bool_or_string")]
    pub use_in_dr_mode: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(rename = "serverGroups", deserialize_with = "null_default")]
    pub server_groups: Vec<AppServerGroupSummary>,
}

impl Named for AppConnectorGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Server group as embedded in an app connector group
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppServerGroupSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub config_space: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub dynamic_discovery: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
}

pub struct AppConnectorApi<'a> {
    client: &'a Client,
}

impl<'a> AppConnectorApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/connector/{id}
    pub async fn get_connector(&self, id: &str) -> Result<AppConnector, ApiError> {
        let path = format!("{}/connector/{}", self.client.mgmt_v1(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/connector?search={name}
    pub async fn get_connector_by_name(&self, name: &str) -> Result<Option<AppConnector>, ApiError> {
        let path = format!("{}/connector", self.client.mgmt_v1());
        self.client.find_by_name(&path, name).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/appConnectorGroup/{id}
    pub async fn get_group(&self, id: &str) -> Result<AppConnectorGroup, ApiError> {
        let path = format!("{}/appConnectorGroup/{}", self.client.mgmt_v1(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/appConnectorGroup?search={name}
    pub async fn get_group_by_name(&self, name: &str) -> Result<Option<AppConnectorGroup>, ApiError> {
        let path = format!("{}/appConnectorGroup", self.client.mgmt_v1());
        self.client.find_by_name(&path, name).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_tolerates_nulls_and_numbers() {
        let json = r#"{
            "id": "72058304855015574",
            "name": "connector01",
            "enabled": true,
            "creationTime": 1624408163,
            "ipAcl": null,
            "runtimeOS": "Linux",
            "enrollmentCert": {"name": "Connector", "id": 2519},
            "assistantVersion": {"id": "1", "currentVersion": "21.75.1", "loneWarrior": "true"},
            "zpnSubModuleUpgradeList": null
        }"#;
        let connector: AppConnector = serde_json::from_str(json).unwrap();
        assert_eq!(connector.creation_time, "1624408163");
        assert_eq!(connector.ip_acl, "");
        assert_eq!(connector.runtime_os, "Linux");
        assert_eq!(connector.enrollment_cert.len(), 2);
        assert!(connector.assistant_version.lone_warrior);
        assert!(connector.zpn_sub_module_upgrade_list.is_empty());
    }

    #[test]
    fn test_group_with_server_groups() {
        let json = r#"{
            "id": "1",
            "name": "group",
            "useInDrMode": "false",
            "tcpQuickAckApp": true,
            "serverGroups": [{"id": "10", "name": "sg", "dynamicDiscovery": true}]
        }"#;
        let group: AppConnectorGroup = serde_json::from_str(json).unwrap();
        assert!(!group.use_in_dr_mode);
        assert!(group.tcp_quick_ack_app);
        assert_eq!(group.server_groups.len(), 1);
        assert!(group.server_groups[0].dynamic_discovery);
    }
}
