//! Service edge (private broker) controllers and groups

use serde::Deserialize;
use std::collections::HashMap;

use super::app_connector::SubModuleUpgrade;
use super::common::{
    bool_or_string, null_default, string_or_joined_list, string_or_number, IdName, Named,
};
use super::{ApiError, Client};

/// GET /mgmtconfig/v1/admin/customers/{customerId}/serviceEdge/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceEdge {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub application_start_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub service_edge_group_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub service_edge_group_name: String,
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
    #[serde(deserialize_with = "string_or_joined_list")]
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
    #[serde(deserialize_with = "null_default")]
    pub listen_ips: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub publish_ips: Vec<String>,
    #[serde(deserialize_with = "bool_or_string")]
    pub publish_ipv6: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub provisioning_key_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub provisioning_key_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub platform: String,
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
    pub private_broker_version: Option<PrivateBrokerVersion>,
}

impl Named for ServiceEdge {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivateBrokerVersion {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub application_start_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub broker_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub current_version: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub disable_auto_update: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub last_connect_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_disconnect_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last_upgraded_time: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub lone_warrior: bool,
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
    pub service_edge_group_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub private_ip: String,
    #[serde(deserialize_with = "string_or_number")]
    pub public_ip: String,
    #[serde(deserialize_with = "string_or_number")]
    pub restart_instructions: String,
    #[serde(deserialize_with = "string_or_number")]
    pub restart_time_in_sec: String,
    #[serde(rename = "runtimeOS", deserialize_with = "string_or_number")]
    pub runtime_os: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sarge_version: String,
    #[serde(deserialize_with = "string_or_number")]
    pub system_start_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub tunnel_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_attempt: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upgrade_status: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub upgrade_now_once: bool,
    #[serde(deserialize_with = "null_default")]
    pub zpn_sub_module_upgrade_list: Vec<SubModuleUpgrade>,
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/serviceEdgeGroup/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceEdgeGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub alt_cloud: String,
    #[serde(deserialize_with = "string_or_number")]
    pub city_country: String,
    #[serde(deserialize_with = "string_or_number")]
    pub country_code: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub geo_location_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub is_public: String,
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub location: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub override_version_profile: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(rename = "useInDrMode", deserialize_with = "bool_or_string")]
    pub use_in_dr_mode: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub site_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub site_name: String,
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
    pub grace_distance_enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub grace_distance_value: String,
    #[serde(deserialize_with = "string_or_number")]
    pub grace_distance_value_unit: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(deserialize_with = "null_default")]
    pub service_edges: Vec<ServiceEdge>,
    #[serde(deserialize_with = "null_default")]
    pub trusted_networks: Vec<IdName>,
}

impl Named for ServiceEdgeGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct ServiceEdgeApi<'a> {
    client: &'a Client,
}

impl<'a> ServiceEdgeApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/serviceEdge/{id}
    pub async fn get_service_edge(&self, id: &str) -> Result<ServiceEdge, ApiError> {
        let path = format!("{}/serviceEdge/{}", self.client.mgmt_v1(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/serviceEdge
    pub async fn get_service_edge_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ServiceEdge>, ApiError> {
        let path = format!("{}/serviceEdge", self.client.mgmt_v1());
        self.client.find_by_name(&path, name).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/serviceEdgeGroup/{id}
    pub async fn get_group(&self, id: &str) -> Result<ServiceEdgeGroup, ApiError> {
        let path = format!("{}/serviceEdgeGroup/{}", self.client.mgmt_v1(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/serviceEdgeGroup
    pub async fn get_group_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ServiceEdgeGroup>, ApiError> {
        let path = format!("{}/serviceEdgeGroup", self.client.mgmt_v1());
        self.client.find_by_name(&path, name).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_service_edge_ip_acl_forms() {
        let edge: ServiceEdge =
            serde_json::from_str(r#"{"id":"1","ipAcl":["10.0.0.0/8","192.168.0.0/16"]}"#).unwrap();
        assert_eq!(edge.ip_acl, "10.0.0.0/8, 192.168.0.0/16");

        let edge: ServiceEdge = serde_json::from_str(r#"{"id":"1","ipAcl":"10.0.0.0/8"}"#).unwrap();
        assert_eq!(edge.ip_acl, "10.0.0.0/8");
    }

    #[test]
    fn test_group_nesting() {
        let json = r#"{
            "id": "1",
            "name": "seg",
            "isPublic": "FALSE",
            "serviceEdges": [{
                "id": "2",
                "name": "edge",
                "publishIps": ["1.1.1.1"],
                "privateBrokerVersion": {
                    "id": "3",
                    "currentVersion": "23.1",
                    "zpnSubModuleUpgradeList": [{"id": "4", "role": "zpn_brokerd"}]
                }
            }],
            "trustedNetworks": [{"id": "5", "name": "corp"}]
        }"#;
        let group: ServiceEdgeGroup = serde_json::from_str(json).unwrap();
        let edge = &group.service_edges[0];
        assert_eq!(edge.publish_ips, vec!["1.1.1.1"]);
        let version = edge.private_broker_version.as_ref().unwrap();
        assert_eq!(version.zpn_sub_module_upgrade_list[0].role, "zpn_brokerd");
        assert_eq!(group.trusted_networks[0].name, "corp");
    }
}
