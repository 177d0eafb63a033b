//! Access policy sets and the objects policy conditions refer to: posture
//! profiles, trusted networks, machine groups, platforms and client types

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use super::common::{bool_or_string, null_default, string_or_number, Named};
use super::{ApiError, Client};

/// Policy set types accepted by `/policySet/policyType/{type}`
pub const POLICY_TYPES: &[&str] = &[
    "ACCESS_POLICY",
    "GLOBAL_POLICY",
    "TIMEOUT_POLICY",
    "REAUTH_POLICY",
    "CLIENT_FORWARDING_POLICY",
    "BYPASS_POLICY",
    "ISOLATION_POLICY",
    "INSPECTION_POLICY",
    "SIEM_POLICY",
    "CREDENTIAL_POLICY",
    "CAPABILITIES_POLICY",
    "REDIRECTION_POLICY",
];

pub const DEFAULT_POLICY_TYPE: &str = "GLOBAL_POLICY";

/// GET /mgmtconfig/v1/admin/customers/{customerId}/policySet/policyType/{policyType}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicySet {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub policy_type: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub sorted: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(deserialize_with = "null_default")]
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyRule {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "string_or_number")]
    pub action: String,
    #[serde(deserialize_with = "string_or_number")]
    pub action_id: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub bypass_default_rule: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub custom_msg: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub operator: String,
    #[serde(deserialize_with = "string_or_number")]
    pub policy_set_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub policy_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub priority: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub reauth_default_rule: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub reauth_idle_timeout: String,
    #[serde(deserialize_with = "string_or_number")]
    pub reauth_timeout: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rule_order: String,
    #[serde(deserialize_with = "string_or_number")]
    pub zpn_cbi_profile_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub zpn_isolation_profile_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub zpn_inspection_profile_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(deserialize_with = "null_default")]
    pub conditions: Vec<PolicyCondition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyCondition {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub operator: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "null_default")]
    pub operands: Vec<PolicyOperand>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyOperand {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub idp_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub lhs: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub object_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rhs: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
}

/// GET /mgmtconfig/v2/admin/customers/{customerId}/posture/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostureProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub master_customer_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub domain: String,
    #[serde(deserialize_with = "string_or_number")]
    pub posture_udid: String,
    #[serde(deserialize_with = "string_or_number")]
    pub zscaler_cloud: String,
    #[serde(deserialize_with = "string_or_number")]
    pub zscaler_customer_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
}

impl Named for PostureProfile {
    fn name(&self) -> &str {
        &self.name
    }
}

/// GET /mgmtconfig/v2/admin/customers/{customerId}/network/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustedNetwork {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub domain: String,
    #[serde(deserialize_with = "string_or_number")]
    pub master_customer_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub network_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub zscaler_cloud: String,
}

impl Named for TrustedNetwork {
    fn name(&self) -> &str {
        &self.name
    }
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/machineGroup/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(deserialize_with = "null_default")]
    pub machines: Vec<Machine>,
}

impl Named for MachineGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Machine {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "string_or_number")]
    pub fingerprint: String,
    #[serde(deserialize_with = "string_or_number")]
    pub issued_cert_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub machine_group_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub machine_group_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub machine_token_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "null_default")]
    pub signing_cert: HashMap<String, serde_json::Value>,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/platform
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Platforms {
    #[serde(deserialize_with = "string_or_number")]
    pub linux: String,
    #[serde(deserialize_with = "string_or_number")]
    pub android: String,
    #[serde(deserialize_with = "string_or_number")]
    pub windows: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ios: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mac: String,
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/clientTypes
///
/// Keys are client type identifiers such as `zpn_client_type_zapp`, values
/// their display names.
pub type ClientTypes = BTreeMap<String, String>;

pub struct PolicyApi<'a> {
    client: &'a Client,
}

impl<'a> PolicyApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/policySet/policyType/{policyType}
    pub async fn get_policy_set_by_type(&self, policy_type: &str) -> Result<PolicySet, ApiError> {
        let path = format!(
            "{}/policySet/policyType/{}",
            self.client.mgmt_v1(),
            policy_type
        );
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/posture/{id}
    pub async fn get_posture_profile(&self, id: &str) -> Result<PostureProfile, ApiError> {
        let client = self.client.without_microtenant();
        let path = format!("{}/posture/{}", client.mgmt_v2(), id);
        client.get(&path).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/posture
    pub async fn get_posture_profile_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PostureProfile>, ApiError> {
        let client = self.client.without_microtenant();
        let path = format!("{}/posture", client.mgmt_v2());
        client.find_by_name(&path, name).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/network/{id}
    pub async fn get_trusted_network(&self, id: &str) -> Result<TrustedNetwork, ApiError> {
        let client = self.client.without_microtenant();
        let path = format!("{}/network/{}", client.mgmt_v2(), id);
        client.get(&path).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/network
    pub async fn get_trusted_network_by_name(
        &self,
        name: &str,
    ) -> Result<Option<TrustedNetwork>, ApiError> {
        let client = self.client.without_microtenant();
        let path = format!("{}/network", client.mgmt_v2());
        client.find_by_name(&path, name).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/machineGroup/{id}
    pub async fn get_machine_group(&self, id: &str) -> Result<MachineGroup, ApiError> {
        let path = format!("{}/machineGroup/{}", self.client.mgmt_v1(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/machineGroup
    pub async fn get_machine_group_by_name(
        &self,
        name: &str,
    ) -> Result<Option<MachineGroup>, ApiError> {
        let path = format!("{}/machineGroup", self.client.mgmt_v1());
        self.client.find_by_name(&path, name).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/platform
    pub async fn get_platforms(&self) -> Result<Platforms, ApiError> {
        let client = self.client.without_microtenant();
        let path = format!("{}/platform", client.mgmt_v1());
        client.get(&path).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/clientTypes
    pub async fn get_client_types(&self) -> Result<ClientTypes, ApiError> {
        let client = self.client.without_microtenant();
        let path = format!("{}/clientTypes", client.mgmt_v1());
        client.get(&path).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_set_nesting() {
        let json = r#"{
            "id": "216196257331281921",
            "name": "Global_Policy",
            "enabled": true,
            "policyType": "1",
            "sorted": true,
            "rules": [{
                "id": "1",
                "name": "rule",
                "priority": 1,
                "ruleOrder": "1",
                "conditions": [{
                    "id": "2",
                    "operator": "OR",
                    "operands": [{"id": "3", "objectType": "APP", "lhs": "id", "rhs": "10"}]
                }]
            }]
        }"#;
        let set: PolicySet = serde_json::from_str(json).unwrap();
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].priority, "1");
        assert_eq!(set.rules[0].conditions[0].operands[0].object_type, "APP");
    }

    #[test]
    fn test_platforms_and_client_types() {
        let platforms: Platforms = serde_json::from_str(
            r#"{"linux":"Linux","android":"Android","windows":"Windows","ios":"iOS","mac":"Mac"}"#,
        )
        .unwrap();
        assert_eq!(platforms.ios, "iOS");

        let types: ClientTypes = serde_json::from_str(
            r#"{"zpn_client_type_zapp":"Client Connector","zpn_client_type_exporter":"Web Browser"}"#,
        )
        .unwrap();
        assert_eq!(types["zpn_client_type_zapp"], "Client Connector");
    }

    #[test]
    fn test_policy_types() {
        assert!(POLICY_TYPES.contains(&DEFAULT_POLICY_TYPE));
        assert_eq!(POLICY_TYPES.len(), 12);
    }
}
