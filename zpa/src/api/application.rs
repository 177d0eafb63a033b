//! Application segments, segment groups, server groups and application servers

use serde::Deserialize;

use super::common::{bool_or_string, null_default, string_or_number, IdName, Named};
use super::{ApiError, Client};

/// GET /mgmtconfig/v1/admin/customers/{customerId}/application/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationSegment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub segment_group_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub segment_group_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub bypass_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub config_space: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub default_idle_timeout: String,
    #[serde(deserialize_with = "string_or_number")]
    pub default_max_age: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub domain_names: Vec<String>,
    #[serde(deserialize_with = "bool_or_string")]
    pub double_encrypt: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub health_check_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub health_reporting: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub select_connector_close_to_app: bool,
    #[serde(rename = "useInDrMode", deserialize_with = "bool_or_string")]
    pub use_in_dr_mode: bool,
    #[serde(rename = "isIncompleteDRConfig", deserialize_with = "bool_or_string")]
    pub is_incomplete_dr_config: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub ip_anchored: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub is_cname_enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub passive_health_enabled: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub api_protection_enabled: bool,
    #[serde(deserialize_with = "null_default")]
    pub server_groups: Vec<IdName>,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(deserialize_with = "null_default")]
    pub tcp_port_ranges: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub udp_port_ranges: Vec<String>,
    #[serde(rename = "tcpPortRange", deserialize_with = "null_default")]
    pub tcp_port_range: Vec<PortRange>,
    #[serde(rename = "udpPortRange", deserialize_with = "null_default")]
    pub udp_port_range: Vec<PortRange>,
    #[serde(deserialize_with = "string_or_number")]
    pub match_style: String,
}

impl Named for ApplicationSegment {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortRange {
    #[serde(deserialize_with = "string_or_number")]
    pub from: String,
    #[serde(deserialize_with = "string_or_number")]
    pub to: String,
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/segmentGroup/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub config_space: String,
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
}

impl Named for SegmentGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/serverGroup/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub config_space: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub ip_anchored: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub dynamic_discovery: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
    #[serde(deserialize_with = "null_default")]
    pub applications: Vec<IdName>,
    #[serde(deserialize_with = "null_default")]
    pub app_connector_groups: Vec<IdName>,
    #[serde(deserialize_with = "null_default")]
    pub servers: Vec<IdName>,
}

impl Named for ServerGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/server/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppServer {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub address: String,
    #[serde(deserialize_with = "null_default")]
    pub app_server_group_ids: Vec<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub config_space: String,
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
}

impl Named for AppServer {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Application-side objects: segments and the groups and servers behind them
pub struct ApplicationApi<'a> {
    client: &'a Client,
}

impl<'a> ApplicationApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(&self, endpoint: &str) -> String {
        format!("{}/{}", self.client.mgmt_v1(), endpoint)
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/application/{id}
    pub async fn get_segment(&self, id: &str) -> Result<ApplicationSegment, ApiError> {
        self.client
            .get(&format!("{}/{}", self.path("application"), id))
            .await
    }

    pub async fn get_segment_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ApplicationSegment>, ApiError> {
        self.client
            .find_by_name(&self.path("application"), name)
            .await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/segmentGroup/{id}
    pub async fn get_segment_group(&self, id: &str) -> Result<SegmentGroup, ApiError> {
        self.client
            .get(&format!("{}/{}", self.path("segmentGroup"), id))
            .await
    }

    pub async fn get_segment_group_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SegmentGroup>, ApiError> {
        self.client
            .find_by_name(&self.path("segmentGroup"), name)
            .await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/serverGroup/{id}
    pub async fn get_server_group(&self, id: &str) -> Result<ServerGroup, ApiError> {
        self.client
            .get(&format!("{}/{}", self.path("serverGroup"), id))
            .await
    }

    pub async fn get_server_group_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ServerGroup>, ApiError> {
        self.client
            .find_by_name(&self.path("serverGroup"), name)
            .await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/server/{id}
    pub async fn get_server(&self, id: &str) -> Result<AppServer, ApiError> {
        self.client
            .get(&format!("{}/{}", self.path("server"), id))
            .await
    }

    pub async fn get_server_by_name(&self, name: &str) -> Result<Option<AppServer>, ApiError> {
        self.client.find_by_name(&self.path("server"), name).await
    }
}
