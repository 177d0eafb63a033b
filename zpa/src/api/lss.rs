//! Log Streaming Service (LSS) lookup tables

use serde::Deserialize;
use std::collections::HashMap;

use super::common::null_default;
use super::{ApiError, Client};

pub const LSS_STATUS_CODES_PATH: &str = "/mgmtconfig/v2/admin/lssConfig/statusCodes";

/// Status code tables keyed by log type. Values are opaque JSON objects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LssStatusCodes {
    #[serde(deserialize_with = "null_default")]
    pub zpn_auth_log: HashMap<String, serde_json::Value>,
    #[serde(deserialize_with = "null_default")]
    pub zpn_ast_auth_log: HashMap<String, serde_json::Value>,
    #[serde(deserialize_with = "null_default")]
    pub zpn_trans_log: HashMap<String, serde_json::Value>,
    #[serde(deserialize_with = "null_default")]
    pub zpn_sys_auth_log: HashMap<String, serde_json::Value>,
}

pub struct LssApi {
    client: Client,
}

impl LssApi {
    /// LSS tables are global and never micro-tenant scoped
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.without_microtenant(),
        }
    }

    /// GET /mgmtconfig/v2/admin/lssConfig/statusCodes
    pub async fn get_status_codes(&self) -> Result<LssStatusCodes, ApiError> {
        self.client.get(LSS_STATUS_CODES_PATH).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_shape() {
        let json = r#"{
            "zpn_auth_log": {"ZPN_STATUS_AUTH_FAILED": {"status": "failed"}},
            "zpn_trans_log": null
        }"#;
        let codes: LssStatusCodes = serde_json::from_str(json).unwrap();
        assert_eq!(codes.zpn_auth_log.len(), 1);
        assert!(codes.zpn_trans_log.is_empty());
        assert!(codes.zpn_ast_auth_log.is_empty());
    }
}
