//! Identity providers with their SCIM attribute headers and SCIM groups

use serde::Deserialize;

use super::common::{bool_or_string, null_default, string_or_number, Named};
use super::{ApiError, Client};

/// GET /mgmtconfig/v1/admin/customers/{customerId}/idp/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdpController {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub admin_sp_signing_cert_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub auto_provision: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub disable_saml_based_policy: bool,
    #[serde(deserialize_with = "null_default")]
    pub domain_list: Vec<String>,
    #[serde(deserialize_with = "bool_or_string")]
    pub enable_scim_based_policy: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub idp_entity_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub login_name_attribute: String,
    #[serde(deserialize_with = "string_or_number")]
    pub login_url: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub login_hint: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub force_auth: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub enable_arbitrary_auth_domains: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub reauth_on_user_update: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub redirect_binding: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub scim_enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub scim_service_provider_endpoint: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub scim_shared_secret_exists: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub sign_saml_request: String,
    #[serde(deserialize_with = "null_default")]
    pub sso_type: Vec<String>,
    #[serde(rename = "useCustomSPMetadata", deserialize_with = "bool_or_string")]
    pub use_custom_sp_metadata: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub user_sp_signing_cert_id: String,
    #[serde(deserialize_with = "null_default")]
    pub admin_metadata: Option<IdpMetadata>,
    #[serde(deserialize_with = "null_default")]
    pub user_metadata: Option<IdpMetadata>,
}

impl Named for IdpController {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Service provider metadata of an IdP
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdpMetadata {
    #[serde(deserialize_with = "string_or_number")]
    pub certificate_url: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sp_base_url: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sp_entity_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sp_metadata_url: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sp_post_url: String,
}

/// GET /mgmtconfig/v1/admin/customers/{customerId}/idp/{idpId}/scimattribute/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScimAttributeHeader {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub idp_id: String,
    #[serde(deserialize_with = "null_default")]
    pub canonical_values: Vec<String>,
    #[serde(deserialize_with = "bool_or_string")]
    pub case_sensitive: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub data_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(rename = "multivalued", deserialize_with = "bool_or_string")]
    pub multivalued: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub mutability: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub required: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub returned: String,
    #[serde(rename = "schemaURI", deserialize_with = "string_or_number")]
    pub schema_uri: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub uniqueness: bool,
}

impl Named for ScimAttributeHeader {
    fn name(&self) -> &str {
        &self.name
    }
}

/// GET /userconfig/v1/customers/{customerId}/scimgroup/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScimGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub idp_group_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub idp_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub idp_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
}

impl Named for ScimGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct IdentityApi {
    client: Client,
}

impl IdentityApi {
    /// Identity objects are customer-wide and never micro-tenant scoped
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.without_microtenant(),
        }
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/idp/{id}
    pub async fn get_idp(&self, id: &str) -> Result<IdpController, ApiError> {
        let path = format!("{}/idp/{}", self.client.mgmt_v1(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/idp
    pub async fn get_idp_by_name(&self, name: &str) -> Result<Option<IdpController>, ApiError> {
        let path = format!("{}/idp", self.client.mgmt_v2());
        self.client.find_by_name(&path, name).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/idp/{idpId}/scimattribute/{id}
    pub async fn get_scim_attribute(
        &self,
        idp_id: &str,
        id: &str,
    ) -> Result<ScimAttributeHeader, ApiError> {
        let path = format!(
            "{}/idp/{}/scimattribute/{}",
            self.client.mgmt_v1(),
            idp_id,
            id
        );
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/idp/{idpId}/scimattribute
    pub async fn get_scim_attribute_by_name(
        &self,
        idp_id: &str,
        name: &str,
    ) -> Result<Option<ScimAttributeHeader>, ApiError> {
        let path = format!("{}/idp/{}/scimattribute", self.client.mgmt_v1(), idp_id);
        self.client.find_by_name(&path, name).await
    }

    /// GET /userconfig/v1/customers/{customerId}/scimattribute/idpId/{idpId}/attributeId/{id}
    pub async fn get_scim_attribute_values(
        &self,
        idp_id: &str,
        attribute_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let path = format!(
            "{}/scimattribute/idpId/{}/attributeId/{}",
            self.client.user_config_v1(),
            idp_id,
            attribute_id
        );
        self.client.get_all_pages(&path, None).await
    }

    /// GET /userconfig/v1/customers/{customerId}/scimgroup/{id}
    pub async fn get_scim_group(&self, id: &str) -> Result<ScimGroup, ApiError> {
        let path = format!("{}/scimgroup/{}", self.client.user_config_v1(), id);
        self.client.get(&path).await
    }

    /// GET /userconfig/v1/customers/{customerId}/scimgroup/idpId/{idpId}
    pub async fn get_scim_group_by_name(
        &self,
        idp_id: &str,
        name: &str,
    ) -> Result<Option<ScimGroup>, ApiError> {
        let path = format!(
            "{}/scimgroup/idpId/{}",
            self.client.user_config_v1(),
            idp_id
        );
        self.client.find_by_name(&path, name).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_idp_metadata() {
        let json = r#"{
            "id": "1",
            "name": "Okta",
            "ssoType": ["USER"],
            "useCustomSPMetadata": true,
            "adminMetadata": {"spEntityId": "https://sp.example.com"},
            "userMetadata": null
        }"#;
        let idp: IdpController = serde_json::from_str(json).unwrap();
        assert_eq!(idp.sso_type, vec!["USER"]);
        assert!(idp.use_custom_sp_metadata);
        assert_eq!(
            idp.admin_metadata.unwrap().sp_entity_id,
            "https://sp.example.com"
        );
        assert!(idp.user_metadata.is_none());
    }

    #[test]
    fn test_scim_header_keys() {
        let json = r#"{"id":"5","name":"department","idpId":"1","schemaURI":"urn:x","multivalued":true}"#;
        let header: ScimAttributeHeader = serde_json::from_str(json).unwrap();
        assert_eq!(header.schema_uri, "urn:x");
        assert!(header.multivalued);
        assert_eq!(header.idp_id, "1");
    }

    #[test]
    fn test_scim_group_numeric_fields() {
        let json = r#"{
            "id": 2079446,
            "name": "Engineering",
            "idpId": 72058304855021553,
            "idpGroupId": "00g1m2n3",
            "creationTime": 1631718059,
            "modifiedTime": 0
        }"#;
        let group: ScimGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.id, "2079446");
        assert_eq!(group.idp_id, "72058304855021553");
        assert_eq!(group.creation_time, "1631718059");
        assert_eq!(group.modified_time, "0");
        assert_eq!(group.idp_name, "");
    }
}
