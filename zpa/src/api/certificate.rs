//! Browser access (clientless) certificates and enrollment certificates

use serde::Deserialize;

use super::common::{bool_or_string, null_default, string_or_number, Named};
use super::{ApiError, Client};

/// GET /mgmtconfig/v1/admin/customers/{customerId}/clientlessCertificate/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaCertificate {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(rename = "cName", deserialize_with = "string_or_number")]
    pub cname: String,
    #[serde(deserialize_with = "string_or_number")]
    pub cert_chain: String,
    #[serde(deserialize_with = "string_or_number")]
    pub certificate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub issued_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub issued_to: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub public_key: String,
    #[serde(deserialize_with = "null_default")]
    pub san: Vec<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub serial_no: String,
    #[serde(deserialize_with = "string_or_number")]
    pub status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub valid_from_in_epoch_sec: String,
    #[serde(deserialize_with = "string_or_number")]
    pub valid_to_in_epoch_sec: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_name: String,
}

impl Named for BaCertificate {
    fn name(&self) -> &str {
        &self.name
    }
}

/// GET /mgmtconfig/v2/admin/customers/{customerId}/enrollmentCert/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrollmentCert {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub allow_signing: bool,
    #[serde(rename = "cName", deserialize_with = "string_or_number")]
    pub cname: String,
    #[serde(deserialize_with = "string_or_number")]
    pub certificate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub client_cert_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub creation_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub csr: String,
    #[serde(deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(deserialize_with = "string_or_number")]
    pub issued_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub issued_to: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_by: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modified_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub parent_cert_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub parent_cert_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub private_key: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub private_key_present: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub serial_no: String,
    #[serde(deserialize_with = "string_or_number")]
    pub valid_from_in_epoch_sec: String,
    #[serde(deserialize_with = "string_or_number")]
    pub valid_to_in_epoch_sec: String,
    #[serde(rename = "zrsaencryptedprivatekey", deserialize_with = "string_or_number")]
    pub zrsa_encrypted_private_key: String,
    #[serde(rename = "zrsaencryptedsessionkey", deserialize_with = "string_or_number")]
    pub zrsa_encrypted_session_key: String,
    #[serde(deserialize_with = "string_or_number")]
    pub microtenant_id: String,
}

impl Named for EnrollmentCert {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct CertificateApi<'a> {
    client: &'a Client,
}

impl<'a> CertificateApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /mgmtconfig/v1/admin/customers/{customerId}/clientlessCertificate/{id}
    pub async fn get_ba_certificate(&self, id: &str) -> Result<BaCertificate, ApiError> {
        let path = format!("{}/clientlessCertificate/{}", self.client.mgmt_v1(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/clientlessCertificate/issued
    pub async fn get_ba_certificate_by_name(
        &self,
        name: &str,
    ) -> Result<Option<BaCertificate>, ApiError> {
        let path = format!("{}/clientlessCertificate/issued", self.client.mgmt_v2());
        self.client.find_by_name(&path, name).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/enrollmentCert/{id}
    pub async fn get_enrollment_cert(&self, id: &str) -> Result<EnrollmentCert, ApiError> {
        let path = format!("{}/enrollmentCert/{}", self.client.mgmt_v2(), id);
        self.client.get(&path).await
    }

    /// GET /mgmtconfig/v2/admin/customers/{customerId}/enrollmentCert
    pub async fn get_enrollment_cert_by_name(
        &self,
        name: &str,
    ) -> Result<Option<EnrollmentCert>, ApiError> {
        let path = format!("{}/enrollmentCert", self.client.mgmt_v2());
        self.client.find_by_name(&path, name).await
    }
}
