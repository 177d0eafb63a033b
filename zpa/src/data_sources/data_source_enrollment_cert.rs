//! Enrollment certificate data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, SchemaBuilder};
use tfplug::types::Dynamic;

use super::helpers::{
    computed_bool, computed_string, configure_provider_data, id_attribute, lookup_response,
    micro_tenant, microtenant_id_attribute, microtenant_state, name_attribute, not_found_as_none,
    read_identifier, string_or_null, unconfigured_provider,
};
use crate::api::certificate::EnrollmentCert;
use crate::ZpaProviderData;

const CERT_STRINGS: &[&str] = &[
    "cname",
    "certificate",
    "client_cert_type",
    "creation_time",
    "csr",
    "description",
    "issued_by",
    "issued_to",
    "modified_by",
    "modified_time",
    "parent_cert_id",
    "parent_cert_name",
    "serial_no",
    "valid_from_in_epoch_sec",
    "valid_to_in_epoch_sec",
    "zrsa_encrypted_private_key",
    "zrsa_encrypted_session_key",
];

#[derive(Default)]
pub struct EnrollmentCertDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl EnrollmentCertDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(cert: &EnrollmentCert, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(cert.id.clone())),
        ("name", string_or_null(&cert.name)),
        ("microtenant_id", microtenant_state(microtenant_id, &cert.microtenant_id)),
        ("allow_signing", Dynamic::Bool(cert.allow_signing)),
        ("cname", string_or_null(&cert.cname)),
        ("certificate", string_or_null(&cert.certificate)),
        ("client_cert_type", string_or_null(&cert.client_cert_type)),
        ("creation_time", string_or_null(&cert.creation_time)),
        ("csr", string_or_null(&cert.csr)),
        ("description", string_or_null(&cert.description)),
        ("issued_by", string_or_null(&cert.issued_by)),
        ("issued_to", string_or_null(&cert.issued_to)),
        ("modified_by", string_or_null(&cert.modified_by)),
        ("modified_time", string_or_null(&cert.modified_time)),
        ("parent_cert_id", string_or_null(&cert.parent_cert_id)),
        ("parent_cert_name", string_or_null(&cert.parent_cert_name)),
        ("private_key", string_or_null(&cert.private_key)),
        ("private_key_present", Dynamic::Bool(cert.private_key_present)),
        ("serial_no", string_or_null(&cert.serial_no)),
        ("valid_from_in_epoch_sec", string_or_null(&cert.valid_from_in_epoch_sec)),
        ("valid_to_in_epoch_sec", string_or_null(&cert.valid_to_in_epoch_sec)),
        (
            "zrsa_encrypted_private_key",
            string_or_null(&cert.zrsa_encrypted_private_key),
        ),
        (
            "zrsa_encrypted_session_key",
            string_or_null(&cert.zrsa_encrypted_session_key),
        ),
    ])
}

#[async_trait]
impl DataSource for EnrollmentCertDataSource {
    fn type_name(&self) -> &str {
        "zpa_enrollment_cert"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA enrollment certificate by ID or name.")
            .attribute(id_attribute("enrollment certificate"))
            .attribute(name_attribute("enrollment certificate"))
            .attribute(microtenant_id_attribute())
            .attribute(computed_bool("allow_signing"))
            .attribute(computed_bool("private_key_present"))
            .attribute(
                AttributeBuilder::string("private_key")
                    .computed()
                    .sensitive()
                    .build(),
            );
        let schema = CERT_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)))
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
        let api = client.certificates();

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading enrollment certificate");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_enrollment_cert(id).await),
            None => api.get_enrollment_cert_by_name(&identifier.name).await,
        };

        lookup_response(result, "enrollment certificate", &identifier, |cert| {
            flatten(cert, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for EnrollmentCertDataSource {
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
