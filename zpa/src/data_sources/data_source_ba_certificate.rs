//! Browser access certificate data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::Dynamic;

use super::helpers::{
    computed_string, configure_provider_data, id_attribute, lookup_response, micro_tenant,
    microtenant_id_attribute, microtenant_state, name_attribute, not_found_as_none,
    read_identifier, string_list_or_null, string_or_null, unconfigured_provider,
};
use crate::api::certificate::BaCertificate;
use crate::ZpaProviderData;

#[derive(Default)]
pub struct BaCertificateDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl BaCertificateDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(cert: &BaCertificate, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(cert.id.clone())),
        ("name", string_or_null(&cert.name)),
        ("description", string_or_null(&cert.description)),
        ("cname", string_or_null(&cert.cname)),
        ("cert_chain", string_or_null(&cert.cert_chain)),
        ("certificate", string_or_null(&cert.certificate)),
        ("creation_time", string_or_null(&cert.creation_time)),
        ("issued_by", string_or_null(&cert.issued_by)),
        ("issued_to", string_or_null(&cert.issued_to)),
        ("modifiedby", string_or_null(&cert.modified_by)),
        ("modified_time", string_or_null(&cert.modified_time)),
        ("public_key", string_or_null(&cert.public_key)),
        ("san", string_list_or_null(&cert.san)),
        ("serial_no", string_or_null(&cert.serial_no)),
        ("status", string_or_null(&cert.status)),
        ("valid_from_in_epochsec", string_or_null(&cert.valid_from_in_epoch_sec)),
        ("valid_to_in_epochsec", string_or_null(&cert.valid_to_in_epoch_sec)),
        ("microtenant_id", microtenant_state(microtenant_id, &cert.microtenant_id)),
        ("microtenant_name", string_or_null(&cert.microtenant_name)),
    ])
}

#[async_trait]
impl DataSource for BaCertificateDataSource {
    fn type_name(&self) -> &str {
        "zpa_ba_certificate"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a browser access certificate by ID or name.")
            .attribute(id_attribute("browser access certificate"))
            .attribute(name_attribute("browser access certificate"))
            .attribute(computed_string("description"))
            .attribute(computed_string("cname"))
            .attribute(computed_string("cert_chain"))
            .attribute(computed_string("certificate"))
            .attribute(computed_string("creation_time"))
            .attribute(computed_string("issued_by"))
            .attribute(computed_string("issued_to"))
            .attribute(computed_string("modifiedby"))
            .attribute(computed_string("modified_time"))
            .attribute(computed_string("public_key"))
            .attribute(
                AttributeBuilder::new("san", AttributeType::list_of(AttributeType::String))
                    .description("Subject alternative names of the certificate.")
                    .computed()
                    .build(),
            )
            .attribute(computed_string("serial_no"))
            .attribute(computed_string("status"))
            .attribute(computed_string("valid_from_in_epochsec"))
            .attribute(computed_string("valid_to_in_epochsec"))
            .attribute(microtenant_id_attribute())
            .attribute(computed_string("microtenant_name"))
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

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading browser access certificate");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_ba_certificate(id).await),
            None => api.get_ba_certificate_by_name(&identifier.name).await,
        };

        lookup_response(result, "browser access certificate", &identifier, |cert| {
            flatten(cert, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for BaCertificateDataSource {
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
    fn epoch_fields_use_short_names() {
        let cert = BaCertificate {
            id: "1".to_string(),
            valid_from_in_epoch_sec: "1690000000".to_string(),
            san: vec!["crm.acme.com".to_string()],
            ..Default::default()
        };
        let Dynamic::Map(state) = flatten(&cert, None) else {
            panic!("expected an object");
        };
        assert_eq!(state["valid_from_in_epochsec"], Dynamic::from("1690000000"));
        assert_eq!(state["valid_to_in_epochsec"], Dynamic::Null);
        assert_eq!(
            state["san"],
            Dynamic::List(vec![Dynamic::from("crm.acme.com")])
        );
    }
}
