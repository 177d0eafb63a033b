//! SCIM attribute header data source implementation
//!
//! Headers live under an identity provider, so the IdP is resolved first from
//! `idp_id` or `idp_name`. The attribute's known values are fetched afterwards
//! from the user config API.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};

use super::helpers::{
    client_error, computed_bool, computed_string, configure_provider_data, id_attribute,
    name_attribute, not_found, not_found_as_none, read_identifier, read_idp_identifier,
    resolve_idp, state_response, string_list_or_null, string_or_null, string_set_or_null,
    unconfigured_provider, Identifier,
};
use crate::api::identity::{IdpController, ScimAttributeHeader};
use crate::api::ApiError;
use crate::ZpaProviderData;

const HEADER_STRINGS: &[&str] = &[
    "creation_time",
    "data_type",
    "description",
    "modifiedby",
    "modified_time",
    "mutability",
    "returned",
    "schema_uri",
];

const HEADER_BOOLS: &[&str] = &["case_sensitive", "multivalued", "required", "uniqueness"];

#[derive(Default)]
pub struct ScimAttributeHeaderDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl ScimAttributeHeaderDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flatten(header: &ScimAttributeHeader, idp: &IdpController, values: &[String]) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(header.id.clone())),
        ("name", string_or_null(&header.name)),
        ("idp_id", Dynamic::String(idp.id.clone())),
        ("idp_name", string_or_null(&idp.name)),
        ("canonical_values", string_list_or_null(&header.canonical_values)),
        ("case_sensitive", Dynamic::Bool(header.case_sensitive)),
        ("creation_time", string_or_null(&header.creation_time)),
        ("data_type", string_or_null(&header.data_type)),
        ("description", string_or_null(&header.description)),
        ("modifiedby", string_or_null(&header.modified_by)),
        ("modified_time", string_or_null(&header.modified_time)),
        ("multivalued", Dynamic::Bool(header.multivalued)),
        ("mutability", string_or_null(&header.mutability)),
        ("required", Dynamic::Bool(header.required)),
        ("returned", string_or_null(&header.returned)),
        ("schema_uri", string_or_null(&header.schema_uri)),
        ("uniqueness", Dynamic::Bool(header.uniqueness)),
        ("values", string_set_or_null(values)),
    ])
}

impl ScimAttributeHeaderDataSource {
    async fn lookup(
        &self,
        provider_data: &ZpaProviderData,
        idp_identifier: &Identifier,
        identifier: &Identifier,
    ) -> Result<Dynamic, Diagnostic> {
        let idp = resolve_idp(provider_data, idp_identifier).await?;
        let api = provider_data.client.identity();

        let header: Result<Option<ScimAttributeHeader>, ApiError> = match identifier.id() {
            Some(id) => not_found_as_none(api.get_scim_attribute(&idp.id, id).await),
            None => {
                api.get_scim_attribute_by_name(&idp.id, &identifier.name)
                    .await
            }
        };
        let header = header
            .map_err(|e| client_error("SCIM attribute header", &e))?
            .ok_or_else(|| not_found("SCIM attribute header", identifier))?;

        let idp_id = if header.idp_id.is_empty() {
            idp.id.as_str()
        } else {
            header.idp_id.as_str()
        };
        let values = api
            .get_scim_attribute_values(idp_id, &header.id)
            .await
            .map_err(|e| client_error("SCIM attribute header values", &e))?;

        Ok(flatten(&header, &idp, &values))
    }
}

#[async_trait]
impl DataSource for ScimAttributeHeaderDataSource {
    fn type_name(&self) -> &str {
        "zpa_scim_attribute_header"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a SCIM attribute header definition.")
            .attribute(id_attribute("SCIM attribute header"))
            .attribute(name_attribute("SCIM attribute header"))
            .attribute(
                AttributeBuilder::string("idp_id")
                    .description("Identifier of the IdP to scope the lookup.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::string("idp_name")
                    .description("Name of the IdP to scope the lookup.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "canonical_values",
                    AttributeType::list_of(AttributeType::String),
                )
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("values", AttributeType::set_of(AttributeType::String))
                    .description("Values currently assigned to the attribute.")
                    .computed()
                    .build(),
            );
        let builder = HEADER_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)));
        let schema = HEADER_BOOLS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_bool(name)))
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

        let idp_identifier = match read_idp_identifier(&request.config) {
            Ok(identifier) => identifier,
            Err(diag) => return ReadDataSourceResponse::error(diag),
        };
        let identifier = match read_identifier(&request.config) {
            Ok(identifier) => identifier,
            Err(diag) => return ReadDataSourceResponse::error(diag),
        };

        tracing::debug!(
            idp_id = %idp_identifier.id,
            idp_name = %idp_identifier.name,
            id = %identifier.id,
            name = %identifier.name,
            "Reading SCIM attribute header"
        );

        match self
            .lookup(provider_data, &idp_identifier, &identifier)
            .await
        {
            Ok(state) => state_response(state),
            Err(diag) => ReadDataSourceResponse::error(diag),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for ScimAttributeHeaderDataSource {
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
    use tfplug::types::DynamicValue;

    #[test]
    fn idp_is_required() {
        let config = DynamicValue::new(Dynamic::object([("name", Dynamic::from("department"))]));
        let diag = read_idp_identifier(&config).unwrap_err();
        assert_eq!(diag.summary, "Missing Required Attribute");
        assert_eq!(diag.detail, "Either 'idp_id' or 'idp_name' must be provided.");
    }

    #[test]
    fn idp_fields_come_from_resolved_idp() {
        let header = ScimAttributeHeader {
            id: "5".to_string(),
            name: "department".to_string(),
            ..Default::default()
        };
        let idp = IdpController {
            id: "1".to_string(),
            name: "Okta".to_string(),
            ..Default::default()
        };
        let values = vec!["Sales".to_string(), "Sales".to_string(), "IT".to_string()];
        let Dynamic::Map(state) = flatten(&header, &idp, &values) else {
            panic!("expected an object");
        };
        assert_eq!(state["idp_id"], Dynamic::from("1"));
        assert_eq!(state["idp_name"], Dynamic::from("Okta"));
        assert_eq!(
            state["values"],
            Dynamic::List(vec![Dynamic::from("Sales"), Dynamic::from("IT")])
        );
        assert_eq!(state["canonical_values"], Dynamic::Null);
    }
}
