//! Identity provider data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, SchemaBuilder};
use tfplug::types::Dynamic;

use super::helpers::{
    computed_bool, computed_string, configure_provider_data, id_attribute, lookup_response,
    name_attribute, not_found_as_none, read_identifier, string_list_or_null, string_or_null,
    unconfigured_provider,
};
use crate::api::identity::{IdpController, IdpMetadata};
use crate::ZpaProviderData;

const IDP_STRINGS: &[&str] = &[
    "description",
    "admin_sp_signing_cert_id",
    "auto_provision",
    "creation_time",
    "idp_entity_id",
    "login_name_attribute",
    "login_url",
    "enable_arbitrary_auth_domains",
    "modifiedby",
    "modified_time",
    "scim_service_provider_endpoint",
    "sign_saml_request",
    "user_sp_signing_cert_id",
];

const IDP_BOOLS: &[&str] = &[
    "enabled",
    "disable_saml_based_policy",
    "enable_scim_based_policy",
    "login_hint",
    "force_auth",
    "reauth_on_user_update",
    "redirect_binding",
    "scim_enabled",
    "scim_shared_secret_exists",
    "use_custom_sp_metadata",
];

const METADATA_STRINGS: &[&str] = &[
    "certificate_url",
    "sp_base_url",
    "sp_entity_id",
    "sp_metadata_url",
    "sp_post_url",
];

#[derive(Default)]
pub struct IdpControllerDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl IdpControllerDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn metadata_block(type_name: &str) -> NestedBlock {
    METADATA_STRINGS
        .iter()
        .fold(NestedBlockBuilder::set(type_name), |builder, name| {
            builder.attribute(computed_string(name))
        })
        .build()
}

fn flatten_metadata(metadata: Option<&IdpMetadata>) -> Dynamic {
    let Some(metadata) = metadata else {
        return Dynamic::List(vec![]);
    };
    Dynamic::List(vec![Dynamic::object([
        ("certificate_url", string_or_null(&metadata.certificate_url)),
        ("sp_base_url", string_or_null(&metadata.sp_base_url)),
        ("sp_entity_id", string_or_null(&metadata.sp_entity_id)),
        ("sp_metadata_url", string_or_null(&metadata.sp_metadata_url)),
        ("sp_post_url", string_or_null(&metadata.sp_post_url)),
    ])])
}

fn flatten(idp: &IdpController) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(idp.id.clone())),
        ("name", string_or_null(&idp.name)),
        ("description", string_or_null(&idp.description)),
        ("enabled", Dynamic::Bool(idp.enabled)),
        ("admin_sp_signing_cert_id", string_or_null(&idp.admin_sp_signing_cert_id)),
        ("auto_provision", string_or_null(&idp.auto_provision)),
        ("creation_time", string_or_null(&idp.creation_time)),
        ("disable_saml_based_policy", Dynamic::Bool(idp.disable_saml_based_policy)),
        ("domain_list", string_list_or_null(&idp.domain_list)),
        ("enable_scim_based_policy", Dynamic::Bool(idp.enable_scim_based_policy)),
        ("idp_entity_id", string_or_null(&idp.idp_entity_id)),
        ("login_name_attribute", string_or_null(&idp.login_name_attribute)),
        ("login_url", string_or_null(&idp.login_url)),
        ("login_hint", Dynamic::Bool(idp.login_hint)),
        ("force_auth", Dynamic::Bool(idp.force_auth)),
        (
            "enable_arbitrary_auth_domains",
            string_or_null(&idp.enable_arbitrary_auth_domains),
        ),
        ("modifiedby", string_or_null(&idp.modified_by)),
        ("modified_time", string_or_null(&idp.modified_time)),
        ("reauth_on_user_update", Dynamic::Bool(idp.reauth_on_user_update)),
        ("redirect_binding", Dynamic::Bool(idp.redirect_binding)),
        ("scim_enabled", Dynamic::Bool(idp.scim_enabled)),
        (
            "scim_service_provider_endpoint",
            string_or_null(&idp.scim_service_provider_endpoint),
        ),
        ("scim_shared_secret_exists", Dynamic::Bool(idp.scim_shared_secret_exists)),
        ("sign_saml_request", string_or_null(&idp.sign_saml_request)),
        ("sso_type", string_list_or_null(&idp.sso_type)),
        ("use_custom_sp_metadata", Dynamic::Bool(idp.use_custom_sp_metadata)),
        ("user_sp_signing_cert_id", string_or_null(&idp.user_sp_signing_cert_id)),
        ("admin_metadata", flatten_metadata(idp.admin_metadata.as_ref())),
        ("user_metadata", flatten_metadata(idp.user_metadata.as_ref())),
    ])
}

#[async_trait]
impl DataSource for IdpControllerDataSource {
    fn type_name(&self) -> &str {
        "zpa_idp_controller"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA IdP controller by ID or name.")
            .attribute(id_attribute("identity provider"))
            .attribute(name_attribute("identity provider"))
            .attribute(
                AttributeBuilder::new("domain_list", AttributeType::list_of(AttributeType::String))
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sso_type", AttributeType::list_of(AttributeType::String))
                    .computed()
                    .build(),
            );
        let builder = IDP_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)));
        let schema = IDP_BOOLS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_bool(name)))
            .block(metadata_block("admin_metadata"))
            .block(metadata_block("user_metadata"))
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
        let api = provider_data.client.identity();

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading identity provider");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_idp(id).await),
            None => api.get_idp_by_name(&identifier.name).await,
        };

        lookup_response(result, "identity provider", &identifier, flatten)
    }
}

#[async_trait]
impl DataSourceWithConfigure for IdpControllerDataSource {
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
    fn metadata_becomes_single_element_block() {
        let idp = IdpController {
            id: "1".to_string(),
            name: "Okta".to_string(),
            admin_metadata: Some(IdpMetadata {
                sp_entity_id: "https://sp.example.com".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let Dynamic::Map(state) = flatten(&idp) else {
            panic!("expected an object");
        };
        assert_eq!(state["user_metadata"], Dynamic::List(vec![]));
        let Dynamic::List(admin) = &state["admin_metadata"] else {
            panic!("expected a list");
        };
        assert_eq!(admin.len(), 1);
        let Dynamic::Map(admin) = &admin[0] else {
            panic!("expected an object");
        };
        assert_eq!(admin["sp_entity_id"], Dynamic::from("https://sp.example.com"));
        assert_eq!(admin["sp_post_url"], Dynamic::Null);
        assert_eq!(state["domain_list"], Dynamic::Null);
    }
}
