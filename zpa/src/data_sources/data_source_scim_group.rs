//! SCIM group data source implementation
//!
//! A group can be read by ID alone. Lookups by name are scoped to an identity
//! provider given by `idp_id` or `idp_name`.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};

use super::helpers::{
    client_error, computed_string, configure_provider_data, id_attribute, lookup_response,
    name_attribute, not_found, not_found_as_none, read_identifier, read_idp_identifier,
    resolve_idp, state_response, string_or_null, unconfigured_provider, Identifier,
};
use crate::api::identity::{IdpController, ScimGroup};
use crate::ZpaProviderData;

#[derive(Default)]
pub struct ScimGroupDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl ScimGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Epoch seconds; zero and missing read as null
fn epoch_or_null(value: &str) -> Dynamic {
    match value.trim().parse::<i64>() {
        Ok(0) | Err(_) => Dynamic::Null,
        Ok(seconds) => Dynamic::Number(seconds as f64),
    }
}

/// IdP ID as a string; `0` means the group carries none
fn idp_id_or_null(value: &str) -> Dynamic {
    if value.trim() == "0" {
        Dynamic::Null
    } else {
        string_or_null(value)
    }
}

fn flatten(group: &ScimGroup, idp: Option<&IdpController>) -> Dynamic {
    let (idp_id, idp_name) = match idp {
        Some(idp) => (Dynamic::String(idp.id.clone()), string_or_null(&idp.name)),
        None => (idp_id_or_null(&group.idp_id), string_or_null(&group.idp_name)),
    };

    Dynamic::object([
        ("id", Dynamic::String(group.id.clone())),
        ("name", string_or_null(&group.name)),
        ("idp_group_id", string_or_null(&group.idp_group_id)),
        ("idp_id", idp_id),
        ("idp_name", idp_name),
        ("creation_time", epoch_or_null(&group.creation_time)),
        ("modified_time", epoch_or_null(&group.modified_time)),
    ])
}

impl ScimGroupDataSource {
    async fn lookup_by_name(
        &self,
        provider_data: &ZpaProviderData,
        idp_identifier: &Identifier,
        identifier: &Identifier,
    ) -> Result<Dynamic, Diagnostic> {
        let idp = resolve_idp(provider_data, idp_identifier).await?;

        tracing::debug!(
            name = %identifier.name,
            idp_id = %idp.id,
            idp_name = %idp.name,
            "Retrieving SCIM group by name"
        );

        let group = provider_data
            .client
            .identity()
            .get_scim_group_by_name(&idp.id, &identifier.name)
            .await
            .map_err(|e| client_error("SCIM group", &e))?
            .ok_or_else(|| not_found("SCIM group", identifier))?;

        Ok(flatten(&group, Some(&idp)))
    }
}

#[async_trait]
impl DataSource for ScimGroupDataSource {
    fn type_name(&self) -> &str {
        "zpa_scim_groups"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a SCIM group by ID or name.")
            .attribute(id_attribute("SCIM group"))
            .attribute(name_attribute("SCIM group"))
            .attribute(
                AttributeBuilder::string("idp_id")
                    .description("Identifier of the IdP associated with the SCIM group.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::string("idp_name")
                    .description("Name of the IdP associated with the SCIM group.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(computed_string("idp_group_id"))
            .attribute(AttributeBuilder::number("creation_time").computed().build())
            .attribute(AttributeBuilder::number("modified_time").computed().build())
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

        if let Some(id) = identifier.id() {
            tracing::debug!(id = %id, "Retrieving SCIM group by ID");
            let result = not_found_as_none(provider_data.client.identity().get_scim_group(id).await);
            return lookup_response(result, "SCIM group", &identifier, |group| {
                flatten(group, None)
            });
        }

        let idp_identifier = match read_idp_identifier(&request.config) {
            Ok(identifier) => identifier,
            Err(diag) => return ReadDataSourceResponse::error(diag),
        };

        match self
            .lookup_by_name(provider_data, &idp_identifier, &identifier)
            .await
        {
            Ok(state) => state_response(state),
            Err(diag) => ReadDataSourceResponse::error(diag),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for ScimGroupDataSource {
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

    fn group() -> ScimGroup {
        serde_json::from_str(
            r#"{
                "id": 2079446,
                "name": "Engineering",
                "idpId": 72058304855021553,
                "idpName": "Okta",
                "idpGroupId": "00g1m2n3",
                "creationTime": 1631718059,
                "modifiedTime": 0
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn flatten_by_id_keeps_group_idp_and_nulls_zero_times() {
        let Dynamic::Map(state) = flatten(&group(), None) else {
            panic!("expected an object");
        };
        assert_eq!(state["id"], Dynamic::from("2079446"));
        assert_eq!(state["idp_id"], Dynamic::from("72058304855021553"));
        assert_eq!(state["idp_name"], Dynamic::from("Okta"));
        assert_eq!(state["idp_group_id"], Dynamic::from("00g1m2n3"));
        assert_eq!(state["creation_time"], Dynamic::Number(1631718059.0));
        assert_eq!(state["modified_time"], Dynamic::Null);
    }

    #[test]
    fn flatten_by_name_takes_idp_from_resolved_idp() {
        let idp = IdpController {
            id: "72058304855021999".to_string(),
            name: "Azure AD".to_string(),
            ..Default::default()
        };
        let Dynamic::Map(state) = flatten(&group(), Some(&idp)) else {
            panic!("expected an object");
        };
        assert_eq!(state["idp_id"], Dynamic::from("72058304855021999"));
        assert_eq!(state["idp_name"], Dynamic::from("Azure AD"));
    }

    #[test]
    fn zero_idp_id_is_null() {
        assert_eq!(idp_id_or_null("0"), Dynamic::Null);
        assert_eq!(idp_id_or_null(""), Dynamic::Null);
        assert_eq!(epoch_or_null("not a number"), Dynamic::Null);
    }
}
