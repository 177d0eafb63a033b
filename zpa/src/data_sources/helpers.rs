//! Shared flatten and diagnostic helpers for data sources

use serde::Serialize;
use std::collections::HashMap;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, ReadDataSourceResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::application::PortRange;
use crate::api::identity::IdpController;
use crate::api::{ApiError, IdName};
use crate::provider_data::ZpaProviderData;

pub fn computed_string(name: &str) -> Attribute {
    AttributeBuilder::string(name).computed().build()
}

pub fn computed_bool(name: &str) -> Attribute {
    AttributeBuilder::bool(name).computed().build()
}

/// `id` lookup input, filled from the API when looking up by name
pub fn id_attribute(what: &str) -> Attribute {
    AttributeBuilder::string("id")
        .description(&format!("The ID of the {}.", what))
        .optional()
        .computed()
        .build()
}

/// `name` lookup input, filled from the API when looking up by ID
pub fn name_attribute(what: &str) -> Attribute {
    AttributeBuilder::string("name")
        .description(&format!("The name of the {}.", what))
        .optional()
        .computed()
        .build()
}

pub fn microtenant_id_attribute() -> Attribute {
    AttributeBuilder::string("microtenant_id")
        .description("The microtenant to scope the lookup to.")
        .optional()
        .computed()
        .build()
}

/// Blank strings become null
pub fn string_or_null(value: &str) -> Dynamic {
    if value.trim().is_empty() {
        Dynamic::Null
    } else {
        Dynamic::String(value.to_string())
    }
}

/// Empty lists become null
pub fn string_list_or_null(values: &[String]) -> Dynamic {
    if values.is_empty() {
        Dynamic::Null
    } else {
        Dynamic::List(values.iter().cloned().map(Dynamic::String).collect())
    }
}

/// Like [`string_list_or_null`] with duplicates removed
pub fn string_set_or_null(values: &[String]) -> Dynamic {
    let mut unique: Vec<&String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    if unique.is_empty() {
        Dynamic::Null
    } else {
        Dynamic::List(unique.into_iter().cloned().map(Dynamic::String).collect())
    }
}

/// Each value rendered as JSON with a one-space indent. Empty maps become null.
pub fn map_interface_to_string_map(map: &HashMap<String, serde_json::Value>) -> Dynamic {
    if map.is_empty() {
        return Dynamic::Null;
    }
    Dynamic::Map(
        map.iter()
            .map(|(k, v)| (k.clone(), Dynamic::String(pretty_json(v))))
            .collect(),
    )
}

fn pretty_json(value: &serde_json::Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

/// One `{id = [...]}` object holding every group ID; empty block otherwise
pub fn flatten_server_groups(groups: &[IdName]) -> Dynamic {
    if groups.is_empty() {
        return Dynamic::List(vec![]);
    }
    let ids = groups
        .iter()
        .map(|group| Dynamic::String(group.id.clone()))
        .collect::<Vec<_>>();
    Dynamic::List(vec![Dynamic::object([("id", Dynamic::List(ids))])])
}

/// `{id, name}` objects
pub fn flatten_associated_profile_names_as_list(items: &[IdName]) -> Dynamic {
    Dynamic::List(
        items
            .iter()
            .map(|item| {
                Dynamic::object([
                    ("id", string_or_null(&item.id)),
                    ("name", string_or_null(&item.name)),
                ])
            })
            .collect(),
    )
}

/// `{from, to}` objects
pub fn flatten_port_ranges(ranges: &[PortRange]) -> Dynamic {
    Dynamic::List(
        ranges
            .iter()
            .map(|range| {
                Dynamic::object([
                    ("from", string_or_null(&range.from)),
                    ("to", string_or_null(&range.to)),
                ])
            })
            .collect(),
    )
}

/// Trimmed `id` and `name` from the data source config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identifier {
    pub id: String,
    pub name: String,
}

impl Identifier {
    /// Lookups go by ID when one is given, by name otherwise
    pub fn id(&self) -> Option<&str> {
        (!self.id.is_empty()).then_some(self.id.as_str())
    }
}

/// Trimmed string input; blank and null read as `None`
pub fn trimmed_string(config: &DynamicValue, name: &str) -> Option<String> {
    config
        .get_optional_string(&AttributePath::new(name))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn read_identifier(config: &DynamicValue) -> Result<Identifier, Diagnostic> {
    let id = trimmed_string(config, "id").unwrap_or_default();
    let name = trimmed_string(config, "name").unwrap_or_default();
    if id.is_empty() && name.is_empty() {
        return Err(Diagnostic::error(
            "Missing Identifier",
            "Either 'id' or 'name' must be provided.",
        ));
    }
    Ok(Identifier { id, name })
}

/// Trimmed `idp_id`/`idp_name` for objects that live under an identity provider
pub fn read_idp_identifier(config: &DynamicValue) -> Result<Identifier, Diagnostic> {
    let id = trimmed_string(config, "idp_id").unwrap_or_default();
    let name = trimmed_string(config, "idp_name").unwrap_or_default();
    if id.is_empty() && name.is_empty() {
        return Err(Diagnostic::error(
            "Missing Required Attribute",
            "Either 'idp_id' or 'idp_name' must be provided.",
        ));
    }
    Ok(Identifier { id, name })
}

/// Looks the identity provider up by ID, or by name when no ID is given
pub async fn resolve_idp(
    provider_data: &ZpaProviderData,
    idp_identifier: &Identifier,
) -> Result<IdpController, Diagnostic> {
    let api = provider_data.client.identity();
    match idp_identifier.id() {
        Some(id) => not_found_as_none(api.get_idp(id).await),
        None => api.get_idp_by_name(&idp_identifier.name).await,
    }
    .map_err(|e| client_error("identity provider", &e))?
    .ok_or_else(|| not_found("identity provider", idp_identifier))
}

pub fn micro_tenant(config: &DynamicValue) -> Option<String> {
    trimmed_string(config, "microtenant_id")
}

/// The data source's microtenant_id input when set, otherwise the API value
pub fn microtenant_state(requested: Option<&str>, from_api: &str) -> Dynamic {
    match requested {
        Some(id) => Dynamic::String(id.to_string()),
        None => string_or_null(from_api),
    }
}

/// Lookups by ID report a missing object as `None`, like lookups by name
pub fn not_found_as_none<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(item) => Ok(Some(item)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn unconfigured_provider() -> Diagnostic {
    Diagnostic::error(
        "Unconfigured Provider",
        "The provider must be configured before reading data sources.",
    )
}

pub fn client_error(what: &str, err: &ApiError) -> Diagnostic {
    Diagnostic::error("Client Error", format!("Unable to read {}: {}", what, err))
}

pub fn not_found(what: &str, identifier: &Identifier) -> Diagnostic {
    let mut thing = what.to_string();
    if let Some(first) = thing.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    Diagnostic::error(
        "Not Found",
        format!(
            "{} with id \"{}\" or name \"{}\" not found.",
            thing, identifier.id, identifier.name
        ),
    )
}

pub fn state_response(state: Dynamic) -> ReadDataSourceResponse {
    ReadDataSourceResponse {
        state: DynamicValue::new(state),
        diagnostics: vec![],
        deferred: None,
    }
}

/// Turns the outcome of an ID or name lookup into the read response
pub fn lookup_response<T>(
    result: Result<Option<T>, ApiError>,
    what: &str,
    identifier: &Identifier,
    flatten: impl FnOnce(&T) -> Dynamic,
) -> ReadDataSourceResponse {
    match result {
        Ok(Some(item)) => state_response(flatten(&item)),
        Ok(None) => ReadDataSourceResponse::error(not_found(what, identifier)),
        Err(e) => ReadDataSourceResponse::error(client_error(what, &e)),
    }
}

/// Extracts [`ZpaProviderData`] from the configure request. Missing provider
/// data is not an error: Terraform configures data sources before the
/// provider during validation.
pub fn configure_provider_data(
    type_name: &str,
    request: ConfigureDataSourceRequest,
) -> (Option<ZpaProviderData>, ConfigureDataSourceResponse) {
    let mut diagnostics = vec![];

    let provider_data = match request.provider_data {
        None => None,
        Some(data) => match data.downcast_ref::<ZpaProviderData>() {
            Some(provider_data) => Some(provider_data.clone()),
            None => {
                tracing::error!(
                    data_source = %type_name,
                    "Failed to downcast provider data to ZpaProviderData"
                );
                diagnostics.push(Diagnostic::error(
                    "Unexpected Data Source Configure Type",
                    "Expected ZpaProviderData. Please report this issue to the provider developers.",
                ));
                None
            }
        },
    };

    (provider_data, ConfigureDataSourceResponse { diagnostics })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::Arc;

    #[test]
    fn blank_strings_are_null() {
        assert_eq!(string_or_null("  "), Dynamic::Null);
        assert_eq!(string_or_null(""), Dynamic::Null);
        assert_eq!(string_or_null("x"), Dynamic::String("x".to_string()));
    }

    #[test]
    fn empty_collections_are_null() {
        assert_eq!(string_list_or_null(&[]), Dynamic::Null);
        assert_eq!(string_set_or_null(&[]), Dynamic::Null);

        let values = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(
            string_set_or_null(&values),
            Dynamic::List(vec![Dynamic::from("a"), Dynamic::from("b")])
        );
        assert_eq!(
            string_list_or_null(&values),
            Dynamic::List(vec![
                Dynamic::from("a"),
                Dynamic::from("b"),
                Dynamic::from("a")
            ])
        );
    }

    #[test]
    fn string_map_uses_one_space_indent() {
        assert_eq!(map_interface_to_string_map(&HashMap::new()), Dynamic::Null);

        let mut map = HashMap::new();
        map.insert("cert".to_string(), serde_json::json!({"id": "1"}));
        map.insert("plain".to_string(), serde_json::json!("value"));

        let Dynamic::Map(out) = map_interface_to_string_map(&map) else {
            panic!("expected a map");
        };
        assert_eq!(out["cert"], Dynamic::from("{\n \"id\": \"1\"\n}"));
        assert_eq!(out["plain"], Dynamic::from("\"value\""));
    }

    #[test]
    fn server_groups_collapse_into_one_block() {
        assert_eq!(flatten_server_groups(&[]), Dynamic::List(vec![]));

        let groups = vec![
            IdName {
                id: "1".to_string(),
                name: "a".to_string(),
            },
            IdName {
                id: "2".to_string(),
                name: "b".to_string(),
            },
        ];
        assert_eq!(
            flatten_server_groups(&groups),
            Dynamic::List(vec![Dynamic::object([(
                "id",
                Dynamic::List(vec![Dynamic::from("1"), Dynamic::from("2")])
            )])])
        );
    }

    #[test]
    fn profile_names_keep_nulls() {
        let items = vec![IdName {
            id: "7".to_string(),
            name: String::new(),
        }];
        assert_eq!(
            flatten_associated_profile_names_as_list(&items),
            Dynamic::List(vec![Dynamic::object([
                ("id", Dynamic::from("7")),
                ("name", Dynamic::Null)
            ])])
        );
    }

    #[test]
    fn identifier_requires_id_or_name() {
        let config = DynamicValue::new(Dynamic::object([
            ("id", Dynamic::from("  ")),
            ("name", Dynamic::Null),
        ]));
        let diag = read_identifier(&config).unwrap_err();
        assert_eq!(diag.summary, "Missing Identifier");
        assert_eq!(diag.detail, "Either 'id' or 'name' must be provided.");

        let config = DynamicValue::new(Dynamic::object([("name", Dynamic::from(" web "))]));
        let identifier = read_identifier(&config).unwrap();
        assert_eq!(identifier.name, "web");
        assert_eq!(identifier.id(), None);
    }

    #[test]
    fn microtenant_input_wins() {
        assert_eq!(microtenant_state(Some("9"), "1"), Dynamic::from("9"));
        assert_eq!(microtenant_state(None, "1"), Dynamic::from("1"));
        assert_eq!(microtenant_state(None, ""), Dynamic::Null);
    }

    #[test]
    fn not_found_message() {
        let identifier = Identifier {
            id: String::new(),
            name: "web".to_string(),
        };
        let diag = not_found("segment group", &identifier);
        assert_eq!(diag.summary, "Not Found");
        assert_eq!(
            diag.detail,
            "Segment group with id \"\" or name \"web\" not found."
        );
    }

    #[test]
    fn not_found_errors_become_none() {
        let result: Result<u8, ApiError> = Err(ApiError::NotFound("/x".to_string()));
        assert!(not_found_as_none(result).unwrap().is_none());

        let result: Result<u8, ApiError> = Err(ApiError::RateLimited);
        assert!(not_found_as_none(result).is_err());
    }

    #[test]
    fn configure_rejects_foreign_provider_data() {
        let data: Arc<dyn Any + Send + Sync> = Arc::new(42_u32);
        let (provider_data, response) = configure_provider_data(
            "zpa_segment_group",
            ConfigureDataSourceRequest {
                provider_data: Some(data),
            },
        );
        assert!(provider_data.is_none());
        assert_eq!(
            response.diagnostics[0].summary,
            "Unexpected Data Source Configure Type"
        );

        let (provider_data, response) = configure_provider_data(
            "zpa_segment_group",
            ConfigureDataSourceRequest {
                provider_data: None,
            },
        );
        assert!(provider_data.is_none());
        assert!(response.diagnostics.is_empty());
    }
}
