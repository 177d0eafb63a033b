//! Common types and utilities for the ZPA API

use serde::{Deserialize, Deserializer};

/// Largest page size the management API accepts
pub const DEFAULT_PAGE_SIZE: u32 = 500;

pub const MGMT_CONFIG_V1: &str = "/mgmtconfig/v1/admin/customers";
pub const MGMT_CONFIG_V2: &str = "/mgmtconfig/v2/admin/customers";
pub const USER_CONFIG_V1: &str = "/userconfig/v1/customers";

/// `/mgmtconfig/v1/admin/customers/{customer_id}`
pub fn mgmt_config_v1(customer_id: &str) -> String {
    format!("{}/{}", MGMT_CONFIG_V1, customer_id)
}

/// `/mgmtconfig/v2/admin/customers/{customer_id}`
pub fn mgmt_config_v2(customer_id: &str) -> String {
    format!("{}/{}", MGMT_CONFIG_V2, customer_id)
}

/// `/userconfig/v1/customers/{customer_id}`
pub fn user_config_v1(customer_id: &str) -> String {
    format!("{}/{}", USER_CONFIG_V1, customer_id)
}

/// Error body returned by the ZPA API, e.g.
/// `{"id": "resource.not.found", "reason": "..."}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: id={id:?}, reason={reason:?}")]
pub struct ApiErrorDetails {
    pub id: Option<String>,
    pub reason: Option<String>,
}

/// One page of a paginated listing
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListPage<T> {
    #[serde(rename = "totalPages", default, deserialize_with = "string_or_u32")]
    pub total_pages: u32,
    #[serde(default = "Vec::new", deserialize_with = "null_default")]
    pub list: Vec<T>,
}

/// `{id, name}` reference to another object
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdName {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
}

/// Objects that can be looked up by name in a listing
pub trait Named {
    fn name(&self) -> &str;
}

/// Case-insensitive exact name match, Unicode aware
pub fn find_named<T: Named>(items: Vec<T>, name: &str) -> Option<T> {
    let wanted = name.to_lowercase();
    items
        .into_iter()
        .find(|item| item.name().to_lowercase() == wanted)
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginationParams {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
        }
    }
}

impl PaginationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        let search = search.trim();
        self.search = (!search.is_empty()).then(|| search.to_string());
        self
    }

    pub fn to_query_params(&self) -> ApiQueryParams {
        ApiQueryParams::new()
            .add("page", self.page)
            .add("pagesize", self.page_size)
            .add_optional("search", self.search.as_deref())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Accepts `true`, `"true"`, `1` and null (false)
pub fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Loose::Bool(b)) => Ok(b),
        Some(Loose::Int(i)) => Ok(i != 0),
        Some(Loose::Float(f)) => Ok(f != 0.0),
        Some(Loose::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got {:?}",
                other
            ))),
        },
    }
}

/// Accepts strings, numbers and booleans as their string form; null becomes ""
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => String::new(),
        Some(Loose::Bool(b)) => b.to_string(),
        Some(Loose::Int(i)) => i.to_string(),
        Some(Loose::Float(f)) => f.to_string(),
        Some(Loose::String(s)) => s,
    })
}

/// Accepts a string or a list of strings; lists are joined with ", "
pub fn string_or_joined_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<String>),
        One(Loose),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => String::new(),
        Some(OneOrMany::Many(items)) => items.join(", "),
        Some(OneOrMany::One(Loose::String(s))) => s,
        Some(OneOrMany::One(Loose::Bool(b))) => b.to_string(),
        Some(OneOrMany::One(Loose::Int(i))) => i.to_string(),
        Some(OneOrMany::One(Loose::Float(f))) => f.to_string(),
    })
}

/// Page counts arrive as `"3"` or `3`
pub fn string_or_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Loose::Int(i)) => u32::try_from(i).map_err(serde::de::Error::custom),
        Some(Loose::Float(f)) if f >= 0.0 => Ok(f as u32),
        Some(Loose::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Loose::String(s)) => s.trim().parse::<u32>().map_err(serde::de::Error::custom),
        Some(_) => Err(serde::de::Error::custom("expected a page count")),
    }
}

/// Treats an explicit null like a missing field
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
