//! Schema types and builders for tfplug
//!
//! This module provides the schema system for defining provider and data
//! source schemas, including attribute types, nested blocks, config
//! validation and state conformance.

use crate::types::{AttributePath, Diagnostic, Dynamic};
use std::collections::{BTreeMap, HashMap};

/// AttributeType defines the type system for Terraform attributes
/// This must match Terraform's type system exactly
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    pub fn list_of(elem: AttributeType) -> Self {
        AttributeType::List(Box::new(elem))
    }

    pub fn set_of(elem: AttributeType) -> Self {
        AttributeType::Set(Box::new(elem))
    }

    pub fn map_of(elem: AttributeType) -> Self {
        AttributeType::Map(Box::new(elem))
    }

    /// Terraform type constraint in its JSON wire form,
    /// e.g. `"string"` or `["list","string"]`
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};
        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(elem) => json!(["list", elem.to_json()]),
            AttributeType::Set(elem) => json!(["set", elem.to_json()]),
            AttributeType::Map(elem) => json!(["map", elem.to_json()]),
            AttributeType::Object(attrs) => {
                let fields: serde_json::Map<String, Value> = attrs
                    .iter()
                    .collect::<BTreeMap<_, _>>()
                    .into_iter()
                    .map(|(name, ty)| (name.clone(), ty.to_json()))
                    .collect();
                json!(["object", fields])
            }
        }
    }

    pub fn to_json_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Checks a configured value against this type; null and unknown
    /// values always pass
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (value, self) {
            (Dynamic::Null, _) | (Dynamic::Unknown, _) => true,
            (Dynamic::String(_), AttributeType::String) => true,
            (Dynamic::Number(_), AttributeType::Number) => true,
            (Dynamic::Bool(_), AttributeType::Bool) => true,
            (Dynamic::List(list), AttributeType::List(elem))
            | (Dynamic::List(list), AttributeType::Set(elem)) => {
                list.iter().all(|item| elem.accepts(item))
            }
            (Dynamic::Map(map), AttributeType::Map(elem)) => {
                map.values().all(|item| elem.accepts(item))
            }
            (Dynamic::Map(map), AttributeType::Object(attrs)) => attrs
                .iter()
                .all(|(name, ty)| map.get(name).map(|v| ty.accepts(v)).unwrap_or(true)),
            _ => false,
        }
    }
}

/// Schema is returned by providers and data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64, // Increment when schema changes require migration
    pub block: Block, // Root block containing all attributes
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub description_kind: StringKind,
    pub deprecated: bool,
}

impl Block {
    fn empty() -> Self {
        Self {
            version: 0,
            attributes: Vec::new(),
            block_types: Vec::new(),
            description: String::new(),
            description_kind: StringKind::Plain,
            deprecated: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    /// Returns an object that has exactly the shape Terraform expects for
    /// this block: every attribute present (absent ones become null),
    /// every list/set block present as a list, single blocks as an object
    /// or null. Keys not in the schema are dropped.
    pub fn conform(&self, value: &Dynamic) -> Dynamic {
        let empty = HashMap::new();
        let source = match value {
            Dynamic::Map(map) => map,
            _ => &empty,
        };

        let mut out = HashMap::with_capacity(self.attributes.len() + self.block_types.len());

        for attr in &self.attributes {
            let v = source.get(&attr.name).cloned().unwrap_or(Dynamic::Null);
            out.insert(attr.name.clone(), v);
        }

        for nested in &self.block_types {
            let v = source.get(&nested.type_name).unwrap_or(&Dynamic::Null);
            out.insert(nested.type_name.clone(), nested.conform(v));
        }

        Dynamic::Map(out)
    }

    /// Validates a configuration object against the block: unknown
    /// attribute names, missing required attributes and type mismatches
    pub fn validate(&self, config: &Dynamic, path: &AttributePath) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let map = match config {
            Dynamic::Map(map) => map,
            Dynamic::Null | Dynamic::Unknown => return diagnostics,
            other => {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid configuration block",
                        format!("Expected an object but got {}", other.type_name()),
                    )
                    .with_attribute(path.clone()),
                );
                return diagnostics;
            }
        };

        for attr in &self.attributes {
            let value = map.get(&attr.name).unwrap_or(&Dynamic::Null);
            let attr_path = path.clone().attribute(&attr.name);

            if attr.required && value.is_null() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Missing required argument: {}", attr.name),
                        format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                    )
                    .with_attribute(attr_path.clone()),
                );
            }

            if attr.computed && !attr.optional && !attr.required && !value.is_null() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Value for unconfigurable attribute: {}", attr.name),
                        format!("Can't configure a value for \"{}\": its value will be decided automatically.", attr.name),
                    )
                    .with_attribute(attr_path.clone()),
                );
            }

            if !attr.r#type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Incorrect attribute value type: {}", attr.name),
                        format!(
                            "Attribute \"{}\" expects {} but got {}",
                            attr.name,
                            attr.r#type.to_json(),
                            value.type_name()
                        ),
                    )
                    .with_attribute(attr_path),
                );
            }
        }

        for key in map.keys() {
            if self.attribute(key).is_none() && self.nested_block(key).is_none() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Unsupported argument: {}", key),
                        format!("An argument named \"{}\" is not expected here.", key),
                    )
                    .with_attribute(path.clone().attribute(key)),
                );
            }
        }

        for nested in &self.block_types {
            let nested_path = path.clone().attribute(&nested.type_name);
            match map.get(&nested.type_name) {
                Some(Dynamic::List(items)) => {
                    for (idx, item) in items.iter().enumerate() {
                        diagnostics.extend(
                            nested
                                .block
                                .validate(item, &nested_path.clone().index(idx as i64)),
                        );
                    }
                }
                Some(item @ Dynamic::Map(_)) => {
                    diagnostics.extend(nested.block.validate(item, &nested_path));
                }
                _ => {}
            }
        }

        diagnostics
    }
}

/// Attribute represents a single configuration attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub deprecated: bool,
}

/// NestedBlock represents a nested configuration block
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
}

impl NestedBlock {
    fn conform(&self, value: &Dynamic) -> Dynamic {
        match self.nesting {
            NestingMode::List | NestingMode::Set => match value {
                Dynamic::List(items) => {
                    Dynamic::List(items.iter().map(|item| self.block.conform(item)).collect())
                }
                _ => Dynamic::List(Vec::new()),
            },
            NestingMode::Map => match value {
                Dynamic::Map(items) => Dynamic::Map(
                    items
                        .iter()
                        .map(|(k, v)| (k.clone(), self.block.conform(v)))
                        .collect(),
                ),
                _ => Dynamic::Map(HashMap::new()),
            },
            NestingMode::Group => self.block.conform(value),
            NestingMode::Single | NestingMode::Invalid => match value {
                Dynamic::Map(_) => self.block.conform(value),
                _ => Dynamic::Null,
            },
        }
    }
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Invalid,
    Single,
    List,
    Set,
    Map,
    Group,
}

/// StringKind represents the format of string values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringKind {
    Plain,
    Markdown,
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    /// Create a new attribute builder
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                deprecated: false,
            },
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, AttributeType::Number)
    }

    /// Set description
    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    /// Mark as computed
    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    /// Mark as deprecated
    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    /// Finalize the attribute
    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// NestedBlockBuilder builds computed nested blocks for data source state
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str, nesting: NestingMode) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: Block::empty(),
                nesting,
                min_items: 0,
                max_items: 0,
            },
        }
    }

    pub fn list(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::List)
    }

    pub fn set(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::Set)
    }

    pub fn single(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::Single)
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.nested.block.block_types.push(block);
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

/// SchemaBuilder provides fluent API for building schemas
/// ALWAYS use this for consistency
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::empty(),
            },
        }
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    /// Add attribute
    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    /// Add nested block
    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    /// Set description
    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    /// Set description kind
    pub fn description_kind(mut self, kind: StringKind) -> Self {
        self.schema.block.description_kind = kind;
        self
    }

    /// Mark as deprecated
    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    /// Finalize the schema
    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn segment_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(AttributeBuilder::string("id").optional().computed().build())
            .attribute(AttributeBuilder::string("name").optional().computed().build())
            .attribute(AttributeBuilder::bool("enabled").computed().build())
            .block(
                NestedBlockBuilder::set("tcp_port_range")
                    .attribute(AttributeBuilder::string("from").computed().build())
                    .attribute(AttributeBuilder::string("to").computed().build())
                    .build(),
            )
            .build()
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the segment")
            .required()
            .build();

        assert_eq!(attr.name, "name");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.description, "The name of the segment");
    }

    #[test]
    fn schema_builder_creates_schema_with_attributes() {
        let schema = SchemaBuilder::new()
            .version(1)
            .description("Test data source schema")
            .attribute(AttributeBuilder::string("id").computed().build())
            .attribute(AttributeBuilder::string("name").required().build())
            .build();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.block.attributes.len(), 2);
        assert_eq!(schema.block.description, "Test data source schema");
    }

    #[test]
    fn type_json_matches_terraform_wire_format() {
        assert_eq!(AttributeType::String.to_json_bytes(), b"\"string\"".to_vec());
        assert_eq!(
            AttributeType::list_of(AttributeType::String).to_json().to_string(),
            r#"["list","string"]"#
        );
        assert_eq!(
            AttributeType::map_of(AttributeType::String).to_json().to_string(),
            r#"["map","string"]"#
        );

        let object = AttributeType::Object(HashMap::from([
            ("to".to_string(), AttributeType::String),
            ("from".to_string(), AttributeType::String),
        ]));
        assert_eq!(
            object.to_json().to_string(),
            r#"["object",{"from":"string","to":"string"}]"#
        );
    }

    #[test]
    fn conform_fills_missing_attributes_and_blocks() {
        let schema = segment_schema();
        let state = Dynamic::object([("id", Dynamic::from("123"))]);

        let conformed = schema.block.conform(&state);
        let Dynamic::Map(map) = conformed else {
            panic!("expected object");
        };

        assert_eq!(map.get("id"), Some(&Dynamic::from("123")));
        assert_eq!(map.get("name"), Some(&Dynamic::Null));
        assert_eq!(map.get("enabled"), Some(&Dynamic::Null));
        assert_eq!(map.get("tcp_port_range"), Some(&Dynamic::List(vec![])));
    }

    #[test]
    fn conform_recurses_into_nested_blocks_and_drops_extra_keys() {
        let schema = segment_schema();
        let state = Dynamic::object([
            ("extra", Dynamic::from("dropped")),
            (
                "tcp_port_range",
                Dynamic::List(vec![Dynamic::object([("from", Dynamic::from("80"))])]),
            ),
        ]);

        let Dynamic::Map(map) = schema.block.conform(&state) else {
            panic!("expected object");
        };
        assert!(!map.contains_key("extra"));

        let Some(Dynamic::List(ranges)) = map.get("tcp_port_range") else {
            panic!("expected list");
        };
        assert_eq!(
            ranges[0],
            Dynamic::object([("from", Dynamic::from("80")), ("to", Dynamic::Null)])
        );
    }

    #[test]
    fn validate_reports_unknown_and_mistyped_arguments() {
        let schema = segment_schema();
        let config = Dynamic::object([
            ("name", Dynamic::Bool(true)),
            ("bogus", Dynamic::from("x")),
        ]);

        let diags = schema.block.validate(&config, &AttributePath::root());
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().any(|d| d.summary.contains("bogus")));
        assert!(diags.iter().any(|d| d.summary.contains("name")));
    }

    #[test]
    fn validate_rejects_values_for_computed_only_attributes() {
        let schema = segment_schema();
        let config = Dynamic::object([("enabled", Dynamic::Bool(true))]);

        let diags = schema.block.validate(&config, &AttributePath::root());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("unconfigurable"));
    }

    #[test]
    fn validate_accepts_unknown_values() {
        let schema = SchemaBuilder::new()
            .attribute(AttributeBuilder::string("id").required().build())
            .build();
        let config = Dynamic::object([("id", Dynamic::Unknown)]);

        assert!(schema
            .block
            .validate(&config, &AttributePath::root())
            .is_empty());
    }
}
