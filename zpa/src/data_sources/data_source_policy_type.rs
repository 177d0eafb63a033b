//! Policy set data source, looked up by policy type

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, NestedBlock, NestedBlockBuilder, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use super::helpers::{
    client_error, computed_bool, computed_string, configure_provider_data, micro_tenant,
    microtenant_id_attribute, microtenant_state, not_found_as_none, state_response,
    string_or_null, trimmed_string, unconfigured_provider,
};
use crate::api::policy::{
    PolicyCondition, PolicyOperand, PolicyRule, PolicySet, DEFAULT_POLICY_TYPE, POLICY_TYPES,
};
use crate::ZpaProviderData;

const RULE_STRINGS: &[&str] = &[
    "id",
    "name",
    "description",
    "action",
    "action_id",
    "creation_time",
    "custom_msg",
    "modified_by",
    "modified_time",
    "operator",
    "policy_set_id",
    "policy_type",
    "priority",
    "reauth_idle_timeout",
    "reauth_timeout",
    "rule_order",
    "zpn_cbi_profile_id",
    "zpn_isolation_profile_id",
    "zpn_inspection_profile_id",
    "microtenant_id",
    "microtenant_name",
];

const CONDITION_STRINGS: &[&str] = &[
    "creation_time",
    "id",
    "modified_by",
    "modified_time",
    "operator",
    "microtenant_id",
];

const OPERAND_STRINGS: &[&str] = &[
    "creation_time",
    "id",
    "idp_id",
    "lhs",
    "modified_by",
    "modified_time",
    "name",
    "object_type",
    "rhs",
    "microtenant_id",
];

#[derive(Default)]
pub struct PolicyTypeDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl PolicyTypeDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn computed_strings(builder: NestedBlockBuilder, names: &[&str]) -> NestedBlockBuilder {
    names
        .iter()
        .fold(builder, |builder, name| builder.attribute(computed_string(name)))
}

fn rules_block() -> NestedBlock {
    let operands = computed_strings(NestedBlockBuilder::list("operands"), OPERAND_STRINGS).build();
    let conditions = computed_strings(NestedBlockBuilder::list("conditions"), CONDITION_STRINGS)
        .block(operands)
        .build();
    computed_strings(NestedBlockBuilder::list("rules"), RULE_STRINGS)
        .attribute(computed_bool("bypass_default_rule"))
        .attribute(computed_bool("reauth_default_rule"))
        .block(conditions)
        .build()
}

/// The requested policy type, GLOBAL_POLICY when unset
fn requested_policy_type(config: &DynamicValue) -> String {
    trimmed_string(config, "policy_type").unwrap_or_else(|| DEFAULT_POLICY_TYPE.to_string())
}

fn flatten_operand(operand: &PolicyOperand) -> Dynamic {
    Dynamic::object([
        ("creation_time", string_or_null(&operand.creation_time)),
        ("id", string_or_null(&operand.id)),
        ("idp_id", string_or_null(&operand.idp_id)),
        ("lhs", string_or_null(&operand.lhs)),
        ("modified_by", string_or_null(&operand.modified_by)),
        ("modified_time", string_or_null(&operand.modified_time)),
        ("name", string_or_null(&operand.name)),
        ("object_type", string_or_null(&operand.object_type)),
        ("rhs", string_or_null(&operand.rhs)),
        ("microtenant_id", string_or_null(&operand.microtenant_id)),
    ])
}

fn flatten_condition(condition: &PolicyCondition) -> Dynamic {
    Dynamic::object([
        ("creation_time", string_or_null(&condition.creation_time)),
        ("id", string_or_null(&condition.id)),
        ("modified_by", string_or_null(&condition.modified_by)),
        ("modified_time", string_or_null(&condition.modified_time)),
        ("operator", string_or_null(&condition.operator)),
        ("microtenant_id", string_or_null(&condition.microtenant_id)),
        (
            "operands",
            Dynamic::List(condition.operands.iter().map(flatten_operand).collect()),
        ),
    ])
}

fn flatten_rule(rule: &PolicyRule) -> Dynamic {
    Dynamic::object([
        ("id", string_or_null(&rule.id)),
        ("name", string_or_null(&rule.name)),
        ("description", string_or_null(&rule.description)),
        ("action", string_or_null(&rule.action)),
        ("action_id", string_or_null(&rule.action_id)),
        ("bypass_default_rule", Dynamic::Bool(rule.bypass_default_rule)),
        ("creation_time", string_or_null(&rule.creation_time)),
        ("custom_msg", string_or_null(&rule.custom_msg)),
        ("modified_by", string_or_null(&rule.modified_by)),
        ("modified_time", string_or_null(&rule.modified_time)),
        ("operator", string_or_null(&rule.operator)),
        ("policy_set_id", string_or_null(&rule.policy_set_id)),
        ("policy_type", string_or_null(&rule.policy_type)),
        ("priority", string_or_null(&rule.priority)),
        ("reauth_default_rule", Dynamic::Bool(rule.reauth_default_rule)),
        ("reauth_idle_timeout", string_or_null(&rule.reauth_idle_timeout)),
        ("reauth_timeout", string_or_null(&rule.reauth_timeout)),
        ("rule_order", string_or_null(&rule.rule_order)),
        ("zpn_cbi_profile_id", string_or_null(&rule.zpn_cbi_profile_id)),
        ("zpn_isolation_profile_id", string_or_null(&rule.zpn_isolation_profile_id)),
        ("zpn_inspection_profile_id", string_or_null(&rule.zpn_inspection_profile_id)),
        ("microtenant_id", string_or_null(&rule.microtenant_id)),
        ("microtenant_name", string_or_null(&rule.microtenant_name)),
        (
            "conditions",
            Dynamic::List(rule.conditions.iter().map(flatten_condition).collect()),
        ),
    ])
}

fn flatten(policy_set: &PolicySet, policy_type: &str, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(policy_set.id.clone())),
        ("policy_type", Dynamic::String(policy_type.to_string())),
        ("name", string_or_null(&policy_set.name)),
        ("description", string_or_null(&policy_set.description)),
        ("enabled", Dynamic::Bool(policy_set.enabled)),
        ("creation_time", string_or_null(&policy_set.creation_time)),
        ("modified_by", string_or_null(&policy_set.modified_by)),
        ("modified_time", string_or_null(&policy_set.modified_time)),
        ("sorted", Dynamic::Bool(policy_set.sorted)),
        (
            "microtenant_id",
            microtenant_state(microtenant_id, &policy_set.microtenant_id),
        ),
        ("microtenant_name", string_or_null(&policy_set.microtenant_name)),
        (
            "rules",
            Dynamic::List(policy_set.rules.iter().map(flatten_rule).collect()),
        ),
    ])
}

#[async_trait]
impl DataSource for PolicyTypeDataSource {
    fn type_name(&self) -> &str {
        "zpa_policy_type"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA policy set by policy type.")
            .attribute(
                AttributeBuilder::string("policy_type")
                    .description(&format!(
                        "Policy type to retrieve, one of {}. Defaults to {}.",
                        POLICY_TYPES.join(", "),
                        DEFAULT_POLICY_TYPE
                    ))
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(microtenant_id_attribute())
            .attribute(computed_string("id"))
            .attribute(computed_string("name"))
            .attribute(computed_string("description"))
            .attribute(computed_bool("enabled"))
            .attribute(computed_string("creation_time"))
            .attribute(computed_string("modified_by"))
            .attribute(computed_string("modified_time"))
            .attribute(computed_bool("sorted"))
            .attribute(computed_string("microtenant_name"))
            .block(rules_block())
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = vec![];

        if let Some(policy_type) = trimmed_string(&request.config, "policy_type") {
            if !POLICY_TYPES.contains(&policy_type.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value",
                        format!(
                            "policy_type must be one of {}, got: {}",
                            POLICY_TYPES.join(", "),
                            policy_type
                        ),
                    )
                    .with_attribute(AttributePath::new("policy_type")),
                );
            }
        }

        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(provider_data) = &self.provider_data else {
            return ReadDataSourceResponse::error(unconfigured_provider());
        };

        let policy_type = requested_policy_type(&request.config);
        let microtenant_id = micro_tenant(&request.config);
        let client = provider_data.scoped_client(microtenant_id.as_deref());

        tracing::debug!(policy_type = %policy_type, "Retrieving policy set by type");

        let what = format!("policy type \"{}\"", policy_type);
        match not_found_as_none(client.policy().get_policy_set_by_type(&policy_type).await) {
            Ok(Some(policy_set)) => state_response(flatten(
                &policy_set,
                &policy_type,
                microtenant_id.as_deref(),
            )),
            Ok(None) => ReadDataSourceResponse::error(Diagnostic::error(
                "Not Found",
                format!("Policy type \"{}\" not found.", policy_type),
            )),
            Err(e) => ReadDataSourceResponse::error(client_error(&what, &e)),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for PolicyTypeDataSource {
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
    fn policy_type_defaults_to_global() {
        let config = DynamicValue::new(Dynamic::object([("policy_type", Dynamic::Null)]));
        assert_eq!(requested_policy_type(&config), "GLOBAL_POLICY");

        let config = DynamicValue::new(Dynamic::object([(
            "policy_type",
            Dynamic::from(" TIMEOUT_POLICY "),
        )]));
        assert_eq!(requested_policy_type(&config), "TIMEOUT_POLICY");
    }

    #[tokio::test]
    async fn unknown_policy_type_is_rejected() {
        let ds = PolicyTypeDataSource::new();
        let response = ds
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: "zpa_policy_type".to_string(),
                    config: DynamicValue::new(Dynamic::object([(
                        "policy_type",
                        Dynamic::from("NOT_A_POLICY"),
                    )])),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Invalid Attribute Value");
    }

    #[test]
    fn nested_rules_flatten() {
        let policy_set: PolicySet = serde_json::from_str(
            r#"{
                "id": "216196257331281920",
                "name": "Global_Policy",
                "policyType": "1",
                "rules": [{
                    "id": "1",
                    "name": "rule",
                    "conditions": [{
                        "id": "2",
                        "operator": "OR",
                        "operands": [{"id": "3", "objectType": "APP", "lhs": "id", "rhs": "9"}]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let Dynamic::Map(state) = flatten(&policy_set, "GLOBAL_POLICY", None) else {
            panic!("expected an object");
        };
        assert_eq!(state["policy_type"], Dynamic::from("GLOBAL_POLICY"));
        let Dynamic::List(rules) = &state["rules"] else {
            panic!("expected rules");
        };
        let Dynamic::Map(rule) = &rules[0] else {
            panic!("expected a rule object");
        };
        let Dynamic::List(conditions) = &rule["conditions"] else {
            panic!("expected conditions");
        };
        let Dynamic::Map(condition) = &conditions[0] else {
            panic!("expected a condition object");
        };
        assert_eq!(condition["operator"], Dynamic::from("OR"));
        let Dynamic::List(operands) = &condition["operands"] else {
            panic!("expected operands");
        };
        assert_eq!(
            operands[0],
            flatten_operand(&PolicyOperand {
                id: "3".to_string(),
                object_type: "APP".to_string(),
                lhs: "id".to_string(),
                rhs: "9".to_string(),
                ..Default::default()
            })
        );
    }
}
