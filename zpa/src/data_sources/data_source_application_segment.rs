//! Application segment data source implementation

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
    computed_bool, computed_string, configure_provider_data, flatten_port_ranges,
    flatten_server_groups, id_attribute, lookup_response, micro_tenant, microtenant_id_attribute,
    microtenant_state, name_attribute, not_found_as_none, read_identifier, string_list_or_null,
    string_or_null, unconfigured_provider,
};
use crate::api::application::ApplicationSegment;
use crate::ZpaProviderData;

const SEGMENT_STRINGS: &[&str] = &[
    "segment_group_id",
    "segment_group_name",
    "bypass_type",
    "config_space",
    "creation_time",
    "default_idle_timeout",
    "default_max_age",
    "description",
    "health_check_type",
    "health_reporting",
    "modified_by",
    "modified_time",
    "match_style",
    "microtenant_name",
];

const SEGMENT_BOOLS: &[&str] = &[
    "double_encrypt",
    "enabled",
    "select_connector_close_to_app",
    "use_in_dr_mode",
    "is_incomplete_dr_config",
    "ip_anchored",
    "is_cname_enabled",
    "passive_health_enabled",
    "api_protection_enabled",
];

#[derive(Default)]
pub struct ApplicationSegmentDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl ApplicationSegmentDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn port_range_block(type_name: &str) -> NestedBlock {
    NestedBlockBuilder::set(type_name)
        .attribute(computed_string("from"))
        .attribute(computed_string("to"))
        .build()
}

fn string_list(name: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::list_of(AttributeType::String))
        .computed()
        .build()
}

fn flatten(segment: &ApplicationSegment, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(segment.id.clone())),
        ("name", string_or_null(&segment.name)),
        ("segment_group_id", string_or_null(&segment.segment_group_id)),
        ("segment_group_name", string_or_null(&segment.segment_group_name)),
        ("bypass_type", string_or_null(&segment.bypass_type)),
        ("config_space", string_or_null(&segment.config_space)),
        ("creation_time", string_or_null(&segment.creation_time)),
        ("default_idle_timeout", string_or_null(&segment.default_idle_timeout)),
        ("default_max_age", string_or_null(&segment.default_max_age)),
        ("description", string_or_null(&segment.description)),
        ("domain_names", string_list_or_null(&segment.domain_names)),
        ("double_encrypt", Dynamic::Bool(segment.double_encrypt)),
        ("enabled", Dynamic::Bool(segment.enabled)),
        ("health_check_type", string_or_null(&segment.health_check_type)),
        ("health_reporting", string_or_null(&segment.health_reporting)),
        (
            "select_connector_close_to_app",
            Dynamic::Bool(segment.select_connector_close_to_app),
        ),
        ("use_in_dr_mode", Dynamic::Bool(segment.use_in_dr_mode)),
        ("is_incomplete_dr_config", Dynamic::Bool(segment.is_incomplete_dr_config)),
        ("ip_anchored", Dynamic::Bool(segment.ip_anchored)),
        ("is_cname_enabled", Dynamic::Bool(segment.is_cname_enabled)),
        ("modified_by", string_or_null(&segment.modified_by)),
        ("modified_time", string_or_null(&segment.modified_time)),
        ("passive_health_enabled", Dynamic::Bool(segment.passive_health_enabled)),
        ("api_protection_enabled", Dynamic::Bool(segment.api_protection_enabled)),
        ("match_style", string_or_null(&segment.match_style)),
        ("microtenant_id", microtenant_state(microtenant_id, &segment.microtenant_id)),
        ("microtenant_name", string_or_null(&segment.microtenant_name)),
        ("tcp_port_ranges", string_list_or_null(&segment.tcp_port_ranges)),
        ("udp_port_ranges", string_list_or_null(&segment.udp_port_ranges)),
        ("tcp_port_range", flatten_port_ranges(&segment.tcp_port_range)),
        ("udp_port_range", flatten_port_ranges(&segment.udp_port_range)),
        ("server_groups", flatten_server_groups(&segment.server_groups)),
    ])
}

#[async_trait]
impl DataSource for ApplicationSegmentDataSource {
    fn type_name(&self) -> &str {
        "zpa_application_segment"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let server_groups = NestedBlockBuilder::set("server_groups")
            .attribute(string_list("id"))
            .build();

        let builder = SchemaBuilder::new()
            .version(0)
            .description("Retrieves an application segment by ID or name.")
            .attribute(id_attribute("application segment"))
            .attribute(name_attribute("application segment"))
            .attribute(microtenant_id_attribute())
            .attribute(string_list("domain_names"))
            .attribute(string_list("tcp_port_ranges"))
            .attribute(string_list("udp_port_ranges"));
        let builder = SEGMENT_STRINGS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_string(name)));
        let schema = SEGMENT_BOOLS
            .iter()
            .fold(builder, |builder, name| builder.attribute(computed_bool(name)))
            .block(port_range_block("tcp_port_range"))
            .block(port_range_block("udp_port_range"))
            .block(server_groups)
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
        let api = client.applications();

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading application segment");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_segment(id).await),
            None => api.get_segment_by_name(&identifier.name).await,
        };

        lookup_response(result, "application segment", &identifier, |segment| {
            flatten(segment, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for ApplicationSegmentDataSource {
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
    use crate::api::application::PortRange;

    #[test]
    fn port_ranges_flatten_both_forms() {
        let segment: ApplicationSegment = serde_json::from_str(
            r#"{
                "id": "1",
                "name": "crm",
                "tcpPortRanges": ["443", "443"],
                "tcpPortRange": [{"from": "443", "to": "443"}],
                "domainNames": [],
                "serverGroups": [{"id": "9", "name": "sg"}]
            }"#,
        )
        .unwrap();

        let Dynamic::Map(state) = flatten(&segment, None) else {
            panic!("expected an object");
        };
        assert_eq!(
            state["tcp_port_ranges"],
            Dynamic::List(vec![Dynamic::from("443"), Dynamic::from("443")])
        );
        assert_eq!(state["udp_port_ranges"], Dynamic::Null);
        assert_eq!(state["domain_names"], Dynamic::Null);
        assert_eq!(
            state["tcp_port_range"],
            flatten_port_ranges(&[PortRange {
                from: "443".to_string(),
                to: "443".to_string()
            }])
        );
        assert_eq!(state["udp_port_range"], Dynamic::List(vec![]));
        assert_eq!(
            state["server_groups"],
            Dynamic::List(vec![Dynamic::object([(
                "id",
                Dynamic::List(vec![Dynamic::from("9")])
            )])])
        );
    }
}
