//! Machine group data source implementation

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
    map_interface_to_string_map, micro_tenant, microtenant_id_attribute, microtenant_state,
    name_attribute, not_found_as_none, read_identifier, string_or_null, unconfigured_provider,
};
use crate::api::policy::{Machine, MachineGroup};
use crate::ZpaProviderData;

const MACHINE_STRINGS: &[&str] = &[
    "id",
    "name",
    "creation_time",
    "description",
    "fingerprint",
    "issued_cert_id",
    "machine_group_id",
    "machine_group_name",
    "machine_token_id",
    "modified_by",
    "modified_time",
    "microtenant_id",
    "microtenant_name",
];

#[derive(Default)]
pub struct MachineGroupDataSource {
    provider_data: Option<ZpaProviderData>,
}

impl MachineGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn machines_block() -> NestedBlock {
    MACHINE_STRINGS
        .iter()
        .fold(NestedBlockBuilder::list("machines"), |block, name| {
            block.attribute(computed_string(name))
        })
        .attribute(
            AttributeBuilder::new("signing_cert", AttributeType::map_of(AttributeType::String))
                .computed()
                .build(),
        )
        .build()
}

fn flatten_machine(machine: &Machine) -> Dynamic {
    Dynamic::object([
        ("id", string_or_null(&machine.id)),
        ("name", string_or_null(&machine.name)),
        ("creation_time", string_or_null(&machine.creation_time)),
        ("description", string_or_null(&machine.description)),
        ("fingerprint", string_or_null(&machine.fingerprint)),
        ("issued_cert_id", string_or_null(&machine.issued_cert_id)),
        ("machine_group_id", string_or_null(&machine.machine_group_id)),
        ("machine_group_name", string_or_null(&machine.machine_group_name)),
        ("machine_token_id", string_or_null(&machine.machine_token_id)),
        ("modified_by", string_or_null(&machine.modified_by)),
        ("modified_time", string_or_null(&machine.modified_time)),
        ("signing_cert", map_interface_to_string_map(&machine.signing_cert)),
        ("microtenant_id", string_or_null(&machine.microtenant_id)),
        ("microtenant_name", string_or_null(&machine.microtenant_name)),
    ])
}

fn flatten(group: &MachineGroup, microtenant_id: Option<&str>) -> Dynamic {
    Dynamic::object([
        ("id", Dynamic::String(group.id.clone())),
        ("name", string_or_null(&group.name)),
        ("description", string_or_null(&group.description)),
        ("enabled", Dynamic::Bool(group.enabled)),
        ("creation_time", string_or_null(&group.creation_time)),
        ("modified_by", string_or_null(&group.modified_by)),
        ("modified_time", string_or_null(&group.modified_time)),
        ("microtenant_id", microtenant_state(microtenant_id, &group.microtenant_id)),
        ("microtenant_name", string_or_null(&group.microtenant_name)),
        (
            "machines",
            Dynamic::List(group.machines.iter().map(flatten_machine).collect()),
        ),
    ])
}

#[async_trait]
impl DataSource for MachineGroupDataSource {
    fn type_name(&self) -> &str {
        "zpa_machine_group"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Retrieves a ZPA machine group by ID or name.")
            .attribute(id_attribute("machine group"))
            .attribute(name_attribute("machine group"))
            .attribute(microtenant_id_attribute())
            .attribute(computed_string("microtenant_name"))
            .attribute(computed_string("description"))
            .attribute(computed_bool("enabled"))
            .attribute(computed_string("creation_time"))
            .attribute(computed_string("modified_by"))
            .attribute(computed_string("modified_time"))
            .block(machines_block())
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
        let api = client.policy();

        tracing::debug!(id = %identifier.id, name = %identifier.name, "Reading machine group");

        let result = match identifier.id() {
            Some(id) => not_found_as_none(api.get_machine_group(id).await),
            None => api.get_machine_group_by_name(&identifier.name).await,
        };

        lookup_response(result, "machine group", &identifier, |group| {
            flatten(group, microtenant_id.as_deref())
        })
    }
}

#[async_trait]
impl DataSourceWithConfigure for MachineGroupDataSource {
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
    fn machines_render_signing_cert_as_json_strings() {
        let group: MachineGroup = serde_json::from_str(
            r#"{
                "id": "1",
                "name": "laptops",
                "machines": [{
                    "id": "2",
                    "name": "mac-01",
                    "signingCert": {"id": 10}
                }]
            }"#,
        )
        .unwrap();
        let Dynamic::Map(state) = flatten(&group, None) else {
            panic!("expected an object");
        };
        let Dynamic::List(machines) = &state["machines"] else {
            panic!("expected a list");
        };
        let Dynamic::Map(machine) = &machines[0] else {
            panic!("expected an object");
        };
        let Dynamic::Map(cert) = &machine["signing_cert"] else {
            panic!("expected a map");
        };
        assert_eq!(cert["id"], Dynamic::from("10"));
        assert_eq!(machine["fingerprint"], Dynamic::Null);
    }
}
