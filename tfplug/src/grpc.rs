//! gRPC service implementation
//!
//! Implements the Terraform Plugin Protocol v6.9 on top of the Provider and
//! DataSource traits. Data sources are created on demand from the provider's
//! factories, configured with the provider data and read; managed resources,
//! ephemeral resources and functions are answered as unsupported.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceFactory, DataSourceSchemaRequest,
    ReadDataSourceRequest, ReadDataSourceResponse, ValidateDataSourceConfigRequest,
};
use crate::proto;
use crate::proto::provider_server::Provider as ProtoProvider;
use crate::provider::{
    ConfigureProviderRequest, Provider, ProviderSchemaRequest, ValidateProviderConfigRequest,
};
use crate::schema::{Attribute, Block, NestedBlock, NestingMode, Schema, StringKind};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, ClientCapabilities, Deferred, DeferredReason,
    Diagnostic, DiagnosticSeverity, DynamicValue,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, warn};

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

/// Schemas are fixed for the lifetime of the process, so they are built once
struct SchemaCache {
    provider: Schema,
    data_sources: HashMap<String, Schema>,
    diagnostics: Vec<Diagnostic>,
}

pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    factories: HashMap<String, DataSourceFactory>,
    provider_data: Arc<RwLock<ProviderData>>,
    schemas: OnceCell<SchemaCache>,
    stop: Context,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let factories = provider.data_sources();
        Self {
            provider: Arc::new(RwLock::new(provider)),
            factories,
            provider_data: Arc::new(RwLock::new(None)),
            schemas: OnceCell::new(),
            stop: Context::new(),
        }
    }

    /// Context cancelled by StopProvider
    pub fn stop_context(&self) -> Context {
        self.stop.clone()
    }

    async fn schemas(&self) -> &SchemaCache {
        self.schemas
            .get_or_init(|| async {
                let provider = self.provider.read().await;
                let provider_schema = provider
                    .schema(self.stop.clone(), ProviderSchemaRequest)
                    .await;

                let mut diagnostics = provider_schema.diagnostics;
                let mut data_sources = HashMap::with_capacity(self.factories.len());
                for (name, factory) in &self.factories {
                    let response = factory()
                        .schema(self.stop.clone(), DataSourceSchemaRequest)
                        .await;
                    diagnostics.extend(response.diagnostics);
                    data_sources.insert(name.clone(), response.schema);
                }

                debug!(count = data_sources.len(), "Built data source schemas");

                SchemaCache {
                    provider: provider_schema.schema,
                    data_sources,
                    diagnostics,
                }
            })
            .await
    }

    fn server_capabilities() -> proto::ServerCapabilities {
        proto::ServerCapabilities {
            plan_destroy: false,
            get_provider_schema_optional: true,
            move_resource_state: false,
        }
    }

    async fn read(&self, req: proto::read_data_source::Request) -> ReadDataSourceResponse {
        let Some(factory) = self.factories.get(&req.type_name) else {
            return ReadDataSourceResponse::error(Diagnostic::error(
                "Unknown data source type",
                format!("The provider does not support data source type \"{}\"", req.type_name),
            ));
        };

        let config = match decode_dynamic_value(&req.config) {
            Ok(config) => config,
            Err(e) => {
                return ReadDataSourceResponse::error(Diagnostic::error(
                    "Invalid configuration",
                    format!("Failed to decode data source configuration: {}", e),
                ))
            }
        };

        let provider_meta = match &req.provider_meta {
            Some(meta) => decode_dynamic_value(&Some(meta.clone())).ok(),
            None => None,
        };

        let mut data_source = factory();
        let provider_data = self.provider_data.read().await.clone();
        let ctx = self.stop.clone();

        let configured = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;
        if has_errors(&configured.diagnostics) {
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: configured.diagnostics,
                deferred: None,
            };
        }

        let request = ReadDataSourceRequest {
            type_name: req.type_name.clone(),
            config,
            provider_meta,
            client_capabilities: client_capabilities(req.client_capabilities.as_ref()),
        };

        let mut response = tokio::select! {
            response = data_source.read(ctx.clone(), request) => response,
            _ = ctx.cancelled() => ReadDataSourceResponse::error(Diagnostic::error(
                "Request Cancelled",
                format!("Reading \"{}\" was cancelled because the provider is stopping", req.type_name),
            )),
        };

        response.diagnostics = [configured.diagnostics, response.diagnostics].concat();
        response
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> ProtoProvider for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> std::result::Result<Response<proto::get_metadata::Response>, Status> {
        let mut data_sources: Vec<_> = self
            .factories
            .keys()
            .map(|name| proto::get_metadata::DataSourceMetadata {
                type_name: name.clone(),
            })
            .collect();
        data_sources.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(Self::server_capabilities()),
            diagnostics: vec![],
            data_sources,
            resources: vec![],
            functions: vec![],
            ephemeral_resources: vec![],
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> std::result::Result<Response<proto::get_provider_schema::Response>, Status> {
        let cache = self.schemas().await;

        let data_source_schemas = cache
            .data_sources
            .iter()
            .map(|(name, schema)| (name.clone(), schema_to_proto(schema)))
            .collect();

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(schema_to_proto(&cache.provider)),
            resource_schemas: HashMap::new(),
            data_source_schemas,
            functions: HashMap::new(),
            ephemeral_resource_schemas: HashMap::new(),
            diagnostics: convert_diagnostics(cache.diagnostics.clone()),
            provider_meta: None,
            server_capabilities: Some(Self::server_capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> std::result::Result<Response<proto::validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        let config = decode_dynamic_value(&req.config)?;

        let mut diagnostics = self
            .schemas()
            .await
            .provider
            .block
            .validate(&config.value, &AttributePath::root());

        if !has_errors(&diagnostics) {
            let provider = self.provider.read().await;
            let response = provider
                .validate(self.stop.clone(), ValidateProviderConfigRequest { config })
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: convert_diagnostics(diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> std::result::Result<Response<proto::validate_resource_config::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: vec![unsupported("managed resource", &type_name)],
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> std::result::Result<Response<proto::validate_data_resource_config::Response>, Status>
    {
        let req = request.into_inner();

        let Some(schema) = self.schemas().await.data_sources.get(&req.type_name) else {
            return Ok(Response::new(proto::validate_data_resource_config::Response {
                diagnostics: convert_diagnostics(vec![Diagnostic::error(
                    "Unknown data source type",
                    format!("The provider does not support data source type \"{}\"", req.type_name),
                )]),
            }));
        };

        let config = match decode_dynamic_value(&req.config) {
            Ok(config) => config,
            Err(e) => {
                // Nothing to check until Terraform can send a decodable value
                debug!(error = %e, type_name = %req.type_name, "Skipping validation of undecodable config");
                return Ok(Response::new(
                    proto::validate_data_resource_config::Response {
                        diagnostics: vec![],
                    },
                ));
            }
        };

        let mut diagnostics = schema
            .block
            .validate(&config.value, &AttributePath::root());

        if !has_errors(&diagnostics) {
            if let Some(factory) = self.factories.get(&req.type_name) {
                let response = factory()
                    .validate(
                        self.stop.clone(),
                        ValidateDataSourceConfigRequest {
                            type_name: req.type_name.clone(),
                            config,
                        },
                    )
                    .await;
                diagnostics.extend(response.diagnostics);
            }
        }

        Ok(Response::new(proto::validate_data_resource_config::Response {
            diagnostics: convert_diagnostics(diagnostics),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> std::result::Result<Response<proto::upgrade_resource_state::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state: None,
            diagnostics: vec![unsupported("managed resource", &type_name)],
        }))
    }

    async fn get_resource_identity_schemas(
        &self,
        _request: Request<proto::get_resource_identity_schemas::Request>,
    ) -> std::result::Result<Response<proto::get_resource_identity_schemas::Response>, Status>
    {
        Ok(Response::new(proto::get_resource_identity_schemas::Response {
            identity_schemas: HashMap::new(),
            diagnostics: vec![],
        }))
    }

    async fn upgrade_resource_identity(
        &self,
        request: Request<proto::upgrade_resource_identity::Request>,
    ) -> std::result::Result<Response<proto::upgrade_resource_identity::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::upgrade_resource_identity::Response {
            upgraded_identity: None,
            diagnostics: vec![unsupported("resource identity", &type_name)],
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> std::result::Result<Response<proto::configure_provider::Response>, Status> {
        let req = request.into_inner();
        let config = decode_dynamic_value(&req.config)?;

        info!(terraform_version = %req.terraform_version, "Configuring provider");

        let response = {
            let mut provider = self.provider.write().await;
            provider
                .configure(
                    self.stop.clone(),
                    ConfigureProviderRequest {
                        terraform_version: req.terraform_version,
                        config,
                        client_capabilities: client_capabilities(
                            req.client_capabilities.as_ref(),
                        ),
                    },
                )
                .await
        };

        if has_errors(&response.diagnostics) {
            warn!("Provider configuration failed");
        } else {
            *self.provider_data.write().await = response.provider_data;
        }

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: convert_diagnostics(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> std::result::Result<Response<proto::read_resource::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::read_resource::Response {
            diagnostics: vec![unsupported("managed resource", &type_name)],
            ..Default::default()
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> std::result::Result<Response<proto::plan_resource_change::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::plan_resource_change::Response {
            diagnostics: vec![unsupported("managed resource", &type_name)],
            ..Default::default()
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> std::result::Result<Response<proto::apply_resource_change::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::apply_resource_change::Response {
            diagnostics: vec![unsupported("managed resource", &type_name)],
            ..Default::default()
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> std::result::Result<Response<proto::import_resource_state::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::import_resource_state::Response {
            diagnostics: vec![unsupported("managed resource", &type_name)],
            ..Default::default()
        }))
    }

    async fn move_resource_state(
        &self,
        request: Request<proto::move_resource_state::Request>,
    ) -> std::result::Result<Response<proto::move_resource_state::Response>, Status> {
        let type_name = request.into_inner().target_type_name;
        Ok(Response::new(proto::move_resource_state::Response {
            diagnostics: vec![unsupported("managed resource", &type_name)],
            ..Default::default()
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> std::result::Result<Response<proto::read_data_source::Response>, Status> {
        let req = request.into_inner();
        let type_name = req.type_name.clone();

        debug!(type_name = %type_name, "Reading data source");

        let response = self.read(req).await;

        let state = if response.state.is_null() {
            None
        } else {
            let conformed = match self.schemas().await.data_sources.get(&type_name) {
                Some(schema) => DynamicValue::new(schema.block.conform(&response.state.value)),
                None => response.state,
            };
            Some(encode_dynamic_value(&conformed).map_err(|e| {
                error!(type_name = %type_name, error = %e, "Failed to encode data source state");
                Status::from(e)
            })?)
        };

        Ok(Response::new(proto::read_data_source::Response {
            state,
            diagnostics: convert_diagnostics(response.diagnostics),
            deferred: response.deferred.map(deferred_to_proto),
        }))
    }

    async fn validate_ephemeral_resource_config(
        &self,
        request: Request<proto::validate_ephemeral_resource_config::Request>,
    ) -> std::result::Result<Response<proto::validate_ephemeral_resource_config::Response>, Status>
    {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(
            proto::validate_ephemeral_resource_config::Response {
                diagnostics: vec![unsupported("ephemeral resource", &type_name)],
            },
        ))
    }

    async fn open_ephemeral_resource(
        &self,
        request: Request<proto::open_ephemeral_resource::Request>,
    ) -> std::result::Result<Response<proto::open_ephemeral_resource::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::open_ephemeral_resource::Response {
            diagnostics: vec![unsupported("ephemeral resource", &type_name)],
            ..Default::default()
        }))
    }

    async fn renew_ephemeral_resource(
        &self,
        request: Request<proto::renew_ephemeral_resource::Request>,
    ) -> std::result::Result<Response<proto::renew_ephemeral_resource::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::renew_ephemeral_resource::Response {
            diagnostics: vec![unsupported("ephemeral resource", &type_name)],
            ..Default::default()
        }))
    }

    async fn close_ephemeral_resource(
        &self,
        request: Request<proto::close_ephemeral_resource::Request>,
    ) -> std::result::Result<Response<proto::close_ephemeral_resource::Response>, Status> {
        let type_name = request.into_inner().type_name;
        Ok(Response::new(proto::close_ephemeral_resource::Response {
            diagnostics: vec![unsupported("ephemeral resource", &type_name)],
        }))
    }

    async fn get_functions(
        &self,
        _request: Request<proto::get_functions::Request>,
    ) -> std::result::Result<Response<proto::get_functions::Response>, Status> {
        Ok(Response::new(proto::get_functions::Response {
            functions: HashMap::new(),
            diagnostics: vec![],
        }))
    }

    async fn call_function(
        &self,
        request: Request<proto::call_function::Request>,
    ) -> std::result::Result<Response<proto::call_function::Response>, Status> {
        let name = request.into_inner().name;
        Ok(Response::new(proto::call_function::Response {
            result: None,
            error: Some(proto::FunctionError {
                text: format!("Function \"{}\" is not provided by this provider", name),
                function_argument: None,
            }),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> std::result::Result<Response<proto::stop_provider::Response>, Status> {
        info!("Stop requested, cancelling in-flight requests");
        self.stop.cancel();
        Ok(Response::new(proto::stop_provider::Response {
            error: String::new(),
        }))
    }
}

// Helper functions

fn unsupported(kind: &str, type_name: &str) -> proto::Diagnostic {
    proto::Diagnostic {
        severity: proto::diagnostic::Severity::Error as i32,
        summary: "Unsupported operation".to_string(),
        detail: format!(
            "This provider only implements data sources; {} \"{}\" is not supported",
            kind, type_name
        ),
        attribute: None,
    }
}

fn client_capabilities(caps: Option<&proto::ClientCapabilities>) -> ClientCapabilities {
    caps.map(|c| ClientCapabilities {
        deferral_allowed: c.deferral_allowed,
        write_only_attributes_allowed: c.write_only_attributes_allowed,
    })
    .unwrap_or_default()
}

fn deferred_to_proto(deferred: Deferred) -> proto::Deferred {
    let reason = match deferred.reason {
        DeferredReason::Unknown => proto::deferred::Reason::Unknown,
        DeferredReason::ResourceConfigUnknown => proto::deferred::Reason::ResourceConfigUnknown,
        DeferredReason::ProviderConfigUnknown => proto::deferred::Reason::ProviderConfigUnknown,
        DeferredReason::AbsentPrereq => proto::deferred::Reason::AbsentPrereq,
    };
    proto::Deferred {
        reason: reason as i32,
    }
}

fn string_kind(kind: StringKind) -> i32 {
    match kind {
        StringKind::Plain => proto::StringKind::Plain as i32,
        StringKind::Markdown => proto::StringKind::Markdown as i32,
    }
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> proto::schema::Block {
    proto::schema::Block {
        version: block.version,
        attributes: block.attributes.iter().map(attribute_to_proto).collect(),
        block_types: block.block_types.iter().map(nested_block_to_proto).collect(),
        description: block.description.clone(),
        description_kind: string_kind(block.description_kind),
        deprecated: block.deprecated,
    }
}

fn attribute_to_proto(attr: &Attribute) -> proto::schema::Attribute {
    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type: attr.r#type.to_json_bytes(),
        nested_type: None,
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: proto::StringKind::Plain as i32,
        deprecated: attr.deprecated,
        write_only: false,
    }
}

fn nested_block_to_proto(nested: &NestedBlock) -> proto::schema::NestedBlock {
    use proto::schema::nested_block::NestingMode as ProtoNesting;
    let nesting = match nested.nesting {
        NestingMode::Invalid => ProtoNesting::Invalid,
        NestingMode::Single => ProtoNesting::Single,
        NestingMode::List => ProtoNesting::List,
        NestingMode::Set => ProtoNesting::Set,
        NestingMode::Map => ProtoNesting::Map,
        NestingMode::Group => ProtoNesting::Group,
    };
    proto::schema::NestedBlock {
        type_name: nested.type_name.clone(),
        block: Some(block_to_proto(&nested.block)),
        nesting: nesting as i32,
        min_items: nested.min_items,
        max_items: nested.max_items,
    }
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use proto::attribute_path::step::Selector;
    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| proto::attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => {
                        Selector::AttributeName(name.clone())
                    }
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

#[allow(clippy::result_large_err)]
fn decode_dynamic_value(
    value: &Option<proto::DynamicValue>,
) -> std::result::Result<DynamicValue, Status> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };

    let decoded = if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)
    } else {
        DynamicValue::decode_json(&value.json)
    };

    decoded.map_err(|e| {
        let preview = &value.msgpack[..value.msgpack.len().min(50)];
        debug!(?preview, "Undecodable dynamic value");
        Status::invalid_argument(e.to_string())
    })
}

fn encode_dynamic_value(value: &DynamicValue) -> crate::Result<proto::DynamicValue> {
    Ok(proto::DynamicValue {
        msgpack: value.encode_msgpack()?,
        json: vec![],
    })
}

fn convert_diagnostics(diags: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diags
        .into_iter()
        .map(|diag| proto::Diagnostic {
            severity: match diag.severity {
                DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid as i32,
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning as i32,
            },
            summary: diag.summary,
            detail: diag.detail,
            attribute: diag.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}
