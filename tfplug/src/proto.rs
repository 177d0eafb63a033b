//! Protocol buffer types for Terraform Plugin Protocol v6.9
//!
//! Generated at build time by tonic_build from `proto/tfplugin6.9.proto`.
//! Some protobuf types share names with tfplug framework types
//! (`DynamicValue`, `Schema`, `Diagnostic`); always refer to these through
//! the `proto::` prefix.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

pub use provider_server::{Provider as ProviderService, ProviderServer};
