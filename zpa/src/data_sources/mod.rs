pub mod data_source_access_policy_client_types;
pub mod data_source_access_policy_platform;
pub mod data_source_app_connector_controller;
pub mod data_source_app_connector_group;
pub mod data_source_application_segment;
pub mod data_source_application_server;
pub mod data_source_ba_certificate;
pub mod data_source_enrollment_cert;
pub mod data_source_idp_controller;
pub mod data_source_lss_config_status_codes;
pub mod data_source_machine_group;
pub mod data_source_policy_type;
pub mod data_source_posture_profile;
pub mod data_source_scim_attribute_header;
pub mod data_source_scim_group;
pub mod data_source_segment_group;
pub mod data_source_server_group;
pub mod data_source_service_edge_controller;
pub mod data_source_service_edge_group;
pub mod data_source_trusted_network;
pub mod helpers;

pub use data_source_access_policy_client_types::AccessPolicyClientTypesDataSource;
pub use data_source_access_policy_platform::AccessPolicyPlatformDataSource;
pub use data_source_app_connector_controller::AppConnectorControllerDataSource;
pub use data_source_app_connector_group::AppConnectorGroupDataSource;
pub use data_source_application_segment::ApplicationSegmentDataSource;
pub use data_source_application_server::ApplicationServerDataSource;
pub use data_source_ba_certificate::BaCertificateDataSource;
pub use data_source_enrollment_cert::EnrollmentCertDataSource;
pub use data_source_idp_controller::IdpControllerDataSource;
pub use data_source_lss_config_status_codes::LssConfigStatusCodesDataSource;
pub use data_source_machine_group::MachineGroupDataSource;
pub use data_source_policy_type::PolicyTypeDataSource;
pub use data_source_posture_profile::PostureProfileDataSource;
pub use data_source_scim_attribute_header::ScimAttributeHeaderDataSource;
pub use data_source_scim_group::ScimGroupDataSource;
pub use data_source_segment_group::SegmentGroupDataSource;
pub use data_source_server_group::ServerGroupDataSource;
pub use data_source_service_edge_controller::ServiceEdgeControllerDataSource;
pub use data_source_service_edge_group::ServiceEdgeGroupDataSource;
pub use data_source_trusted_network::TrustedNetworkDataSource;
