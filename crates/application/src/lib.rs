//! Application services and ports.

#![forbid(unsafe_code)]

mod identity_directory_service;
mod identity_ports;
mod privilege_ports;
mod privilege_resolution_service;
mod request_authentication_service;
mod token_enrichment_service;

pub use identity_directory_service::{IdentityDirectoryService, IdentityRegistration};
pub use identity_ports::{IdentityMappingRepository, IdentityResolver};
pub use privilege_ports::{PrivilegeCacheStore, PrivilegeDirectory};
pub use privilege_resolution_service::{
    DEFAULT_PRIVILEGE_CACHE_TTL_SECONDS, PrivilegeResolution, PrivilegeResolutionService,
    RolePrivilegeOutcome,
};
pub use request_authentication_service::{
    PrincipalResolution, RequestAdmission, RequestAuthenticationService,
};
pub use token_enrichment_service::{EnrichedTokenEvent, PRIVILEGES_CLAIM, TokenEnrichmentService};
