use serde::Serialize;
use ts_rs::TS;

/// Aggregate health response.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "identity/")]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
}

/// Health of one backing dependency.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "identity/")]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Mapping between an identity provider subject and an internal user.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "identity/")]
pub struct IdentityResponse {
    pub external_subject: String,
    pub user_id: String,
}

/// Caller identity as established by the verification middleware.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "identity/")]
pub struct CurrentIdentityResponse {
    pub principal: String,
    pub roles: Vec<String>,
    pub privileges: Vec<String>,
}
