//! Verification of signed identity headers on internal services.

use std::sync::Arc;

use labmesh_core::{
    AppError, AppResult, AuthorizationContext, IdentityHeaders, IdentitySigner, PublicPathPolicy,
};

use crate::IdentityResolver;

/// How the request principal is derived from a verified summary.
#[derive(Clone)]
pub enum PrincipalResolution {
    /// Bind the external subject carried in the summary.
    ExternalSubject,
    /// Resolve the external subject to the internal user id before binding.
    InternalUserId(Arc<dyn IdentityResolver>),
}

/// Decision for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAdmission {
    /// Path is on the public allow-list; no identity was established.
    Public,
    /// Signature verified; the context is bound to the request.
    Authenticated(AuthorizationContext),
}

/// Gatekeeper run before any business logic on an internal service.
#[derive(Clone)]
pub struct RequestAuthenticationService {
    signer: IdentitySigner,
    public_paths: PublicPathPolicy,
    principal_resolution: PrincipalResolution,
}

impl RequestAuthenticationService {
    /// Creates the service with the shared signer and the public path allow-list.
    #[must_use]
    pub fn new(
        signer: IdentitySigner,
        public_paths: PublicPathPolicy,
        principal_resolution: PrincipalResolution,
    ) -> Self {
        Self {
            signer,
            public_paths,
            principal_resolution,
        }
    }

    /// Admits or rejects a request.
    ///
    /// `headers` is `None` when any of the four identity headers is absent.
    /// Every rejection is `AppError::Unauthorized`; the message says why.
    pub async fn admit(
        &self,
        path: &str,
        headers: Option<&IdentityHeaders>,
    ) -> AppResult<RequestAdmission> {
        if self.public_paths.is_public(path) {
            return Ok(RequestAdmission::Public);
        }

        let headers = headers.ok_or_else(|| {
            AppError::Unauthorized(format!("identity headers are missing for '{path}'"))
        })?;

        if !self.signer.verify(headers) {
            return Err(AppError::Unauthorized(format!(
                "identity signature mismatch for '{}'",
                headers.username
            )));
        }

        let summary = headers.to_summary();
        let principal = self.resolve_principal(summary.username()).await?;

        Ok(RequestAdmission::Authenticated(
            AuthorizationContext::from_summary(&summary, principal),
        ))
    }

    async fn resolve_principal(&self, username: &str) -> AppResult<String> {
        let resolver = match &self.principal_resolution {
            PrincipalResolution::ExternalSubject => return Ok(username.to_owned()),
            PrincipalResolution::InternalUserId(resolver) => resolver,
        };

        match resolver.resolve(username).await {
            Ok(internal_user_id) => Ok(internal_user_id.to_string()),
            Err(AppError::NotFound(_)) => Err(AppError::Unauthorized(format!(
                "no internal identity for subject '{username}'"
            ))),
            Err(AppError::Unavailable(reason)) => Err(AppError::Unauthorized(format!(
                "identity resolution unavailable for subject '{username}': {reason}"
            ))),
            Err(error) => Err(AppError::Unauthorized(format!(
                "identity resolution failed for subject '{username}': {error}"
            ))),
        }
    }
}
