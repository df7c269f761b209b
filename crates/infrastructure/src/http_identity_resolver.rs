use async_trait::async_trait;
use labmesh_application::IdentityResolver;
use labmesh_core::{AppError, AppResult, IdentityHeaders, IdentitySigner, IdentitySummary};
use labmesh_domain::InternalUserId;
use serde::Deserialize;
use url::Url;

/// Group carried by the service identity this client presents.
pub const SERVICE_GROUP: &str = "SERVICE";

/// Resolves external subjects through the identity service's internal lookup endpoint.
///
/// Calls are signed with a service identity under the shared secret, so they
/// pass the identity service's verification middleware like any other internal
/// call. A 404 carrying the identity service's error body maps to `NotFound`;
/// every other failure, including a bare 404 from a wrong base path, maps to
/// `Unavailable`. There is no retry.
#[derive(Clone)]
pub struct HttpIdentityResolver {
    http_client: reqwest::Client,
    base_url: Url,
    signer: IdentitySigner,
    service_identity: IdentitySummary,
}

#[derive(Debug, Deserialize)]
struct ResolvedIdentityBody {
    user_id: uuid::Uuid,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpIdentityResolver {
    /// Creates a resolver for the identity service rooted at `base_url`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        signer: IdentitySigner,
        service_name: &str,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid identity service url '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "identity service url '{base_url}' cannot carry a path"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            signer,
            service_identity: IdentitySummary::new(
                service_name,
                vec![SERVICE_GROUP.to_owned()],
                Vec::new(),
            ),
        })
    }

    fn lookup_url(&self, external_subject: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal("identity service url cannot carry a path".to_owned())
            })?
            .pop_if_empty()
            .extend(["internal", "identities", external_subject]);

        Ok(url)
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, external_subject: &str) -> AppResult<InternalUserId> {
        let url = self.lookup_url(external_subject)?;
        let headers = self.signer.sign(&self.service_identity)?;

        let response = self
            .http_client
            .get(url)
            .header(IdentityHeaders::USERNAME, headers.username)
            .header(IdentityHeaders::GROUPS, headers.groups)
            .header(IdentityHeaders::PRIVILEGES, headers.privileges)
            .header(IdentityHeaders::SIGNATURE, headers.signature)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("identity service request failed: {error}"))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(match response.json::<ErrorBody>().await {
                Ok(body) => AppError::NotFound(format!(
                    "no internal identity for subject '{external_subject}': {}",
                    body.message
                )),
                Err(error) => AppError::Unavailable(format!(
                    "identity service answered 404 without an error body: {error}"
                )),
            });
        }
        if !status.is_success() {
            return Err(AppError::Unavailable(format!(
                "identity service returned status {status}"
            )));
        }

        let body = response
            .json::<ResolvedIdentityBody>()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "identity service returned a malformed body: {error}"
                ))
            })?;

        Ok(InternalUserId::from_uuid(body.user_id))
    }
}
