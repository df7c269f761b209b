use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use labmesh_core::{AppError, AppResult, IdentitySummary};
use serde::Deserialize;

/// Claims the gateway reads from the identity provider's access token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, rename = "cognito:groups")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub privileges: Vec<String>,
}

impl AccessTokenClaims {
    /// Username claim, or the subject when the provider omits it.
    #[must_use]
    pub fn principal_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|username| !username.trim().is_empty())
            .unwrap_or(self.sub.as_str())
    }

    /// Identity summary in token claim order.
    #[must_use]
    pub fn into_summary(self) -> IdentitySummary {
        let username = self.principal_name().to_owned();
        IdentitySummary::new(username, self.groups, self.privileges)
    }
}

/// RS256 verifier for identity provider access tokens.
///
/// Key material is not printable via Debug.
#[derive(Clone)]
pub struct AccessTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AccessTokenVerifier {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AccessTokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AccessTokenVerifier {
    /// Creates a verifier. Without an audience, `aud` is not checked; the
    /// provider's access tokens carry `client_id` instead.
    pub fn new(public_key_pem: &str, issuer: &str, audience: Option<&str>) -> AppResult<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes()).map_err(|error| {
            AppError::Validation(format!("invalid identity provider public key pem: {error}"))
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verifies the token signature, expiry and issuer and returns its claims.
    pub fn verify(&self, token: &str) -> AppResult<AccessTokenClaims> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|error| {
                    AppError::Unauthorized(format!("access token rejected: {error}"))
                })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "access token has an empty 'sub' claim".to_owned(),
            ));
        }

        Ok(data.claims)
    }
}
