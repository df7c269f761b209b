use std::fmt::{Debug, Formatter};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::{IdentityHeaders, IdentitySummary};
use crate::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted length of the shared signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// HMAC-SHA256 signer for identity summaries, keyed by the mesh-wide shared secret.
///
/// The edge uses [`IdentitySigner::sign`]; internal services use
/// [`IdentitySigner::verify`] on the header values exactly as received.
#[derive(Clone)]
pub struct IdentitySigner {
    secret: Vec<u8>,
}

impl Debug for IdentitySigner {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("IdentitySigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl IdentitySigner {
    /// Creates a signer from the shared secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> AppResult<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "identity signing secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }

        Ok(Self { secret })
    }

    /// Signs the summary and renders the four transport headers.
    pub fn sign(&self, summary: &IdentitySummary) -> AppResult<IdentityHeaders> {
        let signature = self.sign_canonical(summary.canonical().as_str())?;

        Ok(IdentityHeaders {
            username: summary.username().to_owned(),
            groups: summary.groups_header(),
            privileges: summary.privileges_header(),
            signature,
        })
    }

    /// Returns the base64 MAC over an already canonical summary string.
    pub fn sign_canonical(&self, canonical: &str) -> AppResult<String> {
        let mut mac = self.keyed_mac()?;
        mac.update(canonical.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Returns whether the presented signature matches the received header values.
    #[must_use]
    pub fn verify(&self, headers: &IdentityHeaders) -> bool {
        let Ok(presented) = STANDARD.decode(headers.signature.as_bytes()) else {
            return false;
        };
        let Ok(mut mac) = self.keyed_mac() else {
            return false;
        };

        mac.update(headers.canonical().as_bytes());
        mac.verify_slice(&presented).is_ok()
    }

    fn keyed_mac(&self) -> AppResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|error| AppError::Internal(format!("invalid identity signing key: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::IdentitySigner;
    use crate::auth::{IdentityHeaders, IdentitySummary};

    const SECRET: &str = "an-internal-mesh-secret-of-32-bytes!";

    fn signer() -> IdentitySigner {
        match IdentitySigner::new(SECRET) {
            Ok(signer) => signer,
            Err(error) => panic!("test secret rejected: {error}"),
        }
    }

    fn sign(signer: &IdentitySigner, summary: &IdentitySummary) -> IdentityHeaders {
        match signer.sign(summary) {
            Ok(headers) => headers,
            Err(error) => panic!("signing failed: {error}"),
        }
    }

    fn alice() -> IdentitySummary {
        IdentitySummary::new(
            "alice",
            vec!["ADMIN".to_owned(), "LAB_TECH".to_owned()],
            vec!["READ".to_owned(), "WRITE".to_owned()],
        )
    }

    #[test]
    fn rejects_short_secret() {
        assert!(IdentitySigner::new("too-short").is_err());
    }

    #[test]
    fn signed_headers_verify() {
        let signer = signer();
        let headers = sign(&signer, &alice());

        assert_eq!(headers.username, "alice");
        assert_eq!(headers.groups, "ADMIN,LAB_TECH");
        assert_eq!(headers.privileges, "READ,WRITE");
        assert!(signer.verify(&headers));
    }

    #[test]
    fn signature_matches_mac_over_canonical_string() {
        let signer = signer();
        let headers = sign(&signer, &alice());
        let expected = signer.sign_canonical("alice|ADMIN,LAB_TECH|READ,WRITE");

        assert!(matches!(expected, Ok(value) if value == headers.signature));
    }

    #[test]
    fn verification_fails_under_a_different_secret() {
        let headers = sign(&signer(), &alice());
        let other = match IdentitySigner::new("another-internal-mesh-secret-32-bytes") {
            Ok(signer) => signer,
            Err(error) => panic!("test secret rejected: {error}"),
        };

        assert!(!other.verify(&headers));
    }

    #[test]
    fn reordered_groups_invalidate_the_signature() {
        let signer = signer();
        let mut headers = sign(&signer, &alice());
        headers.groups = "LAB_TECH,ADMIN".to_owned();

        assert!(!signer.verify(&headers));
    }

    #[test]
    fn malformed_signature_is_rejected() {
        let signer = signer();
        let mut headers = sign(&signer, &alice());
        headers.signature = "not base64 at all".to_owned();

        assert!(!signer.verify(&headers));
    }

    proptest! {
        #[test]
        fn any_single_character_change_breaks_verification(
            field in 0_usize..3,
            position in 0_usize..64,
            replacement in proptest::char::range('!', '~'),
        ) {
            let signer = signer();
            let mut headers = sign(&signer, &alice());
            let target = match field {
                0 => &mut headers.username,
                1 => &mut headers.groups,
                _ => &mut headers.privileges,
            };

            let mut characters: Vec<char> = target.chars().collect();
            let index = position % characters.len();
            prop_assume!(characters[index] != replacement);
            characters[index] = replacement;
            *target = characters.into_iter().collect();

            prop_assert!(!signer.verify(&headers));
        }
    }
}
