//! Token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::debug;
use portal_protocol::Identity;

use super::config::validate_secret;
use super::{AuthError, Claims, ConfigValidationError};

/// Lifetime of an issued token, in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Signs identities into HS256 tokens and verifies them.
///
/// Verification is a pure function of the token, the current time and the
/// secret, so one codec is shared by all requests.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec from a resolved secret.
    pub fn new(secret: &str) -> Result<Self, ConfigValidationError> {
        validate_secret(secret)?;

        // Expiry is checked against an explicit clock in `verify_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token for `identity`, valid for one hour from now.
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, identity: &Identity, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            user: identity.clone(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify a token and return the identity it carries.
    ///
    /// Returns `None` for malformed, tampered or expired tokens.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Option<Identity> {
        self.claims_at(token, now).map(|claims| claims.user)
    }

    /// Verify a token and return its full claims.
    pub fn claims_at(&self, token: &str, now: i64) -> Option<Claims> {
        let data = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                debug!("Token rejected: {:?}", e.kind());
                return None;
            }
        };

        if data.claims.is_expired_at(now) {
            debug!("Token rejected: expired at {}", data.claims.exp);
            return None;
        }

        Some(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use portal_protocol::Role;

    const SECRET: &str = "test-secret-for-unit-tests-minimum-32-chars-long";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).unwrap()
    }

    fn identity(role: Role) -> Identity {
        Identity {
            email: format!("{}@test.com", role),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            display_picture_url: "https://via.placeholder.com/150".to_string(),
        }
    }

    #[test]
    fn test_round_trip_for_every_role() {
        let codec = codec();
        for role in [Role::Student, Role::Faculty, Role::Admin] {
            let identity = identity(role);
            let token = codec.issue(&identity).unwrap();
            assert_eq!(codec.verify(&token), Some(identity));
        }
    }

    #[test]
    fn test_round_trip_with_empty_fields() {
        let codec = codec();
        let identity = Identity {
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Student,
            display_picture_url: String::new(),
        };
        let token = codec.issue(&identity).unwrap();
        assert_eq!(codec.verify(&token), Some(identity));
    }

    #[test]
    fn test_expiry_is_one_hour() {
        let codec = codec();
        let now = 1_700_000_000;
        let token = codec.issue_at(&identity(Role::Admin), now).unwrap();

        let claims = codec.claims_at(&token, now).unwrap();
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 3600);

        assert!(codec.verify_at(&token, now + 3599).is_some());
        assert!(codec.verify_at(&token, now + 3600).is_none());
    }

    #[test]
    fn test_token_older_than_an_hour_is_rejected() {
        let codec = codec();
        let issued = Utc::now().timestamp() - 2 * 3600;
        let token = codec.issue_at(&identity(Role::Student), issued).unwrap();
        assert!(codec.verify(&token).is_none());
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let codec = codec();
        let cases = [
            "",
            "garbage",
            "a.b",
            "a.b.c",
            "....",
            "eyJhbGciOiJIUzI1NiJ9.e30.",
            "Bearer abc.def.ghi",
            "\u{0}\u{1}",
        ];
        for case in cases {
            assert!(codec.verify(case).is_none(), "{case:?} should be rejected");
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = codec();
        let token = codec.issue(&identity(Role::Student)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = Claims {
            user: identity(Role::Admin),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(codec.verify(&forged).is_none());
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = codec().issue(&identity(Role::Faculty)).unwrap();
        let other = TokenCodec::new("another-secret-that-is-also-long-enough-32").unwrap();
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_rejects_weak_secret() {
        assert!(matches!(
            TokenCodec::new(""),
            Err(ConfigValidationError::MissingJwtSecret)
        ));
        assert!(matches!(
            TokenCodec::new("short"),
            Err(ConfigValidationError::JwtSecretTooShort)
        ));
    }
}
