use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Session token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let claims = Claims {
            user_id,
            exp: Utc::now().timestamp() + self.lifetime.as_secs() as i64,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// `None` for anything that is not a valid, unexpired token signed with
    /// our key.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-jwt-secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();
        let token = service.issue(123).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.user_id, 123);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_foreign_and_garbage_tokens_are_rejected() {
        let token = service().issue(123).unwrap();
        let other = TokenService::new("another-secret", Duration::from_secs(3600));

        assert!(other.verify(&token).is_none());
        assert!(service().verify("not.a.token").is_none());
        assert!(service().verify("").is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        // Well past the default leeway.
        let claims = Claims {
            user_id: 1,
            exp: Utc::now().timestamp() - 600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &service.encoding).unwrap();

        assert!(service.verify(&token).is_none());
    }
}
