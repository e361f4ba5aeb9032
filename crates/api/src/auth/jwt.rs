//! JWT token generation and validation

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email
    pub email: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    Encoding(String),
    #[error("Invalid or expired token")]
    Invalid,
    #[error("Wrong token type")]
    WrongTokenType,
}

/// JWT manager for token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(
        secret: &str,
        access_token_expiry_minutes: i64,
        refresh_token_expiry_days: i64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry_minutes,
            refresh_token_expiry_days,
        }
    }

    /// Generate an access/refresh token pair for a user
    pub fn generate_token_pair(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<(String, String), JwtError> {
        let access = self.generate_token(
            user_id,
            email,
            TokenType::Access,
            Duration::minutes(self.access_token_expiry_minutes),
        )?;
        let refresh = self.generate_token(
            user_id,
            email,
            TokenType::Refresh,
            Duration::days(self.refresh_token_expiry_days),
        )?;
        Ok((access, refresh))
    }

    fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        token_type: TokenType,
        validity: Duration,
    ) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + validity).unix_timestamp(),
            token_type,
        };

        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate a token and check it is of the expected type.
    ///
    /// An access token presented where a refresh token is required (or
    /// vice versa) is rejected even when its signature is valid.
    pub fn validate_token(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| JwtError::Invalid)?;

        if data.claims.token_type != expected {
            return Err(JwtError::WrongTokenType);
        }

        Ok(data.claims)
    }

    pub fn access_token_expiry_minutes(&self) -> i64 {
        self.access_token_expiry_minutes
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret-that-is-long-enough-for-hs256", 15, 7)
    }

    #[test]
    fn test_token_pair_round_trip() {
        let manager = manager();
        let user_id = Uuid::new_v4();
        let (access, refresh) = manager.generate_token_pair(user_id, "a@example.com").unwrap();

        let claims = manager.validate_token(&access, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@example.com");

        let claims = manager.validate_token(&refresh, TokenType::Refresh).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_wrong_token_type_is_rejected() {
        let manager = manager();
        let (access, refresh) = manager
            .generate_token_pair(Uuid::new_v4(), "a@example.com")
            .unwrap();

        assert!(matches!(
            manager.validate_token(&access, TokenType::Refresh),
            Err(JwtError::WrongTokenType)
        ));
        assert!(matches!(
            manager.validate_token(&refresh, TokenType::Access),
            Err(JwtError::WrongTokenType)
        ));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let manager = manager();
        let (access, _) = manager
            .generate_token_pair(Uuid::new_v4(), "a@example.com")
            .unwrap();

        let other = JwtManager::new("different-secret-also-long-enough-ok", 15, 7);
        assert!(matches!(
            other.validate_token(&access, TokenType::Access),
            Err(JwtError::Invalid)
        ));
    }
}
