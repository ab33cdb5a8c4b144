//! Token minting for the auth endpoints.
//!
//! An access token is an HS256 JWT carrying [`Claims`]. A refresh token is
//! an opaque random string; `refresh_sessions` only ever sees its SHA-256.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use storyverse_core::types::{DbId, Timestamp};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Signing secret and token lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Read `JWT_SECRET` (required), `JWT_ACCESS_EXPIRY_MINS` (default 15)
    /// and `JWT_REFRESH_EXPIRY_DAYS` (default 7).
    ///
    /// # Panics
    ///
    /// On a missing or empty secret, or a lifetime that is not a positive
    /// integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self {
            secret,
            access_token_expiry_mins: lifetime_from_env(
                "JWT_ACCESS_EXPIRY_MINS",
                DEFAULT_ACCESS_EXPIRY_MINS,
            ),
            refresh_token_expiry_days: lifetime_from_env(
                "JWT_REFRESH_EXPIRY_DAYS",
                DEFAULT_REFRESH_EXPIRY_DAYS,
            ),
        }
    }

    /// Access token lifetime in seconds, as reported in `expires_in`.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }
}

fn lifetime_from_env(key: &str, default: i64) -> i64 {
    let value = std::env::var(key).map_or(Ok(default), |raw| raw.parse::<i64>());
    match value {
        Ok(v) if v > 0 => v,
        _ => panic!("{key} must be a positive integer"),
    }
}

/// A signed access token for one user.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

impl AccessToken {
    pub fn issue(
        user_id: DbId,
        role: &str,
        config: &JwtConfig,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            exp: now + config.access_ttl_secs(),
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )?;
        Ok(Self {
            token,
            expires_in: config.access_ttl_secs(),
        })
    }
}

/// Check signature and expiry, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// A freshly minted refresh token. `plaintext` goes to the client once.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: Timestamp,
}

impl RefreshToken {
    /// Two v4 UUIDs back to back, giving 244 random bits.
    pub fn mint(config: &JwtConfig) -> Self {
        let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let hash = hash_refresh_token(&plaintext);
        Self {
            plaintext,
            hash,
            expires_at: Utc::now() + Duration::days(config.refresh_token_expiry_days),
        }
    }
}

pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn access_token_carries_user_and_role() {
        let config = config("storyverse-test-secret");
        let issued = AccessToken::issue(42, "user", &config).unwrap();
        assert_eq!(issued.expires_in, 900);

        let claims = validate_token(&issued.token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "user");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config("storyverse-test-secret");
        // Past the default 60 second leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "user".to_string(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let issued = AccessToken::issue(1, "user", &config("alpha")).unwrap();
        assert!(validate_token(&issued.token, &config("bravo")).is_err());
    }

    #[test]
    fn refresh_token_is_hashed_and_expires_in_days() {
        let minted = RefreshToken::mint(&config("secret"));
        assert_eq!(minted.plaintext.len(), 64);
        assert_eq!(minted.hash, hash_refresh_token(&minted.plaintext));
        assert_ne!(minted.plaintext, minted.hash);

        let days = (minted.expires_at - Utc::now()).num_hours() / 24;
        assert!((6..=7).contains(&days));
    }
}
