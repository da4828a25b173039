//! Access and refresh token issuance/verification.
//!
//! Both token kinds are HS256 JWTs signed with distinct secrets. Access tokens
//! carry the principal's identity claims; refresh tokens carry only the id plus
//! a random `jti`, so two refresh tokens minted in the same second still differ.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::User;
use crate::error::AuthError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenService {
    pub fn new(
        access_secret: &str,
        access_ttl: Duration,
        refresh_secret: &str,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access: SigningKeys::new(access_secret, access_ttl),
            refresh: SigningKeys::new(refresh_secret, refresh_ttl),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.access_token_secret,
            Duration::minutes(config.access_token_expiry_minutes),
            &config.refresh_token_secret,
            Duration::days(config.refresh_token_expiry_days),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.access.ttl).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.access.encoding)?)
    }

    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            id: user.id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.refresh.ttl).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.refresh.encoding)?)
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
        })
    }

    /// Expired, forged and malformed tokens all fail with [`AuthError::InvalidToken`].
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.access.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken.into())
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken.into())
    }
}
