use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{TokenPair, TokenService};
use crate::db::models::NewUser;
use crate::db::{PublicUser, Store, UserStore};
use crate::error::{AppError, AuthError};
use crate::media::{MediaStore, MediaUpload};
use crate::Result;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
    pub avatar: Option<MediaUpload>,
    pub cover_image: Option<MediaUpload>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("username", &self.username),
            ("email", &self.email),
            ("fullName", &self.full_name),
            ("password", &self.password),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::validation(format!("{} is required", name)));
        }
        if !self.email.contains('@') {
            return Err(AppError::validation("email is invalid"));
        }
        if self.avatar.is_none() {
            return Err(AppError::validation("avatar file is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Email wins when both are given. Lowercased to match stored identities.
    pub fn identifier(&self) -> Option<String> {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<()> {
        if self.old_password.is_empty() || self.new_password.is_empty() {
            return Err(AppError::validation("oldPassword and newPassword are required"));
        }
        Ok(())
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Owns the session lifecycle: register, login, refresh rotation, logout and
/// password change. Each principal has at most one live refresh token.
pub struct AuthService {
    store: Arc<dyn Store>,
    media: Arc<dyn MediaStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, media: Arc<dyn MediaStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, media, tokens }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<PublicUser> {
        request.validate()?;

        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_lowercase();

        for identity in [&username, &email] {
            if self.store.find_user_by_identity(identity).await?.is_some() {
                tracing::warn!(%username, %email, "registration rejected: identity taken");
                return Err(AppError::Conflict("User with email or username already exists".into()));
            }
        }

        let avatar_upload = request
            .avatar
            .as_ref()
            .ok_or_else(|| AppError::validation("avatar file is required"))?;
        let avatar = self.media.upload(avatar_upload, &username).await?;
        let cover_image = match &request.cover_image {
            Some(upload) => Some(self.media.upload(upload, &username).await?.media_ref()),
            None => None,
        };

        let user = self
            .store
            .create_user(NewUser {
                username,
                email,
                full_name: request.full_name.trim().to_string(),
                password_hash: hash_password(&request.password)?,
                avatar: avatar.media_ref(),
                cover_image,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user.to_public())
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<Session> {
        let identifier = request
            .identifier()
            .ok_or_else(|| AppError::validation("username or email is required"))?;

        let user = self
            .store
            .find_user_by_identity(&identifier)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.tokens.issue_pair(&user)?;
        self.store
            .set_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(Session {
            user: user.to_public(),
            tokens,
        })
    }

    /// Clearing an already-cleared token is fine.
    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        self.store.set_refresh_token(user_id, None).await?;
        tracing::info!(%user_id, "user logged out");
        Ok(())
    }

    /// Exchanges the live refresh token for a new pair. The presented token
    /// stops working once the new one is stored.
    pub async fn refresh(&self, incoming: Option<&str>) -> Result<TokenPair> {
        let incoming = incoming
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify_refresh(incoming)?;
        let user = self
            .store
            .find_user_by_id(claims.id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if user.refresh_token.as_deref() != Some(incoming) {
            tracing::warn!(user_id = %user.id, "refresh rejected: token is not the live one");
            return Err(AuthError::RefreshTokenMismatch.into());
        }

        let tokens = self.tokens.issue_pair(&user)?;
        self.store
            .set_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;

        tracing::info!(user_id = %user.id, "rotated refresh token");
        Ok(tokens)
    }

    /// Existing sessions stay valid after a password change.
    pub async fn change_password(&self, user_id: Uuid, request: &ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !verify_password(&request.old_password, &user.password_hash)? {
            return Err(AuthError::PasswordMismatch.into());
        }

        let hash = hash_password(&request.new_password)?;
        self.store.update_password_hash(user_id, &hash).await?;
        tracing::info!(%user_id, "password changed");
        Ok(())
    }
}
