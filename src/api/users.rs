use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::api::{owner_summaries, ApiResponse};
use crate::auth::AuthenticatedUser;
use crate::db::models::{AccountUpdate, ChannelProfile, MediaRef, VideoWithOwner};
use crate::db::{ContentStore, EngagementStore, UserStore};
use crate::error::AppError;
use crate::media::{MediaKind, MediaStore, MediaUpload};
use crate::{AppState, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateAccountRequest {
    fn validate(self) -> Result<AccountUpdate> {
        let full_name = self.full_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let email = self
            .email
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        if full_name.is_none() && email.is_none() {
            return Err(AppError::validation("fullName or email is required"));
        }
        if matches!(&email, Some(e) if !e.contains('@')) {
            return Err(AppError::validation("email is invalid"));
        }
        Ok(AccountUpdate { full_name, email })
    }
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub avatar: Option<MediaUpload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImageRequest {
    pub cover_image: Option<MediaUpload>,
}

pub async fn current_user(user: AuthenticatedUser) -> Result<HttpResponse> {
    Ok(ApiResponse::ok(user.user, "Current user fetched"))
}

pub async fn update_account(
    user: AuthenticatedUser,
    req: web::Json<UpdateAccountRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let update = req.into_inner().validate()?;
    let updated = state
        .store
        .update_account(user.id(), update)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(ApiResponse::ok(updated.to_public(), "Account details updated"))
}

/// Removes a replaced file. The new one is already stored, so failures are only logged.
async fn discard_old(media: &dyn MediaStore, old: Option<MediaRef>) {
    if let Some(old) = old {
        if let Err(e) = media.delete(&old.public_id, MediaKind::Image).await {
            tracing::warn!(public_id = %old.public_id, "failed to delete replaced image: {}", e);
        }
    }
}

pub async fn update_avatar(
    user: AuthenticatedUser,
    req: web::Json<AvatarRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let upload = req
        .into_inner()
        .avatar
        .ok_or_else(|| AppError::validation("avatar file is missing"))?;

    let asset = state.media.upload(&upload, &user.user.username).await?;
    let updated = state
        .store
        .update_avatar(user.id(), asset.media_ref())
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    discard_old(state.media.as_ref(), Some(user.user.avatar)).await;
    Ok(ApiResponse::ok(updated.to_public(), "Avatar updated"))
}

pub async fn update_cover_image(
    user: AuthenticatedUser,
    req: web::Json<CoverImageRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let upload = req
        .into_inner()
        .cover_image
        .ok_or_else(|| AppError::validation("cover image file is missing"))?;

    let asset = state.media.upload(&upload, &user.user.username).await?;
    let updated = state
        .store
        .update_cover_image(user.id(), asset.media_ref())
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    discard_old(state.media.as_ref(), user.user.cover_image).await;
    Ok(ApiResponse::ok(updated.to_public(), "Cover image updated"))
}

pub async fn channel_profile(
    viewer: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let username = path.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::validation("username is missing"));
    }

    let channel = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("Channel"))?;

    let subscribers = state.store.subscribers_of(channel.id).await?;
    let subscribed_to = state.store.subscriptions_of(channel.id).await?;

    let profile = ChannelProfile {
        id: channel.id,
        username: channel.username.clone(),
        full_name: channel.full_name.clone(),
        email: channel.email.clone(),
        avatar: channel.avatar(),
        cover_image: channel.cover_image(),
        subscribers_count: subscribers.len(),
        channels_subscribed_to_count: subscribed_to.len(),
        is_subscribed: subscribers.iter().any(|s| s.subscriber_id == viewer.id()),
    };

    Ok(ApiResponse::ok(profile, "User channel fetched"))
}

/// Watched videos in history order, each with its owner.
pub async fn watch_history(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let history = &user.user.watch_history;
    let videos = state.store.find_videos(history).await?;
    let owners = owner_summaries(state.store.as_ref(), videos.iter().map(|v| v.owner_id)).await?;

    let watched: Vec<VideoWithOwner> = history
        .iter()
        .filter_map(|id| videos.iter().find(|v| v.id == *id))
        .map(|video| VideoWithOwner {
            owner: owners.get(&video.owner_id).cloned(),
            video: video.clone(),
        })
        .collect();

    Ok(ApiResponse::ok(watched, "Watch history fetched"))
}
