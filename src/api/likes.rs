use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::videos::visible_video;
use crate::api::{owner_summaries, parse_id, ApiResponse};
use crate::auth::AuthenticatedUser;
use crate::db::models::{LikeTarget, VideoWithOwner};
use crate::db::{ContentStore, EngagementStore};
use crate::error::AppError;
use crate::{AppState, Result};

/// Likes the target for the caller, or removes the caller's existing like.
/// Videos and their comments follow the same visibility as `GET /videos/{id}`.
async fn toggle(state: &AppState, user: &AuthenticatedUser, target: LikeTarget) -> Result<HttpResponse> {
    match target {
        LikeTarget::Video(id) => {
            visible_video(state, id, user.id()).await?;
        }
        LikeTarget::Comment(id) => {
            let comment = state
                .store
                .find_comment(id)
                .await?
                .ok_or_else(|| AppError::not_found(target.label()))?;
            visible_video(state, comment.video_id, user.id()).await?;
        }
        LikeTarget::Tweet(id) => {
            if state.store.find_tweet(id).await?.is_none() {
                return Err(AppError::not_found(target.label()));
            }
        }
    }

    let liked = state.store.toggle_like(user.id(), target).await?.is_some();
    let message = if liked {
        format!("{} liked", target.label())
    } else {
        format!("{} unliked", target.label())
    };
    Ok(ApiResponse::ok(json!({ "isLiked": liked }), message))
}

pub async fn toggle_video_like(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = parse_id(&path, "videoId")?;
    toggle(&state, &user, LikeTarget::Video(id)).await
}

pub async fn toggle_comment_like(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = parse_id(&path, "commentId")?;
    toggle(&state, &user, LikeTarget::Comment(id)).await
}

pub async fn toggle_tweet_like(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = parse_id(&path, "tweetId")?;
    toggle(&state, &user, LikeTarget::Tweet(id)).await
}

/// Videos the caller liked, most recent like first.
pub async fn liked_videos(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let likes = state.store.liked_videos(user.id()).await?;
    let ids: Vec<_> = likes.iter().filter_map(|like| like.video_id).collect();

    let videos = state.store.find_videos(&ids).await?;
    let owners = owner_summaries(state.store.as_ref(), videos.iter().map(|v| v.owner_id)).await?;

    let liked: Vec<VideoWithOwner> = ids
        .iter()
        .filter_map(|id| videos.iter().find(|v| v.id == *id))
        .map(|video| VideoWithOwner {
            owner: owners.get(&video.owner_id).cloned(),
            video: video.clone(),
        })
        .collect();

    Ok(ApiResponse::ok(liked, "Liked videos fetched"))
}
