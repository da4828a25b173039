use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::{owner_summaries, parse_id, required_text, ApiResponse, PageQuery};
use crate::auth::{assert_owner, AuthenticatedUser};
use crate::db::models::{NewVideo, Video, VideoFilter, VideoUpdate, VideoWithOwner};
use crate::db::{ContentStore, UserStore};
use crate::error::AppError;
use crate::media::{MediaKind, MediaStore, MediaUpload};
use crate::{AppState, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishVideoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_file: Option<MediaUpload>,
    pub thumbnail: Option<MediaUpload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaUpload>,
}

async fn load_video(state: &AppState, raw_id: &str) -> Result<Video> {
    let id = parse_id(raw_id, "videoId")?;
    state
        .store
        .find_video(id)
        .await?
        .ok_or_else(|| AppError::not_found("Video"))
}

/// Unpublished videos exist for their owner only; everyone else gets a 404.
pub(crate) async fn visible_video(state: &AppState, id: Uuid, viewer: Uuid) -> Result<Video> {
    state
        .store
        .find_video(id)
        .await?
        .filter(|video| video.is_published || video.owner_id == viewer)
        .ok_or_else(|| AppError::not_found("Video"))
}

async fn with_owner(state: &AppState, video: Video) -> Result<VideoWithOwner> {
    let owner = state
        .store
        .find_user_by_id(video.owner_id)
        .await?
        .map(|u| u.summary());
    Ok(VideoWithOwner { video, owner })
}

/// Published videos, newest first, optionally limited to one owner.
pub async fn list_videos(
    _user: AuthenticatedUser,
    query: web::Query<VideoListQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let owner_id = match query.user_id.as_deref() {
        Some(raw) => Some(parse_id(raw, "userId")?),
        None => None,
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .request();

    let videos = state
        .store
        .list_videos(VideoFilter { owner_id, published_only: true }, page)
        .await?;
    let owners = owner_summaries(state.store.as_ref(), videos.docs.iter().map(|v| v.owner_id)).await?;

    let page = videos.map(|video| VideoWithOwner {
        owner: owners.get(&video.owner_id).cloned(),
        video,
    });
    Ok(ApiResponse::ok(page, "Videos fetched"))
}

pub async fn publish_video(
    user: AuthenticatedUser,
    req: web::Json<PublishVideoRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let title = required_text(&req.title, "title")?;
    let description = required_text(&req.description, "description")?;
    let video_file = req
        .video_file
        .ok_or_else(|| AppError::validation("videoFile is required"))?;
    let thumbnail = req
        .thumbnail
        .ok_or_else(|| AppError::validation("thumbnail is required"))?;
    if video_file.kind() != MediaKind::Video {
        return Err(AppError::validation("videoFile must be a video"));
    }

    let folder = &user.user.username;
    let uploaded = state.media.upload(&video_file, folder).await?;
    let thumb = state.media.upload(&thumbnail, folder).await?;

    let video = state
        .store
        .create_video(NewVideo {
            video_file: uploaded.media_ref(),
            thumbnail: thumb.media_ref(),
            title,
            description,
            duration: uploaded.duration.unwrap_or_default(),
            owner_id: user.id(),
        })
        .await?;

    tracing::info!(video_id = %video.id, owner = %user.id(), "video published");
    Ok(ApiResponse::created(video, "Video published"))
}

/// Counts a view and records it in the viewer's history.
pub async fn get_video(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = parse_id(&path, "videoId")?;
    let mut video = visible_video(&state, id, user.id()).await?;

    state.store.increment_video_views(video.id).await?;
    state.store.push_watch_history(user.id(), video.id).await?;
    video.views += 1;

    Ok(ApiResponse::ok(with_owner(&state, video).await?, "Video fetched"))
}

pub async fn update_video(
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<UpdateVideoRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let title = req.title.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let description = req.description.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if title.is_none() && description.is_none() && req.thumbnail.is_none() {
        return Err(AppError::validation("title, description or thumbnail is required"));
    }

    let video = load_video(&state, &path).await?;
    assert_owner(&video, user.id())?;

    let thumbnail = match &req.thumbnail {
        Some(upload) => Some(state.media.upload(upload, &user.user.username).await?.media_ref()),
        None => None,
    };
    let replaced = thumbnail.is_some();

    let updated = state
        .store
        .update_video(
            video.id,
            VideoUpdate {
                title: title.map(str::to_string),
                description: description.map(str::to_string),
                thumbnail,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Video"))?;

    if replaced {
        if let Err(e) = state.media.delete(&video.thumbnail_public_id, MediaKind::Image).await {
            tracing::warn!(video_id = %video.id, "failed to delete old thumbnail: {}", e);
        }
    }

    Ok(ApiResponse::ok(updated, "Video updated"))
}

/// Removes the thumbnail and the video file from the media store, then the record.
pub async fn delete_video(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let video = load_video(&state, &path).await?;
    assert_owner(&video, user.id())?;

    state
        .media
        .delete(&video.thumbnail_public_id, MediaKind::Image)
        .await?;
    state
        .media
        .delete(&video.video_public_id, MediaKind::Video)
        .await?;
    state.store.delete_video(video.id).await?;

    tracing::info!(video_id = %video.id, "video deleted");
    Ok(ApiResponse::ok(json!({}), "Video deleted"))
}

pub async fn toggle_publish(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let video = load_video(&state, &path).await?;
    assert_owner(&video, user.id())?;

    let updated = state
        .store
        .set_video_published(video.id, !video.is_published)
        .await?
        .ok_or_else(|| AppError::not_found("Video"))?;

    Ok(ApiResponse::ok(
        json!({ "isPublished": updated.is_published }),
        "Publish status toggled",
    ))
}
