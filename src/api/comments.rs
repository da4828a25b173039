use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::videos::visible_video;
use crate::api::{owner_summaries, parse_id, required_text, ApiResponse, ContentRequest, PageQuery};
use crate::auth::{assert_owner, AuthenticatedUser};
use crate::db::models::{Comment, CommentWithAuthor};
use crate::db::ContentStore;
use crate::error::AppError;
use crate::{AppState, Result};

async fn load_comment(state: &AppState, raw_id: &str) -> Result<Comment> {
    let id = parse_id(raw_id, "commentId")?;
    state
        .store
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))
}

pub async fn list_comments(
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let video_id = parse_id(&path, "videoId")?;
    visible_video(&state, video_id, user.id()).await?;

    let comments = state.store.list_comments(video_id, query.request()).await?;
    let authors = owner_summaries(state.store.as_ref(), comments.docs.iter().map(|c| c.owner_id)).await?;

    let page = comments.map(|comment| CommentWithAuthor {
        commented_by: authors.get(&comment.owner_id).cloned(),
        comment,
    });
    Ok(ApiResponse::ok(page, "Comments fetched"))
}

pub async fn add_comment(
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<ContentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let video_id = parse_id(&path, "videoId")?;
    let content = required_text(&req.content, "content")?;
    visible_video(&state, video_id, user.id()).await?;

    let comment = state.store.create_comment(video_id, user.id(), &content).await?;
    Ok(ApiResponse::created(comment, "Comment added"))
}

pub async fn update_comment(
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<ContentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let content = required_text(&req.content, "content")?;
    let comment = load_comment(&state, &path).await?;
    assert_owner(&comment, user.id())?;

    let updated = state
        .store
        .update_comment(comment.id, &content)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;
    Ok(ApiResponse::ok(updated, "Comment updated"))
}

pub async fn delete_comment(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let comment = load_comment(&state, &path).await?;
    assert_owner(&comment, user.id())?;

    state.store.delete_comment(comment.id).await?;
    Ok(ApiResponse::ok(json!({}), "Comment deleted"))
}
