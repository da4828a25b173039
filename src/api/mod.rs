//! `/api/v1` routes. Handlers take [`AuthenticatedUser`](crate::AuthenticatedUser)
//! when they sit behind the gate.

mod comments;
mod likes;
mod response;
mod subscriptions;
mod tweets;
mod users;
mod videos;

pub use response::ApiResponse;

use std::collections::HashMap;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::handlers as session;
use crate::db::models::{OwnerSummary, PageRequest};
use crate::db::{Store, UserStore};
use crate::error::AppError;
use crate::Result;

/// Extractor settings so body, query and path failures render like every other [`AppError`].
pub fn extractor_config(cfg: &mut web::ServiceConfig, max_body_bytes: usize) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(max_body_bytes)
            .error_handler(json_error),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .app_data(web::PathConfig::default().error_handler(path_error));
}

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), "rejected JSON body: {}", err);
    match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            AppError::PayloadTooLarge(err.to_string()).into()
        }
        _ => AppError::validation(err.to_string()).into(),
    }
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation(err.to_string()).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation(err.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/users")
                    .route("/register", web::post().to(session::register))
                    .route("/login", web::post().to(session::login))
                    .route("/refresh-token", web::post().to(session::refresh_token))
                    .route("/logout", web::post().to(session::logout))
                    .route("/change-password", web::post().to(session::change_password))
                    .route("/current-user", web::get().to(users::current_user))
                    .route("/update-account", web::patch().to(users::update_account))
                    .route("/avatar", web::patch().to(users::update_avatar))
                    .route("/cover-image", web::patch().to(users::update_cover_image))
                    .route("/channel/{username}", web::get().to(users::channel_profile))
                    .route("/history", web::get().to(users::watch_history)),
            )
            .service(
                web::scope("/videos")
                    .route("", web::get().to(videos::list_videos))
                    .route("", web::post().to(videos::publish_video))
                    .route("/toggle/publish/{video_id}", web::patch().to(videos::toggle_publish))
                    .route("/{video_id}", web::get().to(videos::get_video))
                    .route("/{video_id}", web::patch().to(videos::update_video))
                    .route("/{video_id}", web::delete().to(videos::delete_video)),
            )
            .service(
                web::scope("/comments")
                    .route("/c/{comment_id}", web::patch().to(comments::update_comment))
                    .route("/c/{comment_id}", web::delete().to(comments::delete_comment))
                    .route("/{video_id}", web::get().to(comments::list_comments))
                    .route("/{video_id}", web::post().to(comments::add_comment)),
            )
            .service(
                web::scope("/tweets")
                    .route("", web::post().to(tweets::create_tweet))
                    .route("/user/{user_id}", web::get().to(tweets::user_tweets))
                    .route("/{tweet_id}", web::patch().to(tweets::update_tweet))
                    .route("/{tweet_id}", web::delete().to(tweets::delete_tweet)),
            )
            .service(
                web::scope("/likes")
                    .route("/toggle/video/{video_id}", web::post().to(likes::toggle_video_like))
                    .route("/toggle/comment/{comment_id}", web::post().to(likes::toggle_comment_like))
                    .route("/toggle/tweet/{tweet_id}", web::post().to(likes::toggle_tweet_like))
                    .route("/videos", web::get().to(likes::liked_videos)),
            )
            .service(
                web::scope("/subscriptions")
                    .route("/channel/{channel_id}", web::post().to(subscriptions::toggle_subscription))
                    .route("/channel/{channel_id}", web::get().to(subscriptions::channel_subscribers))
                    .route("/subscriber/{subscriber_id}", web::get().to(subscriptions::subscribed_channels)),
            ),
    );
}

/// Malformed ids are a client error, not a missing route.
pub(crate) fn parse_id(raw: &str, name: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("invalid {}", name)))
}

pub(crate) fn required_text(value: &str, name: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", name)));
    }
    Ok(trimmed.to_string())
}

/// Body of comment and tweet writes.
#[derive(Debug, Default, Deserialize)]
pub struct ContentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Summaries for every distinct id in `ids`, keyed by id.
pub(crate) async fn owner_summaries(
    store: &dyn Store,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, OwnerSummary>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();

    Ok(store
        .find_users(&ids)
        .await?
        .iter()
        .map(|user| (user.id, user.summary()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "videoId").unwrap(), id);

        let err = parse_id("nope", "videoId").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.to_string().contains("videoId"));
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  hi ", "content").unwrap(), "hi");
        assert_eq!(required_text("   ", "content").unwrap_err().kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_page_query_defaults() {
        let page = PageQuery::default().request();
        assert_eq!((page.page, page.limit), (1, 10));

        let page = PageQuery { page: Some(0), limit: Some(500) }.request();
        assert_eq!((page.page, page.limit), (1, 100));
    }
}
