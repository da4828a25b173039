use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::{parse_id, required_text, ApiResponse, ContentRequest};
use crate::auth::{assert_owner, AuthenticatedUser};
use crate::db::models::Tweet;
use crate::db::{ContentStore, UserStore};
use crate::error::AppError;
use crate::{AppState, Result};

async fn load_tweet(state: &AppState, raw_id: &str) -> Result<Tweet> {
    let id = parse_id(raw_id, "tweetId")?;
    state
        .store
        .find_tweet(id)
        .await?
        .ok_or_else(|| AppError::not_found("Tweet"))
}

pub async fn create_tweet(
    user: AuthenticatedUser,
    req: web::Json<ContentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let content = required_text(&req.content, "content")?;
    let tweet = state.store.create_tweet(user.id(), &content).await?;
    Ok(ApiResponse::created(tweet, "Tweet created"))
}

pub async fn user_tweets(
    _user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let owner_id = parse_id(&path, "userId")?;
    if state.store.find_user_by_id(owner_id).await?.is_none() {
        return Err(AppError::not_found("User"));
    }

    let tweets = state.store.list_tweets_by_owner(owner_id).await?;
    Ok(ApiResponse::ok(tweets, "Tweets fetched"))
}

pub async fn update_tweet(
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<ContentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let content = required_text(&req.content, "content")?;
    let tweet = load_tweet(&state, &path).await?;
    assert_owner(&tweet, user.id())?;

    let updated = state
        .store
        .update_tweet(tweet.id, &content)
        .await?
        .ok_or_else(|| AppError::not_found("Tweet"))?;
    Ok(ApiResponse::ok(updated, "Tweet updated"))
}

pub async fn delete_tweet(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let tweet = load_tweet(&state, &path).await?;
    assert_owner(&tweet, user.id())?;

    state.store.delete_tweet(tweet.id).await?;
    Ok(ApiResponse::ok(json!({}), "Tweet deleted"))
}
