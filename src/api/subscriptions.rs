use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::{owner_summaries, parse_id, ApiResponse};
use crate::auth::AuthenticatedUser;
use crate::db::models::OwnerSummary;
use crate::db::{EngagementStore, UserStore};
use crate::error::AppError;
use crate::{AppState, Result};

pub async fn toggle_subscription(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let channel_id = parse_id(&path, "channelId")?;
    if channel_id == user.id() {
        return Err(AppError::validation("cannot subscribe to your own channel"));
    }
    if state.store.find_user_by_id(channel_id).await?.is_none() {
        return Err(AppError::not_found("Channel"));
    }

    let subscribed = state.store.toggle_subscription(user.id(), channel_id).await?;
    let message = if subscribed { "Subscribed" } else { "Unsubscribed" };
    Ok(ApiResponse::ok(json!({ "subscribed": subscribed }), message))
}

pub async fn channel_subscribers(
    _user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let channel_id = parse_id(&path, "channelId")?;
    let subscriptions = state.store.subscribers_of(channel_id).await?;
    let users = owner_summaries(state.store.as_ref(), subscriptions.iter().map(|s| s.subscriber_id)).await?;

    let subscribers: Vec<OwnerSummary> = subscriptions
        .iter()
        .filter_map(|s| users.get(&s.subscriber_id).cloned())
        .collect();
    Ok(ApiResponse::ok(subscribers, "Subscribers fetched"))
}

pub async fn subscribed_channels(
    _user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let subscriber_id = parse_id(&path, "subscriberId")?;
    let subscriptions = state.store.subscriptions_of(subscriber_id).await?;
    let users = owner_summaries(state.store.as_ref(), subscriptions.iter().map(|s| s.channel_id)).await?;

    let channels: Vec<OwnerSummary> = subscriptions
        .iter()
        .filter_map(|s| users.get(&s.channel_id).cloned())
        .collect();
    Ok(ApiResponse::ok(channels, "Subscribed channels fetched"))
}
