use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::api::ApiResponse;
use crate::auth::cookies::REFRESH_COOKIE_NAME;
use crate::auth::{AuthenticatedUser, ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::db::PublicUser;
use crate::{AppState, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received registration request for username: {}", req.username);
    let user = state.auth_service.register(req.into_inner()).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let session = match state.auth_service.login(&req).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Login failed for {:?}: {}", req.identifier(), e);
            return Err(e);
        }
    };

    let mut response = HttpResponse::Ok();
    state.cookies.set_session(&mut response, &session.tokens);

    Ok(ApiResponse::send(
        response,
        StatusCode::OK,
        LoginResponse {
            user: session.user,
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
        },
        "User logged in successfully",
    ))
}

pub async fn logout(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.auth_service.logout(user.id()).await?;

    let mut response = HttpResponse::Ok();
    state.cookies.clear_session(&mut response);
    Ok(ApiResponse::send(response, StatusCode::OK, json!({}), "User logged out"))
}

/// Cookie first, then the JSON body.
pub async fn refresh_token(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let incoming = req
        .cookie(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token));

    let tokens = state.auth_service.refresh(incoming.as_deref()).await?;

    let mut response = HttpResponse::Ok();
    state.cookies.set_session(&mut response, &tokens);
    Ok(ApiResponse::send(
        response,
        StatusCode::OK,
        TokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
        "Access token refreshed",
    ))
}

pub async fn change_password(
    user: AuthenticatedUser,
    req: web::Json<ChangePasswordRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.auth_service.change_password(user.id(), &req).await?;
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}
