//! Request extractor that resolves the calling principal from an access token.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::auth::cookies::ACCESS_COOKIE_NAME;
use crate::db::{PublicUser, UserStore};
use crate::error::{AppError, AuthError};
use crate::AppState;

/// The verified principal behind the current request.
///
/// Taking this as a handler argument puts the handler behind the gate:
/// a missing, invalid or expired access token, or a token naming a
/// principal that no longer exists, rejects the request with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: PublicUser,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

/// The `accessToken` cookie wins over an `Authorization: Bearer` header.
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_COOKIE_NAME) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_owned());
        }
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = extract_token(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("application state not configured".into()))?;
            let token = token.ok_or(AuthError::MissingToken)?;

            let claims = state.tokens.verify_access(&token)?;
            let user = state.store.find_user_by_id(claims.id).await?.ok_or_else(|| {
                tracing::warn!(user_id = %claims.id, "access token names a missing user");
                AuthError::InvalidToken
            })?;

            Ok(AuthenticatedUser {
                user: user.to_public(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_header() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_cookie_takes_precedence() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_COOKIE_NAME, "from-cookie"))
            .insert_header((AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_empty_cookie_falls_back_to_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_COOKIE_NAME, ""))
            .insert_header((AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_missing_or_malformed() {
        assert!(extract_token(&TestRequest::default().to_http_request()).is_none());

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwdw=="))
            .to_http_request();
        assert!(extract_token(&req).is_none());

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert!(extract_token(&req).is_none());
    }
}
