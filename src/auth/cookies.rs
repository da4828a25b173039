//! Session cookies set by the session handlers and read by the auth gate.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::HttpResponseBuilder;

use crate::auth::token::TokenPair;

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Attributes shared by both session cookies. Built once from settings.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub secure: bool,
    pub access_max_age: chrono::Duration,
    pub refresh_max_age: chrono::Duration,
}

impl CookieOptions {
    fn build<'c>(&self, name: &'c str, value: String, max_age: chrono::Duration) -> Cookie<'c> {
        Cookie::build(name, value)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(max_age.num_seconds()))
            .finish()
    }

    pub fn access_cookie(&self, token: &str) -> Cookie<'static> {
        self.build(ACCESS_COOKIE_NAME, token.to_owned(), self.access_max_age)
    }

    pub fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        self.build(REFRESH_COOKIE_NAME, token.to_owned(), self.refresh_max_age)
    }

    pub fn set_session(&self, response: &mut HttpResponseBuilder, tokens: &TokenPair) {
        response
            .cookie(self.access_cookie(&tokens.access_token))
            .cookie(self.refresh_cookie(&tokens.refresh_token));
    }

    pub fn clear_session(&self, response: &mut HttpResponseBuilder) {
        for name in [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME] {
            let mut cookie = self.build(name, String::new(), chrono::Duration::zero());
            cookie.make_removal();
            response.cookie(cookie);
        }
    }
}
