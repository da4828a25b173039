#![allow(dead_code, unused_macros)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use vidtube_server::media::{MediaAsset, MediaKind, MediaStore, MediaUpload};
use vidtube_server::{AppState, MemoryStore, Settings};

/// Media store that hands out predictable ids and records deletions.
#[derive(Default)]
pub struct FakeMediaStore {
    uploads: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeMediaStore {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(&self, upload: &MediaUpload, folder: &str) -> vidtube_server::Result<MediaAsset> {
        upload.decode()?;
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        let public_id = format!("{}/{}", folder, n);
        Ok(MediaAsset {
            url: format!("https://media.test/{}", public_id),
            duration: (upload.kind() == MediaKind::Video).then_some(42.0),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str, _kind: MediaKind) -> vidtube_server::Result<()> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub fn test_state() -> (AppState, Arc<FakeMediaStore>) {
    state_with(Settings::new_for_test().expect("Failed to load test config"))
}

pub fn state_with(config: Settings) -> (AppState, Arc<FakeMediaStore>) {
    let media = Arc::new(FakeMediaStore::default());
    let state = AppState::with_parts(config, Arc::new(MemoryStore::new()), media.clone());
    (state, media)
}

pub fn file(name: &str, content_type: &str) -> Value {
    json!({ "fileName": name, "contentType": content_type, "data": "aGVsbG8=" })
}

pub fn register_body(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "fullName": "Test User",
        "password": "password123",
        "avatar": file("avatar.png", "image/png")
    })
}

/// Builds the full application around `$state`.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(vidtube_server::configure_app(actix_web::web::Data::new($state))),
        )
        .await
    };
}

/// Registers and logs in; evaluates to `(user_id, access_token, refresh_token)`.
macro_rules! signed_in {
    ($app:expr, $username:expr) => {{
        let email = format!("{}@example.com", $username);
        let resp = actix_web::test::TestRequest::post()
            .uri("/api/v1/users/register")
            .set_json(crate::common::register_body($username, &email))
            .send_request(&$app)
            .await;
        assert_eq!(resp.status(), 201);

        let resp = actix_web::test::TestRequest::post()
            .uri("/api/v1/users/login")
            .set_json(serde_json::json!({ "username": $username, "password": "password123" }))
            .send_request(&$app)
            .await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
            body["data"]["accessToken"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }};
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
