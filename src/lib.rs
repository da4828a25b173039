pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod media;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthenticatedUser, CookieOptions, TokenService};
pub use db::{DbOperations, MemoryStore, Store};
pub use media::{CloudinaryClient, MediaStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Registers `state`, the extractor limits taken from its settings, `/health`
/// and the `/api/v1` tree.
pub fn configure_app(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let max_body_bytes = state.config.server.max_body_bytes;
        cfg.app_data(state)
            .configure(|cfg| api::extractor_config(cfg, max_body_bytes))
            .route("/health", web::get().to(health_check))
            .configure(api::configure);
    }
}

/// Application state shared across all workers. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn Store>,
    pub media: Arc<dyn MediaStore>,
    pub tokens: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub cookies: CookieOptions,
}

impl AppState {
    /// Connects the configured store (running migrations for Postgres) and
    /// the media client.
    pub async fn new(config: Settings) -> Result<Self> {
        let store: Arc<dyn Store> = if config.database.is_memory() {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        } else {
            let db = DbOperations::new_with_options(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(config.database.acquire_timeout_secs),
            )
            .await?;
            db.migrate().await?;
            tracing::info!("database connected and migrated");
            Arc::new(db)
        };

        let media: Arc<dyn MediaStore> = Arc::new(CloudinaryClient::new(&config.media)?);

        Ok(Self::with_parts(config, store, media))
    }

    pub fn with_parts(config: Settings, store: Arc<dyn Store>, media: Arc<dyn MediaStore>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.auth));
        let cookies = CookieOptions {
            secure: config.auth.secure_cookies,
            access_max_age: tokens.access_ttl(),
            refresh_max_age: tokens.refresh_ttl(),
        };
        let auth_service = Arc::new(AuthService::new(store.clone(), media.clone(), tokens.clone()));

        Self {
            config: Arc::new(config),
            store,
            media,
            tokens,
            auth_service,
            cookies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[tokio::test]
    async fn test_app_state_with_memory_store() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config).await.unwrap();
        assert!(!state.cookies.secure);
        assert_eq!(state.cookies.access_max_age, state.tokens.access_ttl());
    }

    #[tokio::test]
    async fn test_app_state_bad_database_url() {
        let mut config = Settings::new_for_test().unwrap();
        config.database.url = "postgres://nobody@127.0.0.1:1/none".into();
        config.database.acquire_timeout_secs = 1;
        let err = AppState::new(config).await.err().unwrap();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[actix_web::test]
    async fn test_health_check() {
        let config = Settings::new_for_test().unwrap();
        let state = AppState::new(config).await.unwrap();
        let app = test::init_service(App::new().configure(configure_app(web::Data::new(state)))).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }
}
