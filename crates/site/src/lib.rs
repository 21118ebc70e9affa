//! Signpress site library.
//!
//! Marketing pages, the product catalogue with a document-carrying cart, and
//! the lead capture endpoints that relay every enquiry and order by email.
//! The binary in `main.rs` only loads configuration and serves [`app`];
//! integration tests drive the same router in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod multipart;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Build the full application router.
///
/// Layers, outermost first: Sentry, request tracing, request id, security
/// headers, sessions. Rate limits sit on the lead and cart routes only.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let static_dir = state.config().static_dir.clone();

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(routes::fallback)
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{BusinessConfig, CartConfig, EmailConfig, SiteConfig};
    use crate::content::ContentStore;
    use crate::services::email::EmailService;

    fn state(upload_dir: &Path) -> AppState {
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
        let config = SiteConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            content_dir: manifest.join("content"),
            static_dir: manifest.join("static"),
            cart: CartConfig {
                upload_dir: upload_dir.to_path_buf(),
                ..CartConfig::default()
            },
            email: EmailConfig {
                smtp_host: "localhost".to_string(),
                smtp_port: 2525,
                smtp_username: "site".to_string(),
                smtp_password: secrecy::SecretString::from("s3cr3t-relay-pass"),
                from_address: "web@signpress.test".to_string(),
                to_address: "sales@signpress.test".to_string(),
            },
            business: BusinessConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let content = ContentStore::load(&config.content_dir).unwrap();
        let email = EmailService::stub("web@signpress.test", "sales@signpress.test").unwrap();
        AppState::new(config, content, email)
    }

    async fn get(app: Router, path: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_app_serves_pages_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(state(dir.path()));

        assert_eq!(get(app.clone(), "/").await, StatusCode::OK);
        assert_eq!(get(app.clone(), "/static/css/main.css").await, StatusCode::OK);
        assert_eq!(get(app, "/definitely/missing").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_app_serves_cart_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(state(dir.path()));

        let request = Request::builder()
            .method("POST")
            .uri("/cart/remove")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(r#"{"id": "7d7f8d62-2b4b-4d0c-9d59-6f9b1f0d2a11"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
