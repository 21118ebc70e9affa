//! Static content page route handlers.
//!
//! Serves markdown-based content pages: about, terms and privacy.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::filters;
use crate::routes::{Layout, not_found};
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "page.html")]
pub struct ContentPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Serve a content page by slug, or the 404 page.
fn serve_content_page(state: &AppState, slug: &str) -> Response {
    let Some(page) = state.content().page(slug) else {
        return not_found(state);
    };

    ContentPageTemplate {
        layout: Layout::new(
            state,
            &page.meta.title,
            page.meta.description.as_deref().unwrap_or_default(),
            &format!("/{slug}"),
        ),
        title: page.meta.title.clone(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    }
    .into_response()
}

/// Display the About page.
#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> Response {
    serve_content_page(&state, "about")
}

/// Display the Terms and Conditions page.
#[instrument(skip(state))]
pub async fn terms(State(state): State<AppState>) -> Response {
    serve_content_page(&state, "terms")
}

/// Display the Privacy Policy page.
#[instrument(skip(state))]
pub async fn privacy(State(state): State<AppState>) -> Response {
    serve_content_page(&state, "privacy")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/terms", get(terms))
        .route("/privacy", get(privacy))
}
