//! Service route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use crate::content::{PortfolioItem, Service};
use crate::filters;
use crate::routes::{Layout, not_found};
use crate::state::AppState;

/// Services index template.
#[derive(Template, WebTemplate)]
#[template(path = "services/index.html")]
pub struct ServicesIndexTemplate {
    pub layout: Layout,
    pub services: Vec<Service>,
    pub quote_service: String,
}

/// Service detail template.
#[derive(Template, WebTemplate)]
#[template(path = "services/show.html")]
pub struct ServiceShowTemplate {
    pub layout: Layout,
    pub service: Service,
    /// Portfolio pieces in the same category.
    pub work: Vec<PortfolioItem>,
    pub quote_service: String,
}

/// Display all services.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    ServicesIndexTemplate {
        layout: Layout::new(
            &state,
            "Services",
            "Printing, signage and branding services across the UAE.",
            "/services",
        ),
        services: state.content().services().to_vec(),
        quote_service: String::new(),
    }
}

/// Display a single service with its quote form.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(service) = state.content().service(&slug).cloned() else {
        return not_found(&state);
    };

    let work = state
        .content()
        .portfolio()
        .iter()
        .filter(|item| item.category.eq_ignore_ascii_case(&service.title))
        .take(6)
        .cloned()
        .collect();

    ServiceShowTemplate {
        layout: Layout::new(
            &state,
            &service.title,
            &service.summary,
            &format!("/services/{}", service.slug),
        ),
        quote_service: service.title.clone(),
        service,
        work,
    }
    .into_response()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/services", get(index))
        .route("/services/{slug}", get(show))
}
