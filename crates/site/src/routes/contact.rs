//! Contact page route handler.
//!
//! The page carries the quote form; submissions go to `/api/quote`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use tracing::instrument;

use crate::filters;
use crate::routes::Layout;
use crate::state::AppState;

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub emirates: Vec<String>,
    pub quote_service: String,
}

/// Display the contact page.
#[instrument(skip(state))]
pub async fn contact(State(state): State<AppState>) -> impl IntoResponse {
    ContactTemplate {
        layout: Layout::new(
            &state,
            "Contact us",
            "Call, WhatsApp or send us your brief for a free quote.",
            "/contact",
        ),
        emirates: state.content().site().emirates.clone(),
        quote_service: String::new(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/contact", get(contact))
}
