//! Portfolio route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use tracing::instrument;

use crate::content::{PortfolioItem, Testimonial};
use crate::filters;
use crate::routes::Layout;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "portfolio.html")]
pub struct PortfolioTemplate {
    pub layout: Layout,
    pub items: Vec<PortfolioItem>,
    pub categories: Vec<String>,
    pub testimonials: Vec<Testimonial>,
}

/// Display past work.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let items = state.content().portfolio().to_vec();

    let mut categories: Vec<String> = Vec::new();
    for item in &items {
        if !categories.contains(&item.category) {
            categories.push(item.category.clone());
        }
    }

    PortfolioTemplate {
        layout: Layout::new(
            &state,
            "Our work",
            "Signage, vehicle graphics and print projects we have delivered across the UAE.",
            "/portfolio",
        ),
        items,
        categories,
        testimonials: state.content().testimonials().to_vec(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/portfolio", get(index))
}
