//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use tracing::instrument;

use crate::content::{Post, Product, Service, Testimonial};
use crate::filters;
use crate::routes::Layout;
use crate::state::AppState;

const FEATURED_SERVICES: usize = 6;
const FEATURED_PRODUCTS: usize = 4;
const RECENT_POSTS: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub services: Vec<Service>,
    pub products: Vec<Product>,
    pub testimonials: Vec<Testimonial>,
    pub posts: Vec<Post>,
    pub quote_service: String,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let content = state.content();
    let site = content.site();

    HomeTemplate {
        layout: Layout::new(&state, &site.name, &site.description, "/"),
        services: content
            .featured_services(FEATURED_SERVICES)
            .into_iter()
            .cloned()
            .collect(),
        products: content
            .featured_products(FEATURED_PRODUCTS)
            .into_iter()
            .cloned()
            .collect(),
        testimonials: content.testimonials().to_vec(),
        posts: content
            .recent_posts(RECENT_POSTS, None)
            .into_iter()
            .cloned()
            .collect(),
        quote_service: String::new(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}
