//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /services               - Services index
//! GET  /services/{slug}        - Service detail + quote form
//! GET  /products               - Product catalogue (?category=)
//! GET  /products/{slug}        - Product detail + add-to-cart form
//! GET  /portfolio              - Portfolio grid
//! GET  /blog                   - Blog index
//! GET  /blog/{slug}            - Blog post
//! GET  /contact                - Contact page + quote form
//! GET  /about, /terms, /privacy - Markdown pages
//! GET  /sitemap.xml            - Sitemap
//! GET  /robots.txt             - Robots rules
//! GET  /health, /health/ready  - Health checks
//!
//! # Cart
//! GET  /cart                   - Cart page
//! GET  /api/cart               - Cart JSON
//! POST /cart/add               - Add a line (multipart with documents)
//! POST /cart/update            - Change a line's quantity (JSON)
//! POST /cart/remove            - Remove a line (JSON)
//! GET  /checkout               - Billing page
//! POST /checkout               - Submit the cart as an order
//!
//! # Lead capture API
//! POST /api/quote              - Quote request (multipart)
//! POST /api/order              - Direct order with documents (multipart)
//! POST /api/leads/whatsapp     - WhatsApp click lead (JSON)
//! POST /api/leads/phone        - Phone click lead (JSON)
//! ```

pub mod blog;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod health;
pub mod home;
pub mod leads;
pub mod order;
pub mod pages;
pub mod portfolio;
pub mod products;
pub mod quote;
pub mod seo;
pub mod services;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use signpress_core::Phone;

use crate::content::{Link, SiteInfo};
use crate::filters;
use crate::middleware::{cart_rate_limiter, lead_rate_limiter};
use crate::state::AppState;

/// Body limit for routes that accept uploads.
pub const UPLOAD_BODY_LIMIT: usize = 80 * 1024 * 1024;

/// Page metadata for `<head>`.
#[derive(Debug, Clone)]
pub struct Seo {
    pub title: String,
    pub description: String,
    pub canonical: String,
}

/// Data every page shares through `base.html`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub site: SiteInfo,
    pub seo: Seo,
    pub phone: String,
    pub phone_link: String,
    pub whatsapp_link: String,
    /// Services offered in the quote form and footer.
    pub services: Vec<Link>,
}

impl Layout {
    /// Build the layout for a page at `path`.
    #[must_use]
    pub fn new(state: &AppState, title: &str, description: &str, path: &str) -> Self {
        let site = state.content().site().clone();
        let business = &state.config().business;

        let full_title = if title.is_empty() || title == site.name {
            site.name.clone()
        } else {
            format!("{title} | {}", site.name)
        };
        let description = if description.is_empty() {
            site.description.clone()
        } else {
            description.to_string()
        };

        let phone_link = Phone::parse(&business.phone)
            .map(|p| p.tel_link())
            .unwrap_or_default();
        let whatsapp_link = Phone::parse(&business.whatsapp)
            .map(|p| p.whatsapp_link(Some(&format!("Hello {}, I would like a quote.", site.name))))
            .unwrap_or_default();

        let services = state
            .content()
            .services()
            .iter()
            .map(|s| Link {
                label: s.title.clone(),
                href: format!("/services/{}", s.slug),
            })
            .collect();

        Self {
            seo: Seo {
                title: full_title,
                description,
                canonical: state.config().absolute_url(path),
            },
            site,
            phone: business.phone.clone(),
            phone_link,
            whatsapp_link,
            services,
        }
    }
}

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
    pub quote_service: String,
}

/// Render the 404 page.
#[must_use]
pub fn not_found(state: &AppState) -> Response {
    let layout = Layout::new(state, "Page not found", "", "/404");
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            layout,
            quote_service: String::new(),
        },
    )
        .into_response()
}

/// Fallback handler for unknown paths.
pub async fn fallback(axum::extract::State(state): axum::extract::State<AppState>) -> Response {
    not_found(&state)
}

/// Lead capture API routes; every one of them sends an email.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(quote::router())
        .merge(order::router())
        .merge(leads::router())
        .layer(lead_rate_limiter())
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .merge(services::router())
        .merge(products::router())
        .merge(portfolio::router())
        .merge(blog::router())
        .merge(contact::router())
        .merge(pages::router())
        .merge(seo::router())
        .merge(health::router())
        .merge(cart::page_router())
        .merge(cart::router().layer(cart_rate_limiter()))
        .merge(checkout::router())
        .merge(api_routes())
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}
