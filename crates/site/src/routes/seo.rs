//! Sitemap and robots handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::state::AppState;

/// One `<url>` entry.
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
    pub priority: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "sitemap.xml")]
pub struct SitemapTemplate {
    pub urls: Vec<SitemapUrl>,
}

/// Every public URL with its priority.
fn sitemap_urls(state: &AppState) -> Vec<SitemapUrl> {
    let config = state.config();
    let content = state.content();
    let url = |path: &str, priority: &'static str, lastmod: Option<NaiveDate>| SitemapUrl {
        loc: config.absolute_url(path),
        lastmod,
        priority,
    };

    let mut urls = vec![
        url("/", "1.0", None),
        url("/services", "0.9", None),
        url("/products", "0.9", None),
        url("/portfolio", "0.7", None),
        url("/blog", "0.6", None),
        url("/contact", "0.8", None),
    ];
    urls.extend(
        content
            .services()
            .iter()
            .map(|s| url(&format!("/services/{}", s.slug), "0.8", None)),
    );
    urls.extend(
        content
            .products()
            .iter()
            .map(|p| url(&format!("/products/{}", p.slug), "0.7", None)),
    );
    urls.extend(
        ["about", "terms", "privacy"]
            .into_iter()
            .filter_map(|slug| content.page(slug))
            .map(|page| url(&format!("/{}", page.slug), "0.3", page.meta.updated_at)),
    );
    urls.extend(content.published_posts().map(|post| {
        url(
            &format!("/blog/{}", post.slug),
            "0.5",
            Some(post.meta.published_at),
        )
    }));
    urls
}

/// Serve `sitemap.xml`.
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        SitemapTemplate {
            urls: sitemap_urls(&state),
        },
    )
}

/// Serve `robots.txt`.
#[instrument(skip(state))]
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /cart\nDisallow: /checkout\n\nSitemap: {}\n",
        state.config().absolute_url("/sitemap.xml")
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots))
}
