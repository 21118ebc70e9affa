//! Rendered pages, not-found handling and the crawler endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use signpress_integration_tests::TestApp;

// =============================================================================
// Content Pages
// =============================================================================

#[tokio::test]
async fn test_home_page_renders() {
    let app = TestApp::spawn().await;
    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Printing and signage that gets your business noticed"));
    assert!(html.contains("Shop Signage"));
    assert!(html.contains("Getting a shop sign permit in Dubai"));
}

#[tokio::test]
async fn test_every_listed_page_renders() {
    let app = TestApp::spawn().await;

    for path in [
        "/services",
        "/services/vehicle-graphics",
        "/products",
        "/products/roll-up-banner",
        "/portfolio",
        "/blog",
        "/blog/vehicle-wrap-care",
        "/contact",
        "/about",
        "/terms",
        "/privacy",
        "/cart",
        "/checkout",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::OK, "{path}");
        assert!(response.text().contains("<html"), "{path}");
    }
}

#[tokio::test]
async fn test_product_page_shows_price_or_request() {
    let app = TestApp::spawn().await;

    let priced = app.get("/products/business-cards").await.text();
    assert!(priced.contains("120.00"));

    let unpriced = app.get("/products/shop-facade-sign").await.text();
    assert!(unpriced.contains("Price on request"));
}

#[tokio::test]
async fn test_catalogue_filters_by_category() {
    let app = TestApp::spawn().await;
    let html = app.get("/products?category=Exhibition").await.text();

    assert!(html.contains("Roll-up Banner"));
    assert!(!html.contains("Letterheads"));
}

#[tokio::test]
async fn test_legal_page_shows_update_date() {
    let app = TestApp::spawn().await;
    let html = app.get("/terms").await.text();

    assert!(html.contains("Terms and Conditions"));
    assert!(html.contains("2026"));
}

// =============================================================================
// Not Found
// =============================================================================

#[tokio::test]
async fn test_unknown_routes_render_not_found_page() {
    let app = TestApp::spawn().await;

    for path in [
        "/no-such-page",
        "/services/holograms",
        "/products/gold-plated-cards",
        "/blog/no-such-post",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
        assert!(response.text().contains("<html"), "{path}");
    }
}

#[tokio::test]
async fn test_draft_posts_are_hidden() {
    let app = TestApp::spawn().await;

    let response = app.get("/blog/draft-price-list").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let index = app.get("/blog").await.text();
    assert!(!index.contains("Our 2026 price list"));
}

// =============================================================================
// Crawlers
// =============================================================================

#[tokio::test]
async fn test_sitemap_lists_public_urls() {
    let app = TestApp::spawn().await;
    let response = app.get("/sitemap.xml").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .header("content-type")
            .unwrap()
            .starts_with("application/xml")
    );
    let xml = response.text();
    assert!(xml.contains("<loc>https://signpress.test/services/shop-signage</loc>"));
    assert!(xml.contains("<loc>https://signpress.test/blog/shop-sign-permits-dubai</loc>"));
    assert!(!xml.contains("draft-price-list"));
    assert!(!xml.contains("/checkout"));
}

#[tokio::test]
async fn test_robots_points_at_sitemap() {
    let app = TestApp::spawn().await;
    let body = app.get("/robots.txt").await.text();

    assert!(body.contains("Disallow: /api/"));
    assert!(body.contains("Sitemap: https://signpress.test/sitemap.xml"));
}

// =============================================================================
// Health and Headers
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.text(), "ok");

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let app = TestApp::spawn().await;
    let response = app.get("/").await;

    assert_eq!(response.header("x-frame-options"), Some("DENY"));
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let app = TestApp::spawn().await;
    let response = app.get("/static/js/site.js").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("data-api-form"));
}
