//! Checkout from the cart and the direct order API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use signpress_integration_tests::{
    MAIL_TO, MultipartForm, Relay, TestApp, TestOptions, billing, cart_line,
};

fn reference_of(body: &serde_json::Value) -> String {
    body["reference"].as_str().unwrap().to_string()
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_relays_cart_and_empties_it() {
    let app = TestApp::spawn().await;
    app.post_multipart("/cart/add", cart_line("business-cards", 1)).await;
    app.post_multipart(
        "/cart/add",
        cart_line("roll-up-banner", 2).file("design", "banner.pdf", "application/pdf", b"%PDF-1.4 art"),
    )
    .await;

    let response = app
        .post_multipart("/checkout", billing(MultipartForm::new()))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    let reference = reference_of(&body);
    assert!(reference.starts_with("SP-"));
    assert!(body["message"].as_str().unwrap().contains(&reference));

    let outbox = app.outbox().await;
    assert_eq!(outbox.len(), 1);
    let mail = outbox.first().unwrap();
    assert!(mail.contains(&format!("New order {reference} from Aisha Rahman")));
    assert!(mail.contains(MAIL_TO));
    assert!(mail.contains("business-cards-emirates_id.pdf"));
    assert!(mail.contains("business-cards-trade_license.pdf"));
    assert!(mail.contains("roll-up-banner-design.pdf"));

    let summary = app.get("/api/cart").await.json();
    assert_eq!(summary["item_count"], 0);
    assert!(app.state().blobs().root().read_dir().unwrap().next().is_none());
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_rejected() {
    let app = TestApp::spawn().await;
    let response = app
        .post_multipart("/checkout", billing(MultipartForm::new()))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message().unwrap(), "Your cart is empty.");
    assert!(app.outbox().await.is_empty());
}

#[tokio::test]
async fn test_checkout_validates_billing_before_cart() {
    let app = TestApp::spawn().await;
    app.post_multipart("/cart/add", cart_line("letterheads", 1)).await;

    let form = MultipartForm::new()
        .text("full_name", "Aisha Rahman")
        .text("phone", "050 123 4567");
    let response = app.post_multipart("/checkout", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message().unwrap(), "Please enter your email address.");

    // The cart survives a rejected checkout.
    let summary = app.get("/api/cart").await.json();
    assert_eq!(summary["item_count"], 1);
}

#[tokio::test]
async fn test_checkout_keeps_cart_when_relay_refuses() {
    let app = TestApp::with_options(TestOptions {
        relay: Relay::Refusing,
        ..TestOptions::default()
    })
    .await;
    app.post_multipart("/cart/add", cart_line("letterheads", 1)).await;

    let response = app
        .post_multipart("/checkout", billing(MultipartForm::new()))
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);

    let summary = app.get("/api/cart").await.json();
    assert_eq!(summary["item_count"], 1);
}

// =============================================================================
// Direct Order API
// =============================================================================

#[tokio::test]
async fn test_direct_order_with_documents() {
    let app = TestApp::spawn().await;
    let form = billing(MultipartForm::new())
        .text(
            "items",
            r#"[{"product": "flyers-a5", "quantity": 3}, {"product": "shop-facade-sign"}]"#,
        )
        .pdf("emirates_id_0", "id.pdf")
        .pdf("trade_license_0", "licence.pdf")
        .pdf("emirates_id_1", "id.pdf")
        .pdf("trade_license_1", "licence.pdf")
        .file("design_1", "sign.svg", "image/svg+xml", b"<svg/>");

    let response = app.post_multipart("/api/order", form).await;

    assert_eq!(response.status, StatusCode::OK);
    let reference = reference_of(&response.json());

    let outbox = app.outbox().await;
    let mail = outbox.first().unwrap();
    assert!(mail.contains(&reference));
    assert!(mail.contains("flyers-a5-emirates_id.pdf"));
    assert!(mail.contains("shop-facade-sign-design.svg"));
}

#[tokio::test]
async fn test_direct_order_missing_documents() {
    let app = TestApp::spawn().await;
    let form = billing(MultipartForm::new())
        .text("items", r#"[{"product": "letterheads", "quantity": 1}]"#)
        .pdf("emirates_id_0", "id.pdf");

    let response = app.post_multipart("/api/order", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message().unwrap(),
        "Please upload both the Emirates ID and the trade license for Letterheads."
    );
    assert!(app.outbox().await.is_empty());
}

#[tokio::test]
async fn test_direct_order_unknown_product() {
    let app = TestApp::spawn().await;
    let form = billing(MultipartForm::new())
        .text("items", r#"[{"product": "gold-cards"}]"#)
        .pdf("emirates_id_0", "id.pdf")
        .pdf("trade_license_0", "licence.pdf");

    let response = app.post_multipart("/api/order", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message().unwrap(), "Unknown product: gold-cards.");
}

#[tokio::test]
async fn test_direct_order_needs_items() {
    let app = TestApp::spawn().await;
    let response = app
        .post_multipart("/api/order", billing(MultipartForm::new()))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message().unwrap(),
        "Please add at least one product to your order."
    );
}
