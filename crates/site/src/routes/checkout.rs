//! Checkout route handlers.
//!
//! The checkout page collects billing details; submitting it assembles the
//! cart into an order, relays it by email and empties the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Multipart, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{ApiError, ApiResponse, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::lead_rate_limiter;
use crate::models::{Billing, BillingForm, Order};
use crate::multipart::FormData;
use crate::routes::Layout;
use crate::routes::cart::CartView;
use crate::services::cart::{LoadedCart, VisitorCart};
use crate::services::orders::assemble_order;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub emirates: Vec<String>,
    pub notice: Option<String>,
}

/// Order confirmation returned to the browser.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub reference: String,
}

/// Display the checkout page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = VisitorCart::open(session, &state).await?;
    let LoadedCart { cart: items, notice } = cart.load().await?;

    Ok(CheckoutTemplate {
        layout: Layout::new(&state, "Checkout", "", "/checkout"),
        cart: CartView::from(&items),
        emirates: state.content().site().emirates.clone(),
        notice,
    })
}

/// Submit the cart as an order.
///
/// The cart is only cleared after the relay accepts the message.
#[instrument(skip(state, session, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<ApiResponse<OrderPlaced>>> {
    let form = FormData::read(multipart).await?;
    let billing = Billing::try_from(form.fields::<BillingForm>()?)?;

    let cart = VisitorCart::open(session, &state).await?;
    let LoadedCart { cart: items, notice } = cart.load().await?;
    if let Some(notice) = notice {
        // Lines were purged on load; make the visitor review before sending.
        return Err(ApiError::validation(notice));
    }

    let lines = assemble_order(&items, cart.blobs()).await?;
    let order = Order::new(billing, lines);

    add_breadcrumb("order", "Submitting cart order", Some(&[("reference", order.reference.as_str())]));
    state.email().send_order(&order).await?;

    if let Err(e) = cart.clear().await {
        tracing::warn!(reference = %order.reference, error = %e, "Order sent but cart not cleared");
    }

    tracing::info!(
        reference = %order.reference,
        lines = order.lines.len(),
        "Cart order submitted"
    );

    let message = format!(
        "Thank you! Your order {} has been sent. We will contact you shortly.",
        order.reference
    );
    Ok(ApiResponse::ok_with_message(
        OrderPlaced {
            reference: order.reference,
        },
        message,
    ))
}

/// Checkout page and order submission; only submission is rate limited.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/checkout",
        get(show).merge(post(submit).layer(lead_rate_limiter())),
    )
}
