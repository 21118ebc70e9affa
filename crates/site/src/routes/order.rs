//! Direct order API.
//!
//! Takes billing details, the order lines as JSON and every line's documents
//! in a single multipart body, for pages that order without the cart.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use serde::Deserialize;
use signpress_core::cart::MAX_QUANTITY;
use signpress_core::upload::{UploadSlot, attachment_name};
use tracing::instrument;

use crate::error::{ApiError, ApiResponse, Result, add_breadcrumb};
use crate::models::{Billing, BillingForm, Order, OrderLine};
use crate::multipart::FormData;
use crate::routes::checkout::OrderPlaced;
use crate::services::orders::OrderError;
use crate::state::AppState;

/// Most lines one submission may carry.
pub const MAX_ORDER_LINES: usize = 20;

/// One entry of the `items` field.
#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub product: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Multipart field carrying `slot`'s file for line `index`.
fn file_field(slot: UploadSlot, index: usize) -> String {
    format!("{}_{index}", slot.field_name())
}

/// Parse the `items` field.
fn parse_items(raw: Option<&str>) -> Result<Vec<OrderItemInput>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        ApiError::validation("Please add at least one product to your order.")
    })?;
    let items: Vec<OrderItemInput> = serde_json::from_str(raw)
        .map_err(|_| ApiError::validation("The order items could not be read."))?;

    if items.is_empty() {
        return Err(ApiError::validation(
            "Please add at least one product to your order.",
        ));
    }
    if items.len() > MAX_ORDER_LINES {
        return Err(ApiError::validation(format!(
            "An order can hold at most {MAX_ORDER_LINES} products."
        )));
    }
    Ok(items)
}

/// Build the order lines, taking each line's files out of `form`.
fn build_lines(state: &AppState, form: &mut FormData, items: Vec<OrderItemInput>) -> Result<Vec<OrderLine>> {
    let mut lines = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let product = state
            .content()
            .product(item.product.trim())
            .ok_or_else(|| ApiError::validation(format!("Unknown product: {}.", item.product.trim())))?;

        if item.quantity == 0 || item.quantity > MAX_QUANTITY {
            return Err(ApiError::validation(format!(
                "Please enter a quantity between 1 and {MAX_QUANTITY} for {}.",
                product.name
            )));
        }

        let missing = UploadSlot::CART_SLOTS
            .into_iter()
            .filter(|slot| slot.is_mandatory())
            .any(|slot| !form.has_file(&file_field(slot, index)));
        if missing {
            return Err(OrderError::MissingDocuments {
                product: product.name.clone(),
            }
            .into());
        }

        let mut attachments = Vec::new();
        for slot in UploadSlot::CART_SLOTS {
            if let Some(file) = form.take_file(&file_field(slot, index)) {
                let mut attachment = file.into_attachment(slot)?;
                attachment.file_name = attachment_name(&product.slug, slot, &attachment.file_name);
                attachments.push(attachment);
            }
        }

        lines.push(OrderLine {
            product_slug: product.slug.clone(),
            product_name: product.name.clone(),
            quantity: item.quantity,
            unit_price: product.price,
            attachments,
        });
    }

    Ok(lines)
}

/// Accept an order with its documents and relay it by email.
#[instrument(skip(state, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<OrderPlaced>>> {
    let mut form = FormData::read(multipart).await?;
    let billing = Billing::try_from(form.fields::<BillingForm>()?)?;
    let items = parse_items(form.text("items"))?;
    let lines = build_lines(&state, &mut form, items)?;

    let order = Order::new(billing, lines);
    add_breadcrumb("order", "Submitting direct order", Some(&[("reference", order.reference.as_str())]));
    state.email().send_order(&order).await?;

    tracing::info!(
        reference = %order.reference,
        lines = order.lines.len(),
        attachments = order.attachments().count(),
        "Order relayed"
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

pub fn router() -> Router<AppState> {
    Router::new().route("/api/order", post(submit))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct OrderItemEcho<'a> {
        product: &'a str,
        quantity: u32,
    }

    #[test]
    fn test_file_fields_are_indexed() {
        assert_eq!(file_field(UploadSlot::EmiratesId, 0), "emirates_id_0");
        assert_eq!(file_field(UploadSlot::Design, 3), "design_3");
    }

    #[test]
    fn test_items_default_quantity() {
        let items = parse_items(Some(r#"[{"product": "flyers"}]"#)).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().quantity, 1);
    }

    #[test]
    fn test_items_must_not_be_empty() {
        assert!(parse_items(None).is_err());
        assert!(parse_items(Some("[]")).is_err());
        assert!(parse_items(Some("not json")).is_err());
    }

    #[test]
    fn test_items_are_capped() {
        let many = serde_json::to_string(
            &(0..=MAX_ORDER_LINES)
                .map(|_| OrderItemEcho {
                    product: "flyers",
                    quantity: 1,
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();
        assert!(parse_items(Some(&many)).is_err());
    }
}
