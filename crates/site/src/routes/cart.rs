//! Cart route handlers.
//!
//! Cart metadata lives in the session; uploaded documents live in the blob
//! store under the visitor's cart id. Mutations answer with the JSON
//! envelope so the page script can update the badge and toast notices.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Multipart, State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use signpress_core::cart::{Cart, CartItem, FileRef, MAX_QUANTITY, QuantityChange};
use signpress_core::upload::UploadSlot;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ApiError, ApiResponse, Result, add_breadcrumb};
use crate::filters;
use crate::multipart::{FormData, UploadedFile};
use crate::routes::Layout;
use crate::services::blobs::{BlobError, CartBlobs};
use crate::services::cart::{LoadedCart, VisitorCart};
use crate::services::orders::OrderError;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_slug: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Option<String>,
    pub line_total: Option<String>,
    pub files: Vec<FileView>,
}

/// An attached document on a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct FileView {
    pub label: &'static str,
    pub file_name: String,
}

/// Cart display data, shared by the page and `/api/cart`.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    /// Some lines are priced on request and excluded from the subtotal.
    pub has_unpriced: bool,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            product_slug: item.product_slug.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.map(|p| p.display()),
            line_total: item.line_total().map(|p| p.display()),
            files: item
                .files()
                .map(|(slot, file)| FileView {
                    label: slot.label(),
                    file_name: file.file_name.clone(),
                })
                .collect(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal().display(),
            has_unpriced: cart.items().iter().any(|item| item.unit_price.is_none()),
        }
    }
}

/// Body of `POST /cart/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: Uuid,
    pub quantity: u32,
}

/// Body of `POST /cart/remove`.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: Uuid,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub notice: Option<String>,
}

/// Join notices raised along the way into one message.
fn join_notices(notices: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    let parts: Vec<String> = notices.into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Parse the quantity field; blank means one.
pub(crate) fn parse_quantity(raw: Option<&str>) -> Result<u32> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(1);
    }
    match raw.parse::<u32>() {
        Ok(quantity) if (1..=MAX_QUANTITY).contains(&quantity) => Ok(quantity),
        _ => Err(ApiError::validation(format!(
            "Please enter a quantity between 1 and {MAX_QUANTITY}."
        ))),
    }
}

/// Display the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = VisitorCart::open(session, &state).await?;
    let LoadedCart { cart: items, notice } = cart.load().await?;
    let stashed = cart.take_notice().await?;

    Ok(CartShowTemplate {
        layout: Layout::new(&state, "Your cart", "", "/cart"),
        cart: CartView::from(&items),
        notice: join_notices([stashed, notice]),
    })
}

/// Cart contents as JSON.
#[instrument(skip(state, session))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<CartView>>> {
    let cart = VisitorCart::open(session, &state).await?;
    let LoadedCart { cart: items, notice } = cart.load().await?;
    let view = CartView::from(&items);

    Ok(match join_notices([cart.take_notice().await?, notice]) {
        Some(message) => ApiResponse::ok_with_message(view, message),
        None => ApiResponse::ok(view),
    })
}

/// Add a product line with its documents.
///
/// Multipart fields: `product`, `quantity`, and the files `emirates_id`,
/// `trade_license` and optionally `design`. Every file is validated before
/// any is stored. When the cart's blob quota is exhausted, the whole cart is
/// cleared and the visitor is asked to start again.
#[instrument(skip(state, session, multipart))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<ApiResponse<CartView>>> {
    let mut form = FormData::read(multipart).await?;

    let slug = form
        .text("product")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("Please choose a product."))?;
    let product = state
        .content()
        .product(slug)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("That product is no longer available.".to_string()))?;
    let quantity = parse_quantity(form.text("quantity"))?;

    let mut uploads: Vec<(UploadSlot, UploadedFile)> = Vec::new();
    for slot in UploadSlot::CART_SLOTS {
        match form.take_file(slot.field_name()) {
            Some(file) => {
                file.validate(slot)?;
                uploads.push((slot, file));
            }
            None if slot.is_mandatory() => {
                return Err(OrderError::MissingDocuments {
                    product: product.name.clone(),
                }
                .into());
            }
            None => {}
        }
    }

    let cart = VisitorCart::open(session, &state).await?;
    let LoadedCart {
        cart: mut items,
        notice: load_notice,
    } = cart.load().await?;

    let mut stored: Vec<(UploadSlot, FileRef)> = Vec::with_capacity(uploads.len());
    for (slot, file) in uploads {
        let key = CartBlobs::new_key();
        if let Err(err) = cart.blobs().store(&key, &file.bytes).await {
            return Err(abandon_upload(&cart, &stored, err).await);
        }
        stored.push((
            slot,
            FileRef {
                key,
                content_type: file.resolved_content_type(),
                size: file.size(),
                file_name: file.file_name,
            },
        ));
    }

    let mut emirates_id = None;
    let mut trade_license = None;
    let mut design = None;
    for (slot, file) in stored {
        match slot {
            UploadSlot::EmiratesId => emirates_id = Some(file),
            UploadSlot::TradeLicense => trade_license = Some(file),
            UploadSlot::Design | UploadSlot::QuoteAttachment => design = Some(file),
        }
    }
    let (Some(emirates_id), Some(trade_license)) = (emirates_id, trade_license) else {
        return Err(ApiError::Internal("mandatory documents lost after storing".to_string()));
    };

    items.add(CartItem {
        id: Uuid::new_v4(),
        product_slug: product.slug.clone(),
        product_name: product.name.clone(),
        unit_price: product.price,
        quantity,
        emirates_id,
        trade_license,
        design,
        added_at: chrono::Utc::now(),
    });

    let outcome = cart.save(items.clone()).await?;
    let saved = if outcome.is_lossy() {
        cart.load().await?.cart
    } else {
        items
    };

    let cart_id = cart.id().to_string();
    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("product", product.slug.as_str()), ("cart_id", cart_id.as_str())]),
    );
    tracing::info!(
        cart_id = %cart.id(),
        product = %product.slug,
        quantity,
        lines = saved.len(),
        "Added cart line"
    );

    let message = join_notices([
        Some(format!("{} added to your cart.", product.name)),
        load_notice,
        outcome.notice(),
    ])
    .unwrap_or_default();

    Ok(ApiResponse::ok_with_message(CartView::from(&saved), message))
}

/// Undo a half-finished upload.
///
/// A quota failure clears the whole cart; any other failure only releases the
/// files stored by this request.
async fn abandon_upload(cart: &VisitorCart, stored: &[(UploadSlot, FileRef)], err: BlobError) -> ApiError {
    if matches!(err, BlobError::QuotaExceeded { .. }) {
        tracing::warn!(cart_id = %cart.id(), error = %err, "Cart upload quota exceeded; clearing cart");
        if let Err(clear_err) = cart.clear().await {
            tracing::error!(cart_id = %cart.id(), error = %clear_err, "Failed to clear cart after quota failure");
        }
        if let Err(notice_err) = cart
            .set_notice("Your cart was cleared because the uploaded files were too large to keep.")
            .await
        {
            tracing::warn!(error = %notice_err, "Failed to stash cart notice");
        }
    } else {
        cart.blobs()
            .remove_all(stored.iter().map(|(_, file)| file.key.clone()).collect())
            .await;
    }
    ApiError::Storage(err)
}

/// Change a line's quantity; zero removes it.
#[instrument(skip(state, session, body))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<UpdateCartForm>, JsonRejection>,
) -> Result<Json<ApiResponse<CartView>>> {
    let Json(form) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    if form.quantity > MAX_QUANTITY {
        return Err(ApiError::validation(format!(
            "Please enter a quantity between 1 and {MAX_QUANTITY}."
        )));
    }

    let cart = VisitorCart::open(session, &state).await?;
    let mut items = cart.load().await?.cart;

    match items.set_quantity(form.id, form.quantity) {
        None => return Err(line_gone()),
        Some(QuantityChange::Removed(item)) => release(&cart, &item).await,
        Some(QuantityChange::Updated) => {}
    }

    let outcome = cart.save(items.clone()).await?;
    let view = CartView::from(&items);
    Ok(match outcome.notice() {
        Some(message) => ApiResponse::ok_with_message(view, message),
        None => ApiResponse::ok(view),
    })
}

/// Remove a line and its documents.
#[instrument(skip(state, session, body))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<RemoveFromCartForm>, JsonRejection>,
) -> Result<Json<ApiResponse<CartView>>> {
    let Json(form) = body.map_err(|e| ApiError::validation(e.body_text()))?;

    let cart = VisitorCart::open(session, &state).await?;
    let mut items = cart.load().await?.cart;

    let item = items.remove(form.id).ok_or_else(line_gone)?;
    release(&cart, &item).await;

    cart.save(items.clone()).await?;
    Ok(ApiResponse::ok_with_message(
        CartView::from(&items),
        format!("{} removed from your cart.", item.product_name),
    ))
}

fn line_gone() -> ApiError {
    ApiError::NotFound("That item is no longer in your cart.".to_string())
}

async fn release(cart: &VisitorCart, item: &CartItem) {
    cart.blobs()
        .remove_all(item.files().map(|(_, file)| file.key.clone()).collect())
        .await;
}

/// Read-only cart routes.
pub fn page_router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(show))
        .route("/api/cart", get(summary))
}

/// Cart mutations.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart/add", post(add))
        .route("/cart/update", post(update))
        .route("/cart/remove", post(remove))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_quantity_means_one() {
        assert_eq!(parse_quantity(None).unwrap(), 1);
        assert_eq!(parse_quantity(Some("  ")).unwrap(), 1);
        assert_eq!(parse_quantity(Some(" 250 ")).unwrap(), 250);
    }

    #[test]
    fn test_quantity_out_of_range() {
        assert!(parse_quantity(Some("0")).is_err());
        assert!(parse_quantity(Some("-3")).is_err());
        assert!(parse_quantity(Some("10001")).is_err());
        assert!(parse_quantity(Some("lots")).is_err());
    }

    #[test]
    fn test_join_notices_skips_missing() {
        assert_eq!(join_notices([None, None]), None);
        assert_eq!(
            join_notices([Some("a.".to_string()), None, Some("b.".to_string())]).as_deref(),
            Some("a. b.")
        );
    }
}
