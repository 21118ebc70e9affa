//! Product catalogue route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use signpress_core::cart::MAX_QUANTITY;
use signpress_core::upload::UploadSlot;
use tracing::instrument;

use crate::content::{Product, category_href};
use crate::filters;
use crate::routes::{Layout, not_found};
use crate::state::AppState;

/// Query parameters for the catalogue.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogueQuery {
    pub category: Option<String>,
}

/// A category filter chip.
pub struct CategoryChip {
    pub name: String,
    pub href: String,
    pub active: bool,
}

/// Upload field on the add-to-cart form.
pub struct UploadField {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub accept: String,
    pub max_mb: u64,
}

impl From<UploadSlot> for UploadField {
    fn from(slot: UploadSlot) -> Self {
        Self {
            name: slot.field_name(),
            label: match slot {
                UploadSlot::EmiratesId => "Emirates ID",
                UploadSlot::TradeLicense => "Trade license",
                UploadSlot::Design | UploadSlot::QuoteAttachment => "Design file (optional)",
            },
            required: slot.is_mandatory(),
            accept: slot
                .allowed_extensions()
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(","),
            max_mb: slot.max_bytes() / (1024 * 1024),
        }
    }
}

/// Catalogue template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
    pub categories: Vec<CategoryChip>,
    pub category: Option<String>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: Product,
    pub related: Vec<Product>,
    pub uploads: Vec<UploadField>,
    pub max_quantity: u32,
}

/// Display the catalogue, optionally filtered by category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogueQuery>,
) -> impl IntoResponse {
    let content = state.content();
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string);

    let mut categories = vec![CategoryChip {
        name: "All".to_string(),
        href: "/products".to_string(),
        active: category.is_none(),
    }];
    categories.extend(content.categories().into_iter().map(|name| CategoryChip {
        href: category_href(name),
        active: category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(name)),
        name: name.to_string(),
    }));

    let title = category
        .as_deref()
        .map_or_else(|| "Products".to_string(), |c| format!("{c} products"));

    ProductsIndexTemplate {
        layout: Layout::new(
            &state,
            &title,
            "Order business printing online with your documents attached.",
            "/products",
        ),
        products: content
            .products_in(category.as_deref())
            .into_iter()
            .cloned()
            .collect(),
        categories,
        category,
    }
}

/// Display a product with its add-to-cart form.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let content = state.content();
    let Some(product) = content.product(&slug).cloned() else {
        return not_found(&state);
    };

    let related = content
        .products_in(Some(&product.category))
        .into_iter()
        .filter(|p| p.slug != product.slug)
        .take(4)
        .cloned()
        .collect();

    ProductShowTemplate {
        layout: Layout::new(
            &state,
            &product.name,
            &product.summary,
            &format!("/products/{}", product.slug),
        ),
        product,
        related,
        uploads: UploadSlot::CART_SLOTS.into_iter().map(UploadField::from).collect(),
        max_quantity: MAX_QUANTITY,
    }
    .into_response()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/products/{slug}", get(show))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_field_for_mandatory_slot() {
        let field = UploadField::from(UploadSlot::EmiratesId);
        assert_eq!(field.name, "emirates_id");
        assert!(field.required);
        assert!(field.accept.contains(".pdf"));
        assert_eq!(field.max_mb, 5);
    }

    #[test]
    fn test_design_field_is_optional() {
        let field = UploadField::from(UploadSlot::Design);
        assert!(!field.required);
        assert_eq!(field.max_mb, 25);
    }
}
