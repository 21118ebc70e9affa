//! Order assembly.
//!
//! Turns the visitor's cart into order lines with every referenced document
//! loaded from the blob store. All lines are loaded concurrently; the first
//! failure aborts the whole submission so no partial order is ever relayed.

use futures::future::try_join_all;
use signpress_core::cart::{Cart, CartItem, FileRef};
use signpress_core::upload::{UploadError, UploadSlot, attachment_name, content_type_for};
use thiserror::Error;

use crate::models::{Attachment, OrderLine};
use crate::services::blobs::{BlobError, CartBlobs};

/// Errors from assembling an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Nothing to submit.
    #[error("Your cart is empty.")]
    EmptyCart,

    /// A line is missing one of its mandatory documents.
    #[error("Please upload both the Emirates ID and the trade license for {product}.")]
    MissingDocuments { product: String },

    /// A referenced file is no longer in the blob store.
    #[error("The {slot} file for {product} is no longer available. Please remove the item and add it again.")]
    FileUnavailable { product: String, slot: UploadSlot },

    /// A stored file breaks its slot rules.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Blob store failure.
    #[error("Failed to load uploaded files: {0}")]
    Blob(#[from] BlobError),
}

impl OrderError {
    /// Whether the visitor can fix this by changing their submission.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Blob(_))
    }
}

/// Check that every line carries both mandatory documents.
///
/// # Errors
///
/// Returns `EmptyCart` or `MissingDocuments` naming the first bad line.
pub fn check_documents(cart: &Cart) -> Result<(), OrderError> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    for item in cart.items() {
        let has_all = UploadSlot::CART_SLOTS
            .into_iter()
            .filter(|slot| slot.is_mandatory())
            .all(|slot| item.file(slot).is_some_and(|file| !file.key.trim().is_empty()));
        if !has_all {
            return Err(OrderError::MissingDocuments {
                product: item.product_name.clone(),
            });
        }
    }
    Ok(())
}

/// Assemble order lines from `cart`, loading documents from `blobs`.
///
/// Lines keep cart order; within a line, attachments follow slot order
/// (Emirates ID, trade license, design).
///
/// # Errors
///
/// Returns the first failure: an empty cart, a line without its mandatory
/// documents, a missing blob, or a blob over its slot ceiling.
pub async fn assemble_order(cart: &Cart, blobs: &CartBlobs) -> Result<Vec<OrderLine>, OrderError> {
    check_documents(cart)?;
    try_join_all(cart.items().iter().map(|item| assemble_line(item, blobs))).await
}

async fn assemble_line(item: &CartItem, blobs: &CartBlobs) -> Result<OrderLine, OrderError> {
    let attachments =
        try_join_all(item.files().map(|(slot, file)| load_file(item, slot, file, blobs))).await?;

    Ok(OrderLine {
        product_slug: item.product_slug.clone(),
        product_name: item.product_name.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        attachments,
    })
}

async fn load_file(
    item: &CartItem,
    slot: UploadSlot,
    file: &FileRef,
    blobs: &CartBlobs,
) -> Result<Attachment, OrderError> {
    let bytes = blobs
        .fetch(&file.key)
        .await?
        .ok_or_else(|| OrderError::FileUnavailable {
            product: item.product_name.clone(),
            slot,
        })?;

    let size = bytes.len() as u64;
    if size > slot.max_bytes() {
        return Err(UploadError::TooLarge {
            slot,
            max: slot.max_bytes(),
            size,
        }
        .into());
    }

    Ok(Attachment {
        file_name: attachment_name(&item.product_slug, slot, &file.file_name),
        content_type: content_type_for(&file.file_name, Some(&file.content_type)),
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::services::blobs::BlobStore;

    async fn stored(blobs: &CartBlobs, name: &str, bytes: &[u8]) -> FileRef {
        let key = CartBlobs::new_key();
        blobs.store(&key, bytes).await.unwrap();
        FileRef {
            key,
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            size: bytes.len() as u64,
        }
    }

    async fn line(blobs: &CartBlobs, slug: &str) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            product_slug: slug.to_string(),
            product_name: slug.to_uppercase(),
            unit_price: None,
            quantity: 3,
            emirates_id: stored(blobs, "eid.pdf", b"eid").await,
            trade_license: stored(blobs, "license.pdf", b"license").await,
            design: None,
            added_at: Utc::now(),
        }
    }

    fn setup() -> (tempfile::TempDir, CartBlobs) {
        let dir = tempfile::tempdir().unwrap();
        let blobs = BlobStore::new(dir.path(), 1024 * 1024).cart(Uuid::new_v4());
        (dir, blobs)
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let (_dir, blobs) = setup();
        let err = assemble_order(&Cart::new(), &blobs).await.unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_lines_keep_cart_order_with_attachments() {
        let (_dir, blobs) = setup();
        let mut first = line(&blobs, "flyers").await;
        first.design = Some(stored(&blobs, "art.ai", b"art").await);
        let second = line(&blobs, "banners").await;

        let mut cart = Cart::new();
        cart.add(first);
        cart.add(second);

        let lines = assemble_order(&cart, &blobs).await.unwrap();
        assert_eq!(lines.len(), 2);
        let flyers = lines.first().unwrap();
        assert_eq!(flyers.product_slug, "flyers");
        assert_eq!(flyers.quantity, 3);
        assert_eq!(flyers.attachments.len(), 3);
        assert_eq!(flyers.attachments.first().unwrap().bytes, b"eid");
        assert_eq!(lines.get(1).unwrap().attachments.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_mandatory_key_names_product() {
        let (_dir, blobs) = setup();
        let mut bad = line(&blobs, "stickers").await;
        bad.trade_license.key = String::new();
        let mut cart = Cart::new();
        cart.add(line(&blobs, "flyers").await);
        cart.add(bad);

        let err = assemble_order(&cart, &blobs).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please upload both the Emirates ID and the trade license for STICKERS."
        );
    }

    #[tokio::test]
    async fn test_missing_blob_aborts_submission() {
        let (_dir, blobs) = setup();
        let item = line(&blobs, "flyers").await;
        blobs.remove(&item.emirates_id.key).await.unwrap();
        let mut cart = Cart::new();
        cart.add(item);

        let err = assemble_order(&cart, &blobs).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::FileUnavailable {
                slot: UploadSlot::EmiratesId,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_oversized_blob_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let roomy = BlobStore::new(dir.path(), u64::MAX).cart(Uuid::new_v4());
        let max = usize::try_from(UploadSlot::TradeLicense.max_bytes()).unwrap();
        let mut item = line(&roomy, "flyers").await;
        item.trade_license = stored(&roomy, "license.pdf", &vec![0; max + 1]).await;
        let mut cart = Cart::new();
        cart.add(item);

        let err = assemble_order(&cart, &roomy).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::Upload(UploadError::TooLarge {
                slot: UploadSlot::TradeLicense,
                ..
            })
        ));
    }
}
