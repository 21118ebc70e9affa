//! The visitor's cart: metadata in the session, files in the blob store.
//!
//! Loading always goes through [`Cart::restore`] so corrupt lines never reach
//! a handler. Saving always goes through [`fit_to_ceiling`]; lines it evicts
//! have their blobs released straight away.

use signpress_core::cart::{Cart, FitOutcome, fit_to_ceiling};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::session::keys;
use crate::services::blobs::CartBlobs;
use crate::state::AppState;

/// A cart read from the session.
#[derive(Debug)]
pub struct LoadedCart {
    pub cart: Cart,
    /// Set when stored lines had to be discarded.
    pub notice: Option<String>,
}

/// Handle to one visitor's cart.
#[derive(Debug, Clone)]
pub struct VisitorCart {
    session: Session,
    cart_id: Uuid,
    blobs: CartBlobs,
    metadata_limit: usize,
}

impl VisitorCart {
    /// Open the visitor's cart, assigning a cart id on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn open(session: Session, state: &AppState) -> Result<Self, ApiError> {
        let cart_id = match session.get::<Uuid>(keys::CART_ID).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session.insert(keys::CART_ID, id).await?;
                id
            }
        };

        Ok(Self {
            blobs: state.blobs().cart(cart_id),
            session,
            cart_id,
            metadata_limit: state.config().cart.metadata_limit,
        })
    }

    /// The cart id scoping this visitor's blobs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.cart_id
    }

    /// Blob storage for this cart.
    #[must_use]
    pub const fn blobs(&self) -> &CartBlobs {
        &self.blobs
    }

    /// Load the cart, purging lines that fail validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(&self) -> Result<LoadedCart, ApiError> {
        let raw = self
            .session
            .get::<serde_json::Value>(keys::CART)
            .await?
            .unwrap_or_default();
        let restored = Cart::restore(raw);

        let notice = if restored.cleared {
            tracing::warn!(cart_id = %self.cart_id, purged = restored.purged, "Stored cart was unusable; clearing");
            self.clear().await?;
            Some("Your saved cart could not be read and has been cleared. Please add your items again.".to_string())
        } else if restored.purged > 0 {
            tracing::warn!(cart_id = %self.cart_id, purged = restored.purged, "Purged invalid cart lines");
            self.store(&restored.cart).await?;
            match self.blobs.retain_only(&restored.cart.blob_keys()).await {
                Ok(released) => tracing::debug!(cart_id = %self.cart_id, released, "Released uploads of purged lines"),
                Err(e) => tracing::warn!(cart_id = %self.cart_id, error = %e, "Failed to release uploads of purged lines"),
            }
            Some(format!(
                "{} item(s) in your cart were incomplete and have been removed.",
                restored.purged
            ))
        } else {
            None
        };

        Ok(LoadedCart {
            cart: restored.cart,
            notice,
        })
    }

    /// Save the cart, shrinking it to fit the metadata ceiling.
    ///
    /// Returns what had to be dropped; the blobs of dropped lines are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save(&self, cart: Cart) -> Result<FitOutcome, ApiError> {
        let fitted = fit_to_ceiling(cart, self.metadata_limit);

        if fitted.outcome.is_lossy() {
            tracing::warn!(
                cart_id = %self.cart_id,
                outcome = ?fitted.outcome,
                "Cart metadata over its ceiling; shed lines"
            );
            let keys: Vec<String> = fitted
                .evicted
                .iter()
                .flat_map(|item| item.files().map(|(_, file)| file.key.clone()))
                .collect();
            self.blobs.remove_all(keys).await;
        }

        self.store(&fitted.cart).await?;
        Ok(fitted.outcome)
    }

    /// Empty the cart and delete all of its files.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or blob store fails.
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.session.remove::<serde_json::Value>(keys::CART).await?;
        self.blobs.clear().await?;
        Ok(())
    }

    /// Stash a notice for the next cart page view.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_notice(&self, notice: &str) -> Result<(), ApiError> {
        self.session.insert(keys::CART_NOTICE, notice).await?;
        Ok(())
    }

    /// Take the stashed notice, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn take_notice(&self) -> Result<Option<String>, ApiError> {
        Ok(self.session.remove::<String>(keys::CART_NOTICE).await?)
    }

    async fn store(&self, cart: &Cart) -> Result<(), ApiError> {
        self.session.insert(keys::CART, cart).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use serde_json::json;
    use signpress_core::cart::{CartItem, FileRef};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::services::blobs::BlobStore;

    fn handle(limit: usize) -> (tempfile::TempDir, VisitorCart) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let cart_id = Uuid::new_v4();
        let cart = VisitorCart {
            session,
            cart_id,
            blobs: BlobStore::new(dir.path(), 1024 * 1024).cart(cart_id),
            metadata_limit: limit,
        };
        (dir, cart)
    }

    async fn line(cart: &VisitorCart, minute: i64) -> CartItem {
        let file = || FileRef {
            key: CartBlobs::new_key(),
            file_name: "doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size: 3,
        };
        let item = CartItem {
            id: Uuid::new_v4(),
            product_slug: "flyers".to_string(),
            product_name: "Flyers".to_string(),
            unit_price: None,
            quantity: 1,
            emirates_id: file(),
            trade_license: file(),
            design: None,
            added_at: Utc::now() + chrono::Duration::minutes(minute),
        };
        for (_, f) in item.files() {
            cart.blobs().store(&f.key, b"doc").await.unwrap();
        }
        item
    }

    #[tokio::test]
    async fn test_empty_session_loads_empty_cart() {
        let (_dir, cart) = handle(64 * 1024);
        let loaded = cart.load().await.unwrap();
        assert!(loaded.cart.is_empty());
        assert!(loaded.notice.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (_dir, cart) = handle(64 * 1024);
        let mut items = Cart::new();
        items.add(line(&cart, 0).await);

        assert_eq!(cart.save(items.clone()).await.unwrap(), FitOutcome::Stored);
        assert_eq!(cart.load().await.unwrap().cart, items);
    }

    #[tokio::test]
    async fn test_corrupt_cart_is_cleared_with_notice() {
        let (_dir, cart) = handle(64 * 1024);
        cart.session
            .insert(keys::CART, json!([{"product_slug": "flyers"}]))
            .await
            .unwrap();

        let loaded = cart.load().await.unwrap();
        assert!(loaded.cart.is_empty());
        assert!(loaded.notice.unwrap().contains("cleared"));
        assert!(cart.load().await.unwrap().notice.is_none());
    }

    #[tokio::test]
    async fn test_lossy_save_releases_evicted_blobs() {
        let (_dir, cart) = handle(64 * 1024);
        let older = line(&cart, 0).await;
        let newer = line(&cart, 1).await;
        let single = {
            let mut c = Cart::new();
            c.add(newer.clone());
            c.stored_size()
        };

        let mut items = Cart::new();
        items.add(older.clone());
        items.add(newer.clone());
        let small = VisitorCart {
            metadata_limit: single,
            ..cart.clone()
        };

        let outcome = small.save(items).await.unwrap();
        assert_eq!(outcome, FitOutcome::KeptNewest { dropped: 1 });
        assert!(
            cart.blobs()
                .fetch(&older.emirates_id.key)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            cart.blobs()
                .fetch(&newer.emirates_id.key)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_purged_lines_release_their_blobs() {
        let (_dir, cart) = handle(64 * 1024);
        let good = line(&cart, 0).await;
        let broken = line(&cart, 1).await;
        let mut broken_json = serde_json::to_value(&broken).unwrap();
        broken_json
            .as_object_mut()
            .unwrap()
            .remove("trade_license");
        cart.session
            .insert(
                keys::CART,
                json!([serde_json::to_value(&good).unwrap(), broken_json]),
            )
            .await
            .unwrap();

        let loaded = cart.load().await.unwrap();
        assert_eq!(loaded.cart.len(), 1);
        assert!(loaded.notice.unwrap().contains("1 item(s)"));
        assert!(
            cart.blobs()
                .fetch(&broken.emirates_id.key)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            cart.blobs()
                .fetch(&good.trade_license.key)
                .await
                .unwrap()
                .is_some()
        );
        assert_eq!(cart.blobs().usage().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_notice_is_one_shot() {
        let (_dir, cart) = handle(64 * 1024);
        cart.set_notice("hello").await.unwrap();
        assert_eq!(cart.take_notice().await.unwrap().as_deref(), Some("hello"));
        assert!(cart.take_notice().await.unwrap().is_none());
    }
}
