//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::ContentStore;
use crate::services::blobs::BlobStore;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, content, the mail relay and the upload store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    content: ContentStore,
    email: EmailService,
    blobs: BlobStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The blob store is rooted at the configured upload directory with the
    /// configured per-cart quota.
    #[must_use]
    pub fn new(config: SiteConfig, content: ContentStore, email: EmailService) -> Self {
        let blobs = BlobStore::new(config.cart.upload_dir.clone(), config.cart.blob_quota);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                content,
                email,
                blobs,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the loaded content.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the mail relay.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the upload blob store.
    #[must_use]
    pub fn blobs(&self) -> &BlobStore {
        &self.inner.blobs
    }
}
