//! Session-related types.
//!
//! The visitor's session is the cart's metadata store. Uploaded files live in
//! the blob store; the session only holds references to them.

/// Session keys for cart data.
pub mod keys {
    /// Key for the visitor's cart id (UUID), which scopes their blob directory.
    pub const CART_ID: &str = "cart_id";

    /// Key for the cart metadata JSON.
    pub const CART: &str = "cart";

    /// Key for a one-shot notice shown on the next cart page view.
    pub const CART_NOTICE: &str = "cart_notice";
}
