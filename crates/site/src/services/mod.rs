//! Business logic services for the site.
//!
//! # Services
//!
//! - `blobs` - Disk-backed upload store, partitioned per cart
//! - `cart` - Visitor cart over the session and blob store
//! - `email` - SMTP relay of leads and orders
//! - `orders` - Order assembly from a cart

pub mod blobs;
pub mod cart;
pub mod email;
pub mod orders;
