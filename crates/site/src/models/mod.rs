//! Domain models for the site.
//!
//! Validated forms of visitor submissions. Core value types (email, phone,
//! price, cart) live in `signpress-core`.

pub mod lead;
pub mod order;
pub mod session;

pub use lead::{Lead, LeadChannel, LeadFields, QuoteFields, QuoteRequest};
pub use order::{Attachment, Billing, BillingForm, Order, OrderLine};
