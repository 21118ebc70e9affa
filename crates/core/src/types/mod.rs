//! Core types for Signpress.
//!
//! This module provides type-safe wrappers for contact details and prices.

pub mod email;
pub mod phone;
pub mod price;

pub use email::{Email, EmailError};
pub use phone::{Phone, PhoneError};
pub use price::{CurrencyCode, Price};
