//! Signpress Core - shared domain types.
//!
//! This crate provides the types used by the Signpress site:
//! - validated contact details (`Email`, `Phone`)
//! - catalogue prices (`Price`)
//! - upload slots with their size ceilings and type allow-lists
//! - the visitor cart and its metadata bookkeeping
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! filesystem access, no HTTP. Storage of cart metadata and uploaded file
//! bytes lives in the `site` crate; this crate decides what is valid and
//! what survives a load or a save.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, phone numbers and prices
//! - [`upload`] - Upload slots, limits and content-type inference
//! - [`cart`] - Cart items, restore-on-load and the metadata size fallback

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;
pub mod upload;

pub use types::*;
