//! Order types: billing details, assembled lines, attachments.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use signpress_core::{Email, Phone, Price};

use super::lead::{MAX_SHORT_LEN, MAX_TEXT_LEN, check_len, clean};
use crate::error::ApiError;

/// A file ready to be attached to an outbound email.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Billing form as submitted from the checkout page or the order endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct BillingForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub emirate: Option<String>,
    pub notes: Option<String>,
}

/// Validated billing details.
#[derive(Debug, Clone)]
pub struct Billing {
    pub full_name: String,
    pub email: Email,
    pub phone: Phone,
    pub company: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub emirate: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<BillingForm> for Billing {
    type Error = ApiError;

    fn try_from(form: BillingForm) -> Result<Self, Self::Error> {
        let full_name = clean(form.full_name.as_deref())
            .ok_or_else(|| ApiError::validation("Please enter your full name."))?;
        let email = clean(form.email.as_deref())
            .ok_or_else(|| ApiError::validation("Please enter your email address."))?;
        let email = Email::parse(&email)
            .map_err(|e| ApiError::validation(format!("Please check your email address: {e}.")))?;
        let phone = clean(form.phone.as_deref())
            .ok_or_else(|| ApiError::validation("Please enter your phone number."))?;
        let phone = Phone::parse(&phone)
            .map_err(|e| ApiError::validation(format!("Please check your phone number: {e}.")))?;

        let company = clean(form.company.as_deref());
        let address = clean(form.address.as_deref());
        let city = clean(form.city.as_deref());
        let emirate = clean(form.emirate.as_deref());
        let notes = clean(form.notes.as_deref());

        check_len("Full name", Some(&full_name), MAX_SHORT_LEN)?;
        check_len("Company", company.as_deref(), MAX_SHORT_LEN)?;
        check_len("Address", address.as_deref(), MAX_TEXT_LEN)?;
        check_len("City", city.as_deref(), MAX_SHORT_LEN)?;
        check_len("Emirate", emirate.as_deref(), MAX_SHORT_LEN)?;
        check_len("Notes", notes.as_deref(), MAX_TEXT_LEN)?;

        Ok(Self {
            full_name,
            email,
            phone,
            company,
            address,
            city,
            emirate,
            notes,
        })
    }
}

/// One product line of a submitted order, with its documents loaded.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_slug: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Option<Price>,
    pub attachments: Vec<Attachment>,
}

impl OrderLine {
    /// Line total when the product has a list price.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.map(|price| price.times(self.quantity))
    }
}

/// A complete order, ready for the relay.
#[derive(Debug, Clone)]
pub struct Order {
    pub reference: String,
    pub billing: Billing,
    pub lines: Vec<OrderLine>,
    pub submitted_at: DateTime<Utc>,
}

impl Order {
    /// Build an order with a fresh reference.
    #[must_use]
    pub fn new(billing: Billing, lines: Vec<OrderLine>) -> Self {
        let submitted_at = Utc::now();
        Self {
            reference: new_reference(submitted_at),
            billing,
            lines,
            submitted_at,
        }
    }

    /// Every attachment across all lines, in line order.
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.lines.iter().flat_map(|line| line.attachments.iter())
    }

    /// Sum of priced lines.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        let mut priced = self.lines.iter().filter_map(OrderLine::line_total).peekable();
        priced.peek()?;
        Some(Price::aed(priced.map(|price| price.amount).sum()))
    }
}

/// Order reference such as `SP-260301-4821`.
fn new_reference(at: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(1000..10000);
    format!("SP-{}-{suffix}", at.format("%y%m%d"))
}
