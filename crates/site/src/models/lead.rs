//! Lead domain types.
//!
//! Validated forms of what visitors submit. Nothing here is stored; each
//! value lives for one request and ends up in an outbound email.

use serde::Deserialize;
use signpress_core::{Email, Phone};

use super::Attachment;
use crate::error::ApiError;

/// Longest free-text field accepted, in characters.
pub const MAX_TEXT_LEN: usize = 5_000;

/// Longest short field (name, company, service), in characters.
pub const MAX_SHORT_LEN: usize = 200;

/// Trim a field, treating blank input as absent.
pub fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Reject text longer than `max` characters.
///
/// # Errors
///
/// Returns a validation error naming `field`.
pub fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(ApiError::validation(format!(
            "{field} must be at most {max} characters."
        )));
    }
    Ok(())
}

/// Raw quote form fields as they arrive.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteFields {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

/// A validated quote request.
#[derive(Debug)]
pub struct QuoteRequest {
    pub name: String,
    pub phone: Option<Phone>,
    pub email: Option<Email>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
    pub attachment: Option<Attachment>,
}

impl QuoteRequest {
    /// Validate the quote form.
    ///
    /// A name is required, plus at least one way to reach the lead. Whichever
    /// of phone and email is given must be well formed.
    ///
    /// # Errors
    ///
    /// Returns a validation error with a visitor-facing message.
    pub fn from_fields(
        fields: QuoteFields,
        attachment: Option<Attachment>,
    ) -> Result<Self, ApiError> {
        let name = clean(fields.name.as_deref())
            .ok_or_else(|| ApiError::validation("Please enter your name."))?;
        check_len("Name", Some(&name), MAX_SHORT_LEN)?;

        let phone = clean(fields.phone.as_deref())
            .map(|raw| Phone::parse(&raw))
            .transpose()
            .map_err(|e| ApiError::validation(format!("Please check your phone number: {e}.")))?;
        let email = clean(fields.email.as_deref())
            .map(|raw| Email::parse(&raw))
            .transpose()
            .map_err(|e| ApiError::validation(format!("Please check your email address: {e}.")))?;

        if phone.is_none() && email.is_none() {
            return Err(ApiError::validation(
                "Please give us a phone number or an email address so we can reply.",
            ));
        }

        let company = clean(fields.company.as_deref());
        let service = clean(fields.service.as_deref());
        let message = clean(fields.message.as_deref());
        check_len("Company", company.as_deref(), MAX_SHORT_LEN)?;
        check_len("Service", service.as_deref(), MAX_SHORT_LEN)?;
        check_len("Message", message.as_deref(), MAX_TEXT_LEN)?;

        Ok(Self {
            name,
            phone,
            email,
            company,
            service,
            message,
            attachment,
        })
    }

    /// Service label for subjects and bodies.
    #[must_use]
    pub fn service_label(&self) -> &str {
        self.service.as_deref().unwrap_or("General enquiry")
    }
}

/// Where a click-to-contact lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadChannel {
    WhatsApp,
    Phone,
}

impl LeadChannel {
    /// Human name of the channel.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WhatsApp => "WhatsApp",
            Self::Phone => "Phone",
        }
    }
}

/// Raw click-to-contact lead fields.
#[derive(Debug, Default, Deserialize)]
pub struct LeadFields {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    /// Seconds the visitor spent on the call, when the page could tell.
    pub call_duration: Option<u32>,
}

/// A validated phone or WhatsApp lead.
#[derive(Debug, Clone)]
pub struct Lead {
    pub channel: LeadChannel,
    pub name: String,
    pub phone: Phone,
    pub service: Option<String>,
    pub call_duration: Option<u32>,
}

impl Lead {
    /// Validate a click-to-contact lead. Only the phone number is required.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the phone number is missing or
    /// malformed, or a field is too long.
    pub fn from_fields(channel: LeadChannel, fields: LeadFields) -> Result<Self, ApiError> {
        let raw_phone = clean(fields.phone.as_deref())
            .ok_or_else(|| ApiError::validation("Please enter your phone number."))?;
        let phone = Phone::parse(&raw_phone)
            .map_err(|e| ApiError::validation(format!("Please check your phone number: {e}.")))?;

        let name = clean(fields.name.as_deref()).unwrap_or_else(|| "Website visitor".to_string());
        let service = clean(fields.service.as_deref());
        check_len("Name", Some(&name), MAX_SHORT_LEN)?;
        check_len("Service", service.as_deref(), MAX_SHORT_LEN)?;

        let call_duration = match channel {
            LeadChannel::Phone => fields.call_duration,
            LeadChannel::WhatsApp => None,
        };

        Ok(Self {
            channel,
            name,
            phone,
            service,
            call_duration,
        })
    }

    /// Deep link that reaches the lead on the channel they used.
    #[must_use]
    pub fn link(&self) -> String {
        match self.channel {
            LeadChannel::WhatsApp => {
                let greeting = format!(
                    "Hello {}, thanks for contacting Signpress about {}.",
                    self.name,
                    self.service_label().to_lowercase()
                );
                self.phone.whatsapp_link(Some(&greeting))
            }
            LeadChannel::Phone => self.phone.tel_link(),
        }
    }

    /// Service label for subjects and bodies.
    #[must_use]
    pub fn service_label(&self) -> &str {
        self.service.as_deref().unwrap_or("General enquiry")
    }

    /// Call duration as `m:ss`.
    #[must_use]
    pub fn duration_display(&self) -> Option<String> {
        self.call_duration
            .map(|secs| format!("{}:{:02}", secs / 60, secs % 60))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quote(name: &str, phone: &str, email: &str) -> QuoteFields {
        QuoteFields {
            name: Some(name.to_string()),
            phone: Some(phone.to_string()),
            email: Some(email.to_string()),
            ..QuoteFields::default()
        }
    }

    #[test]
    fn test_quote_with_phone_only() {
        let request = QuoteRequest::from_fields(quote("Aisha", "050 123 4567", ""), None).unwrap();
        assert_eq!(request.phone.unwrap().digits(), "971501234567");
        assert!(request.email.is_none());
    }

    #[test]
    fn test_quote_with_email_only() {
        let request =
            QuoteRequest::from_fields(quote("Aisha", " ", "aisha@example.ae"), None).unwrap();
        assert!(request.phone.is_none());
        assert_eq!(request.email.unwrap().as_str(), "aisha@example.ae");
    }

    #[test]
    fn test_quote_without_contact_is_rejected() {
        let err = QuoteRequest::from_fields(quote("Aisha", "", ""), None).unwrap_err();
        assert!(err.to_string().contains("phone number or an email"));
    }

    #[test]
    fn test_quote_without_name_is_rejected() {
        let err = QuoteRequest::from_fields(quote("  ", "0501234567", ""), None).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_quote_with_bad_email_is_rejected() {
        assert!(QuoteRequest::from_fields(quote("Aisha", "", "aisha@"), None).is_err());
    }

    #[test]
    fn test_quote_message_length_limit() {
        let mut fields = quote("Aisha", "0501234567", "");
        fields.message = Some("x".repeat(MAX_TEXT_LEN + 1));
        assert!(QuoteRequest::from_fields(fields, None).is_err());
    }

    #[test]
    fn test_lead_requires_phone() {
        let err = Lead::from_fields(LeadChannel::WhatsApp, LeadFields::default()).unwrap_err();
        assert!(err.to_string().contains("phone number"));

        let fields = LeadFields {
            phone: Some("abc".to_string()),
            ..LeadFields::default()
        };
        assert!(Lead::from_fields(LeadChannel::Phone, fields).is_err());
    }

    #[test]
    fn test_phone_lead_link_uses_digits() {
        let fields = LeadFields {
            name: Some("Omar".to_string()),
            phone: Some("+971 (55) 765-4321".to_string()),
            service: None,
            call_duration: Some(125),
        };
        let lead = Lead::from_fields(LeadChannel::Phone, fields).unwrap();
        assert_eq!(lead.link(), "tel:+971557654321");
        assert_eq!(lead.duration_display().unwrap(), "2:05");
    }

    #[test]
    fn test_whatsapp_lead_link_uses_digits() {
        let fields = LeadFields {
            name: None,
            phone: Some("+971 55 765 4321".to_string()),
            service: Some("Vehicle Wraps".to_string()),
            call_duration: Some(30),
        };
        let lead = Lead::from_fields(LeadChannel::WhatsApp, fields).unwrap();
        assert!(lead.link().starts_with("https://wa.me/971557654321?text="));
        assert_eq!(lead.name, "Website visitor");
        assert!(lead.call_duration.is_none());
    }

    #[test]
    fn test_local_number_lead_link_is_dialable() {
        let fields = LeadFields {
            phone: Some("050 222 3333".to_string()),
            ..LeadFields::default()
        };
        let lead = Lead::from_fields(LeadChannel::Phone, fields).unwrap();
        assert_eq!(lead.link(), "tel:+971502223333");
    }
}
