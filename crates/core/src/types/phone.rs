//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty or whitespace.
    #[error("phone number is required")]
    Empty,
    /// Fewer digits than any dialable number.
    #[error("phone number must have at least {min} digits")]
    TooShort {
        /// Minimum number of digits.
        min: usize,
    },
    /// More digits than E.164 allows.
    #[error("phone number must have at most {max} digits")]
    TooLong {
        /// Maximum number of digits.
        max: usize,
    },
}

/// UAE country calling code, assumed for numbers typed in local format.
pub const UAE_COUNTRY_CODE: &str = "971";

/// A phone number as typed by a lead.
///
/// Keeps the original text for display and the international digits for
/// links. Formatting characters (`+`, spaces, dashes, brackets) are ignored.
/// Local numbers (`050 123 4567`) get the UAE country code in place of the
/// trunk `0`; a `00` international prefix is dropped.
///
/// ## Examples
///
/// ```
/// use signpress_core::Phone;
///
/// let phone = Phone::parse("+971 (50) 123-4567").unwrap();
/// assert_eq!(phone.digits(), "971501234567");
/// assert_eq!(phone.tel_link(), "tel:+971501234567");
/// assert_eq!(phone.whatsapp_link(None), "https://wa.me/971501234567");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Phone {
    display: String,
    digits: String,
}

impl Phone {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Phone` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or its digit count is outside
    /// 7..=15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let display = s.trim();
        if display.is_empty() {
            return Err(PhoneError::Empty);
        }

        let typed: String = display.chars().filter(char::is_ascii_digit).collect();
        let digits = if display.starts_with('+') {
            typed
        } else if let Some(international) = typed.strip_prefix("00") {
            international.to_string()
        } else if let Some(local) = typed.strip_prefix('0') {
            format!("{UAE_COUNTRY_CODE}{local}")
        } else {
            typed
        };

        if digits.len() < Self::MIN_DIGITS {
            return Err(PhoneError::TooShort {
                min: Self::MIN_DIGITS,
            });
        }
        if digits.len() > Self::MAX_DIGITS {
            return Err(PhoneError::TooLong {
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self {
            display: display.to_string(),
            digits,
        })
    }

    /// The number as the lead typed it (trimmed).
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Only the digits of the number, country code first.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// A `tel:` link for the dialer.
    #[must_use]
    pub fn tel_link(&self) -> String {
        format!("tel:+{}", self.digits)
    }

    /// A `wa.me` chat link, optionally with a prefilled message.
    #[must_use]
    pub fn whatsapp_link(&self, text: Option<&str>) -> String {
        match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => format!(
                "https://wa.me/{}?text={}",
                self.digits,
                urlencoding::encode(text)
            ),
            None => format!("https://wa.me/{}", self.digits),
        }
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_formatting() {
        let phone = Phone::parse(" +971 50-123 4567 ").unwrap();
        assert_eq!(phone.digits(), "971501234567");
        assert_eq!(phone.display(), "+971 50-123 4567");
    }

    #[test]
    fn test_local_number_gets_country_code() {
        let phone = Phone::parse("050 222 3333").unwrap();
        assert_eq!(phone.digits(), "971502223333");
        assert_eq!(phone.display(), "050 222 3333");
        assert_eq!(phone.tel_link(), "tel:+971502223333");
        assert_eq!(phone.whatsapp_link(None), "https://wa.me/971502223333");

        let landline = Phone::parse("04 555 0199").unwrap();
        assert_eq!(landline.tel_link(), "tel:+97145550199");
    }

    #[test]
    fn test_double_zero_prefix_is_international() {
        let phone = Phone::parse("00971 55 765 4321").unwrap();
        assert_eq!(phone.digits(), "971557654321");

        let abroad = Phone::parse("0044 20 7946 0958").unwrap();
        assert_eq!(abroad.tel_link(), "tel:+442079460958");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_letters_only_is_too_short() {
        assert_eq!(
            Phone::parse("call me"),
            Err(PhoneError::TooShort { min: 7 })
        );
    }

    #[test]
    fn test_parse_too_long() {
        assert_eq!(
            Phone::parse("1234567890123456"),
            Err(PhoneError::TooLong { max: 15 })
        );
    }

    #[test]
    fn test_links_use_digits_only() {
        let phone = Phone::parse("+971 4-555 0199").unwrap();
        assert_eq!(phone.tel_link(), "tel:+97145550199");
        assert_eq!(phone.whatsapp_link(None), "https://wa.me/97145550199");
        assert_eq!(phone.whatsapp_link(Some("  ")), "https://wa.me/97145550199");
    }

    #[test]
    fn test_whatsapp_link_encodes_text() {
        let phone = Phone::parse("971501234567").unwrap();
        assert_eq!(
            phone.whatsapp_link(Some("Hi, about signage & banners")),
            "https://wa.me/971501234567?text=Hi%2C%20about%20signage%20%26%20banners"
        );
    }
}
