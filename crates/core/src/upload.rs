//! Upload slots, their limits and content-type inference.
//!
//! Every file a visitor sends lands in exactly one [`UploadSlot`]. The slot
//! decides the size ceiling and which extensions are accepted. Validation
//! happens before a file is stored or attached to an outbound email.

use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Extensions accepted for identity and licence documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "webp"];

/// Extensions accepted for artwork (documents plus design formats).
const ARTWORK_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "webp", "ai", "eps", "psd", "svg", "cdr", "tif", "tiff", "zip",
];

/// Fallback MIME type when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A named place a visitor can upload a file to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSlot {
    /// Emirates ID scan, mandatory on every cart line.
    EmiratesId,
    /// Trade licence scan, mandatory on every cart line.
    TradeLicense,
    /// Artwork for the order line, optional.
    Design,
    /// The single optional file on a quote request.
    QuoteAttachment,
}

impl UploadSlot {
    /// The three slots of a cart line, mandatory ones first.
    pub const CART_SLOTS: [Self; 3] = [Self::EmiratesId, Self::TradeLicense, Self::Design];

    /// Largest accepted file in bytes.
    #[must_use]
    pub const fn max_bytes(self) -> u64 {
        match self {
            Self::EmiratesId | Self::TradeLicense => 5 * MIB,
            Self::Design => 25 * MIB,
            Self::QuoteAttachment => 10 * MIB,
        }
    }

    /// Accepted lowercase extensions.
    #[must_use]
    pub const fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Self::EmiratesId | Self::TradeLicense => DOCUMENT_EXTENSIONS,
            Self::Design | Self::QuoteAttachment => ARTWORK_EXTENSIONS,
        }
    }

    /// Whether a cart line must carry this slot.
    #[must_use]
    pub const fn is_mandatory(self) -> bool {
        matches!(self, Self::EmiratesId | Self::TradeLicense)
    }

    /// Multipart field / attachment stem for this slot.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::EmiratesId => "emirates_id",
            Self::TradeLicense => "trade_license",
            Self::Design => "design",
            Self::QuoteAttachment => "attachment",
        }
    }

    /// Human label used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmiratesId => "Emirates ID",
            Self::TradeLicense => "trade license",
            Self::Design => "design file",
            Self::QuoteAttachment => "attachment",
        }
    }
}

impl fmt::Display for UploadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reasons an upload is refused. Display text is shown to the visitor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Zero-byte file.
    #[error("The {slot} file is empty.")]
    Empty {
        /// Slot the file was meant for.
        slot: UploadSlot,
    },
    /// File over the slot's ceiling.
    #[error("The {slot} file is too large ({} MB max).", .max / MIB)]
    TooLarge {
        /// Slot the file was meant for.
        slot: UploadSlot,
        /// Ceiling in bytes.
        max: u64,
        /// Actual size in bytes.
        size: u64,
    },
    /// Extension not on the slot's allow-list.
    #[error("The {slot} file type .{ext} is not accepted.")]
    DisallowedType {
        /// Slot the file was meant for.
        slot: UploadSlot,
        /// Offending extension, lowercased.
        ext: String,
    },
    /// No extension to check against the allow-list.
    #[error("The {slot} file needs a file extension.")]
    MissingExtension {
        /// Slot the file was meant for.
        slot: UploadSlot,
    },
}

/// Lowercased extension of a file name, if any.
#[must_use]
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Check a file against its slot's size ceiling and extension allow-list.
///
/// # Errors
///
/// Returns the first rule the file breaks: empty, too large, no extension,
/// or an extension outside the allow-list.
pub fn validate_upload(slot: UploadSlot, file_name: &str, size: u64) -> Result<(), UploadError> {
    if size == 0 {
        return Err(UploadError::Empty { slot });
    }
    if size > slot.max_bytes() {
        return Err(UploadError::TooLarge {
            slot,
            max: slot.max_bytes(),
            size,
        });
    }

    let ext = extension_of(file_name).ok_or(UploadError::MissingExtension { slot })?;
    if !slot.allowed_extensions().contains(&ext.as_str()) {
        return Err(UploadError::DisallowedType { slot, ext });
    }

    Ok(())
}

/// Pick the content type for an attachment.
///
/// A type supplied by the browser wins unless it is missing or the generic
/// octet-stream; otherwise the type is guessed from the extension.
#[must_use]
pub fn content_type_for(file_name: &str, provided: Option<&str>) -> String {
    if let Some(provided) = provided.map(str::trim)
        && !provided.is_empty()
        && provided != OCTET_STREAM
    {
        return provided.to_string();
    }

    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Build an ASCII attachment file name such as `business-cards-emirates_id.pdf`.
#[must_use]
pub fn attachment_name(product_slug: &str, slot: UploadSlot, original: &str) -> String {
    let stem: String = product_slug
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let stem = stem.trim_matches('-');
    let stem = if stem.is_empty() { "upload" } else { stem };

    match extension_of(original).filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric())) {
        Some(ext) => format!("{stem}-{}.{ext}", slot.field_name()),
        None => format!("{stem}-{}", slot.field_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_allowed_files() {
        assert!(validate_upload(UploadSlot::EmiratesId, "id.PDF", 1024).is_ok());
        assert!(validate_upload(UploadSlot::TradeLicense, "licence.jpeg", 4 * MIB).is_ok());
        assert!(validate_upload(UploadSlot::Design, "logo.ai", 20 * MIB).is_ok());
        assert!(validate_upload(UploadSlot::QuoteAttachment, "brief.zip", 1).is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_file_for_every_slot() {
        for slot in [
            UploadSlot::EmiratesId,
            UploadSlot::TradeLicense,
            UploadSlot::Design,
            UploadSlot::QuoteAttachment,
        ] {
            let size = slot.max_bytes() + 1;
            assert_eq!(
                validate_upload(slot, "file.pdf", size),
                Err(UploadError::TooLarge {
                    slot,
                    max: slot.max_bytes(),
                    size
                })
            );
        }
    }

    #[test]
    fn test_validate_accepts_file_at_ceiling() {
        assert!(validate_upload(UploadSlot::EmiratesId, "id.png", 5 * MIB).is_ok());
    }

    #[test]
    fn test_validate_rejects_disallowed_type() {
        assert_eq!(
            validate_upload(UploadSlot::EmiratesId, "id.ai", 10),
            Err(UploadError::DisallowedType {
                slot: UploadSlot::EmiratesId,
                ext: "ai".to_string()
            })
        );
        assert!(validate_upload(UploadSlot::Design, "payload.exe", 10).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_and_extensionless() {
        assert_eq!(
            validate_upload(UploadSlot::Design, "logo.svg", 0),
            Err(UploadError::Empty {
                slot: UploadSlot::Design
            })
        );
        assert_eq!(
            validate_upload(UploadSlot::Design, "logo", 10),
            Err(UploadError::MissingExtension {
                slot: UploadSlot::Design
            })
        );
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        let err = validate_upload(UploadSlot::TradeLicense, "l.pdf", 6 * MIB).unwrap_err();
        assert_eq!(err.to_string(), "The trade license file is too large (5 MB max).");
    }

    #[test]
    fn test_content_type_prefers_provided() {
        assert_eq!(
            content_type_for("scan.bin", Some("application/pdf")),
            "application/pdf"
        );
    }

    #[test]
    fn test_content_type_inferred_from_extension() {
        assert_eq!(content_type_for("scan.pdf", None), "application/pdf");
        assert_eq!(content_type_for("photo.PNG", Some(OCTET_STREAM)), "image/png");
        assert_eq!(content_type_for("mystery", Some("")), OCTET_STREAM);
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(
            attachment_name("business-cards", UploadSlot::EmiratesId, "My ID.PDF"),
            "business-cards-emirates_id.pdf"
        );
        assert_eq!(
            attachment_name("Roll Up / Banner", UploadSlot::Design, "art"),
            "roll-up---banner-design"
        );
        assert_eq!(
            attachment_name("", UploadSlot::QuoteAttachment, "brief.zip"),
            "upload-attachment.zip"
        );
    }
}
