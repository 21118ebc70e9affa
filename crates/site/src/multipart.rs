//! Multipart form reading.
//!
//! Lead and cart forms arrive as `multipart/form-data` with a mix of text
//! fields and files. [`FormData::read`] drains the whole body once, so handlers
//! can validate fields and files in whatever order suits them.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;
use signpress_core::upload::{UploadError, UploadSlot, content_type_for, validate_upload};

use crate::error::ApiError;
use crate::models::Attachment;

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check the file against `slot`'s rules.
    ///
    /// # Errors
    ///
    /// Returns the first rule the file breaks.
    pub fn validate(&self, slot: UploadSlot) -> Result<(), UploadError> {
        validate_upload(slot, &self.file_name, self.size())
    }

    /// Resolved content type for storage or attachment.
    #[must_use]
    pub fn resolved_content_type(&self) -> String {
        content_type_for(&self.file_name, self.content_type.as_deref())
    }

    /// Validate against `slot` and turn into an email attachment.
    ///
    /// # Errors
    ///
    /// Returns the first rule the file breaks.
    pub fn into_attachment(self, slot: UploadSlot) -> Result<Attachment, UploadError> {
        self.validate(slot)?;
        let content_type = self.resolved_content_type();
        Ok(Attachment {
            file_name: self.file_name,
            content_type,
            bytes: self.bytes,
        })
    }
}

/// A fully read multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Read every part of `multipart`.
    ///
    /// File inputs left empty by the browser (no name, no bytes) are ignored.
    /// Repeated text fields keep the last value.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid form submission: {e}")))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(ToString::to_string) {
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Upload failed: {e}")))?
                    .to_vec();
                if file_name.trim().is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name: file_name.trim().to_string(),
                        content_type,
                        bytes,
                    },
                );
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid form field: {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Text value of `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Remove and return the file sent as `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// Whether a file was sent as `name`.
    #[must_use]
    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Deserialize the text fields into `T`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the fields do not fit `T`.
    pub fn fields<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let value = serde_json::to_value(&self.fields)
            .map_err(|e| ApiError::Internal(format!("form encoding failed: {e}")))?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::validation(format!("Invalid form fields: {e}")))
    }
}

#[cfg(test)]
impl FormData {
    pub(crate) fn with(fields: &[(&str, &str)], files: Vec<(&str, UploadedFile)>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            files: files
                .into_iter()
                .map(|(k, f)| (k.to_string(), f))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::QuoteFields;

    fn pdf(size: usize) -> UploadedFile {
        UploadedFile {
            file_name: "scan.pdf".to_string(),
            content_type: None,
            bytes: vec![7; size],
        }
    }

    #[test]
    fn test_fields_deserialize_into_form_struct() {
        let form = FormData::with(&[("name", "Aisha"), ("phone", "0501234567")], Vec::new());
        let fields: QuoteFields = form.fields().unwrap();
        assert_eq!(fields.name.as_deref(), Some("Aisha"));
        assert!(fields.email.is_none());
    }

    #[test]
    fn test_take_file_removes_it() {
        let mut form = FormData::with(&[], vec![("attachment", pdf(3))]);
        assert!(form.has_file("attachment"));
        assert_eq!(form.take_file("attachment").unwrap().size(), 3);
        assert!(form.take_file("attachment").is_none());
    }

    #[test]
    fn test_into_attachment_infers_content_type() {
        let attachment = pdf(10).into_attachment(UploadSlot::QuoteAttachment).unwrap();
        assert_eq!(attachment.content_type, "application/pdf");
        assert_eq!(attachment.file_name, "scan.pdf");
    }

    #[test]
    fn test_into_attachment_enforces_slot_ceiling() {
        let max = usize::try_from(UploadSlot::EmiratesId.max_bytes()).unwrap();
        let err = pdf(max + 1).into_attachment(UploadSlot::EmiratesId).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }
}
