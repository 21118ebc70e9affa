//! Unified error handling with Sentry integration.
//!
//! Every API handler returns `Result<T, ApiError>`. Failures are answered
//! with the same JSON envelope successful submissions use, so the browser
//! always gets `{ "success": false, "message": "..." }` it can toast.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use signpress_core::upload::UploadError;
use thiserror::Error;

use crate::services::blobs::BlobError;
use crate::services::email::EmailError;
use crate::services::orders::OrderError;

/// Application-level error type for the API endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input failed validation; the message is shown to the visitor.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An uploaded file broke its slot's rules.
    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    /// The order could not be assembled.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Upload storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] BlobError),

    /// The mail relay refused or could not be reached.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON envelope returned by every API endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    /// Successful response carrying `data` and a message for the visitor.
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

impl ApiError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::Order(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Storage(BlobError::QuotaExceeded { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Email(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Order(_) | Self::Storage(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the visitor.
    fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Upload(err) => err.to_string(),
            Self::Order(err) if err.is_client_error() => err.to_string(),
            Self::Storage(BlobError::QuotaExceeded { .. }) => {
                "Your uploads are larger than we can hold for one cart. Your cart has been cleared; please add your items again with smaller files.".to_string()
            }
            Self::Email(_) => {
                "We could not send your request right now. Please try again, or call us directly."
                    .to_string()
            }
            Self::Order(_) | Self::Storage(_) | Self::Session(_) | Self::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::info!(error = %self, "Request rejected");
        }

        let body = ApiResponse::<()> {
            success: false,
            message: Some(self.public_message()),
            data: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
