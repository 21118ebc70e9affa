//! Quote request API.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use signpress_core::upload::UploadSlot;
use tracing::instrument;

use crate::error::{ApiResponse, Result, add_breadcrumb};
use crate::models::{QuoteFields, QuoteRequest};
use crate::multipart::FormData;
use crate::state::AppState;

/// Accept a quote request and relay it by email.
///
/// Multipart fields: `name`, `phone`, `email`, `company`, `service`,
/// `message` and an optional file `attachment`.
#[instrument(skip(state, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<()>>> {
    let mut form = FormData::read(multipart).await?;
    let fields: QuoteFields = form.fields()?;

    let attachment = form
        .take_file(UploadSlot::QuoteAttachment.field_name())
        .map(|file| file.into_attachment(UploadSlot::QuoteAttachment))
        .transpose()?;

    let quote = QuoteRequest::from_fields(fields, attachment)?;

    add_breadcrumb("lead", "Quote request", Some(&[("service", quote.service_label())]));
    state.email().send_quote(&quote).await?;

    tracing::info!(
        service = quote.service_label(),
        has_attachment = quote.attachment.is_some(),
        "Quote request relayed"
    );

    Ok(ApiResponse::ok_with_message(
        (),
        "Thank you! We have received your request and will get back to you shortly.",
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/quote", post(submit))
}
