//! Click-to-contact lead APIs.
//!
//! The page posts here when a visitor taps a WhatsApp or call button, then
//! follows the returned link to open the conversation.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::Serialize;
use signpress_core::Phone;
use tracing::instrument;

use crate::error::{ApiError, ApiResponse, Result, add_breadcrumb};
use crate::models::{Lead, LeadChannel, LeadFields};
use crate::state::AppState;

/// Link the browser should open after the lead is recorded.
#[derive(Debug, Serialize)]
pub struct LeadLink {
    pub link: String,
}

/// The business's own link for `channel`.
fn business_link(state: &AppState, lead: &Lead) -> Result<String> {
    let business = &state.config().business;
    match lead.channel {
        LeadChannel::WhatsApp => {
            let phone = Phone::parse(&business.whatsapp)
                .map_err(|e| ApiError::Internal(format!("invalid BUSINESS_WHATSAPP: {e}")))?;
            let text = format!(
                "Hello, my name is {}. I am interested in {}.",
                lead.name,
                lead.service_label().to_lowercase()
            );
            Ok(phone.whatsapp_link(Some(&text)))
        }
        LeadChannel::Phone => Phone::parse(&business.phone)
            .map(|phone| phone.tel_link())
            .map_err(|e| ApiError::Internal(format!("invalid BUSINESS_PHONE: {e}"))),
    }
}

/// Record a WhatsApp click lead.
#[instrument(skip(state, body))]
pub async fn whatsapp(
    State(state): State<AppState>,
    body: std::result::Result<Json<LeadFields>, JsonRejection>,
) -> Result<Json<ApiResponse<LeadLink>>> {
    let Json(fields) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let lead = Lead::from_fields(LeadChannel::WhatsApp, fields)?;
    let link = business_link(&state, &lead)?;

    add_breadcrumb("lead", "WhatsApp lead", Some(&[("service", lead.service_label())]));
    state.email().send_whatsapp_lead(&lead).await?;
    tracing::info!(service = lead.service_label(), "WhatsApp lead relayed");

    Ok(ApiResponse::ok(LeadLink { link }))
}

/// Record a phone click lead.
#[instrument(skip(state, body))]
pub async fn phone(
    State(state): State<AppState>,
    body: std::result::Result<Json<LeadFields>, JsonRejection>,
) -> Result<Json<ApiResponse<LeadLink>>> {
    let Json(fields) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let lead = Lead::from_fields(LeadChannel::Phone, fields)?;
    let link = business_link(&state, &lead)?;

    add_breadcrumb("lead", "Phone lead", Some(&[("service", lead.service_label())]));
    state.email().send_phone_lead(&lead).await?;
    tracing::info!(
        service = lead.service_label(),
        call_duration = lead.call_duration,
        "Phone lead relayed"
    );

    Ok(ApiResponse::ok(LeadLink { link }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/leads/whatsapp", post(whatsapp))
        .route("/api/leads/phone", post(phone))
}
