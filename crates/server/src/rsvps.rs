//! RSVP API endpoints.

use api_types::rsvp::{Rsvp, RsvpNew};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};

pub(crate) fn rsvp_view(rsvp: engine::Rsvp) -> Rsvp {
    Rsvp {
        id: rsvp.id,
        user_id: rsvp.user_id,
        event_id: rsvp.event_id,
        created_at: rsvp.created_at,
    }
}

/// Handle requests for claiming a seat
pub async fn rsvp_new(
    State(state): State<ServerState>,
    payload: Result<Json<RsvpNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Rsvp>), ServerError> {
    let Json(payload) = payload?;
    let rsvp = state
        .engine
        .create_rsvp(payload.user_id, payload.event_id)
        .await?;
    tracing::info!(
        rsvp_id = rsvp.id,
        user_id = rsvp.user_id,
        event_id = rsvp.event_id,
        "rsvp created"
    );

    Ok((StatusCode::CREATED, Json(rsvp_view(rsvp))))
}
