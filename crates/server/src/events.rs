//! Event API endpoints.

use api_types::{
    event::{Event, EventNew},
    rsvp::Rsvp,
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use crate::{ServerError, rsvps::rsvp_view, server::ServerState};

fn event_view(event: engine::Event) -> Event {
    Event {
        id: event.id,
        title: event.title,
        description: event.description,
        max_seats: event.max_seats,
        created_at: event.created_at,
    }
}

/// Handle requests for creating new `Event`
pub async fn event_new(
    State(state): State<ServerState>,
    payload: Result<Json<EventNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), ServerError> {
    let Json(payload) = payload?;
    let event = state
        .engine
        .create_event(&payload.title, payload.description.as_deref(), payload.max_seats)
        .await?;
    tracing::info!(event_id = event.id, "event created");

    Ok((StatusCode::CREATED, Json(event_view(event))))
}

/// List every event, oldest first
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Event>>, ServerError> {
    let events = state.engine.list_events().await?;
    Ok(Json(events.into_iter().map(event_view).collect()))
}

/// Handle requests for listing the RSVPs of an event
pub async fn rsvps(
    State(state): State<ServerState>,
    event_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Rsvp>>, ServerError> {
    let Path(event_id) = event_id?;
    let rsvps = state.engine.list_rsvps(event_id).await?;
    Ok(Json(rsvps.into_iter().map(rsvp_view).collect()))
}
