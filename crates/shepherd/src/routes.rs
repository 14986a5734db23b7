use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use shepherd_core::feedback::{self, FeedbackReceipt, FeedbackSubmission, UpdateView};
use shepherd_core::late::{self, LateNotification, LateNotificationForm};
use shepherd_core::occupancy::decode_snapshot;
use shepherd_core::presentation::ParkingStatus;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/parking-status", get(parking_status))
        .route("/parking-spots", put(publish_spots))
        .route("/parking-zones/reload", post(reload_zones))
        .route("/traffic-feedback", post(submit_feedback))
        .route("/traffic-feedback/recent", get(recent_feedback))
        .route("/late-notifications", post(send_late_notification))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

pub async fn parking_status(State(state): State<Arc<AppState>>) -> Json<Arc<ParkingStatus>> {
    Json(state.session.status())
}

/// Accepts a complete occupancy snapshot (`{"Spot1": 1, "Spot2": 0}`) and
/// pushes it to the live feed.
pub async fn publish_spots(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let spots = decode_snapshot(&snapshot)?;

    info!(spots = spots.len(), path = state.feed.path(), "occupancy snapshot accepted");
    state.feed.publish(spots);
    Ok(StatusCode::ACCEPTED)
}

pub async fn reload_zones(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.session.reload_zones().await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<FeedbackSubmission>,
) -> Result<(StatusCode, Json<FeedbackReceipt>), ApiError> {
    let receipt = feedback::submit_feedback(state.feedback.as_ref(), submission, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn recent_feedback(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UpdateView>>, ApiError> {
    let updates = feedback::recent_updates(state.feedback.as_ref(), Utc::now()).await?;
    Ok(Json(updates))
}

pub async fn send_late_notification(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LateNotificationForm>,
) -> Result<(StatusCode, Json<LateNotification>), ApiError> {
    let notification = late::send_late_notification(state.notifications.as_ref(), form).await?;
    Ok((StatusCode::ACCEPTED, Json(notification)))
}
