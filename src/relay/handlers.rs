use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::{
    error::AppError,
    relay::{
        dto::{DataKind, PinRequest},
        services::relay,
    },
    state::RelayState,
};

pub fn relay_routes() -> Router<RelayState> {
    Router::new()
        .route("/attendance", post(attendance))
        .route("/profile", post(profile))
}

#[instrument(skip(state, payload))]
pub async fn attendance(
    State(state): State<RelayState>,
    payload: Result<Json<PinRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = pin_body(payload)?;
    let data = relay(&state, payload.pin.as_deref(), DataKind::Attendance).await?;
    Ok(Json(data))
}

#[instrument(skip(state, payload))]
pub async fn profile(
    State(state): State<RelayState>,
    payload: Result<Json<PinRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = pin_body(payload)?;
    let data = relay(&state, payload.pin.as_deref(), DataKind::Profile).await?;
    Ok(Json(data))
}

// A body that is not JSON carries no PIN.
fn pin_body(payload: Result<Json<PinRequest>, JsonRejection>) -> Result<Json<PinRequest>, AppError> {
    payload.map_err(|rejection| {
        warn!(status = %rejection.status(), "unreadable pin body");
        AppError::InvalidPin
    })
}
