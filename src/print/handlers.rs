use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::{
    error::AppError,
    print::{
        dto::{InvoicePayload, PrintResponse, PrintersResponse},
        services,
    },
    state::PrintState,
};

pub fn print_routes() -> Router<PrintState> {
    Router::new()
        .route("/printers", get(printers))
        .route("/print", post(print).layer(DefaultBodyLimit::max(2 * 1024 * 1024)))
}

#[instrument(skip(state))]
pub async fn printers(State(state): State<PrintState>) -> Result<Json<PrintersResponse>, AppError> {
    let printers = services::list_printers(&state).await?;
    Ok(Json(PrintersResponse { printers }))
}

#[instrument(skip(state, body))]
pub async fn print(
    State(state): State<PrintState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PrintResponse>, AppError> {
    let Json(body) = body.map_err(|rejection| {
        warn!(status = %rejection.status(), "unreadable invoice body");
        AppError::MissingFields
    })?;
    if !body.is_object() {
        return Err(AppError::MissingFields);
    }
    let invoice: InvoicePayload = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("invalid invoice payload: {e}")))?;
    let res = services::print_invoice(&state, invoice).await?;
    Ok(Json(res))
}
