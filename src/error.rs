use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::print::render::RenderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Login failed")]
    LoginFailed,

    /// Network or decode failure talking to the portal. The cause stays in the logs.
    #[error("Server Error")]
    Upstream(#[source] anyhow::Error),

    #[error("Missing required invoice data")]
    MissingFields,

    #[error("{0}")]
    BadRequest(String),

    #[error("Please wait {window_secs}sec before submitting the same print request again")]
    Duplicate { window_secs: u64, remaining_secs: u64 },

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidPin | AppError::MissingFields | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::LoginFailed => StatusCode::UNAUTHORIZED,
            AppError::Duplicate { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidTime(_) => AppError::BadRequest(err.to_string()),
            RenderError::Other(cause) => AppError::Internal(cause),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::InvalidPin | AppError::LoginFailed => {
                json!({ "success": false, "message": self.to_string() })
            }
            AppError::Upstream(cause) => {
                error!(error = ?cause, "upstream call failed");
                json!({ "success": false, "message": self.to_string() })
            }
            AppError::Duplicate { remaining_secs, .. } => {
                json!({ "error": self.to_string(), "remainingTime": remaining_secs })
            }
            AppError::Internal(cause) => {
                error!(error = ?cause, "request failed");
                json!({ "error": format!("{:#}", cause) })
            }
            AppError::MissingFields | AppError::BadRequest(_) => {
                json!({ "error": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(AppError::InvalidPin.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::LoginFailed.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MissingFields.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Duplicate { window_secs: 30, remaining_secs: 12 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Upstream(anyhow::anyhow!("connection reset")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_invoice_time_is_a_client_error() {
        let err = AppError::from(RenderError::InvalidTime("yesterday".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("yesterday"));

        let err = AppError::from(RenderError::Other(anyhow::anyhow!("decode template png")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_message_hides_cause() {
        let err = AppError::Upstream(anyhow::anyhow!("dns lookup failed for apps.example"));
        assert_eq!(err.to_string(), "Server Error");
    }

    #[test]
    fn duplicate_message_names_window() {
        let err = AppError::Duplicate { window_secs: 30, remaining_secs: 4 };
        assert_eq!(
            err.to_string(),
            "Please wait 30sec before submitting the same print request again"
        );
    }
}
