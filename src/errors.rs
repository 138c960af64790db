use std::any::Any;

use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ingest::IngestError;
use crate::ml::emissions::EmissionsError;
use crate::ml::forecast::ForecastError;
use crate::ml::summary::SummaryError;

/// Message returned for every unexpected fault. Details go to the log only.
const INTERNAL_MESSAGE: &str = "Server error";
const MALFORMED_BODY_MESSAGE: &str = "Malformed request body.";
const TOO_LARGE_MESSAGE: &str = "Request body is too large.";
const TIMEOUT_MESSAGE: &str = "Request timed out.";

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ApiError,
}

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiError { error: msg.into() },
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn payload_too_large() -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE_MESSAGE)
    }

    pub fn timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, TIMEOUT_MESSAGE)
    }

    /// A JSON body the extractor refused. Oversized bodies keep their 413.
    pub fn rejected_json(rejection: JsonRejection, malformed: impl Into<String>) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::payload_too_large();
        }
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        Self::bad_request(malformed)
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ApiError {
                error: INTERNAL_MESSAGE.into(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InsufficientRows
            | ForecastError::NoValidRows
            | ForecastError::MalformedInput => Self::bad_request(err.to_string()),
            ForecastError::DateOutOfRange(_) => {
                tracing::error!("Forecast error: {err}");
                Self::internal()
            }
        }
    }
}

impl From<SummaryError> for AppError {
    fn from(err: SummaryError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<EmissionsError> for AppError {
    fn from(err: EmissionsError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        tracing::debug!("Rejected upload: {err}");
        Self::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected_json(rejection, MALFORMED_BODY_MESSAGE)
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::payload_too_large();
        }
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(MALFORMED_BODY_MESSAGE)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", err);
        Self::internal()
    }
}

/// Gives the bare 408 from the timeout layer a JSON error body.
pub async fn timeout_response(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return AppError::timeout().into_response();
    }
    response
}

/// Response for a handler that panicked, used by the catch-panic layer.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "Handler panicked");
    AppError::internal().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_errors_are_client_errors() {
        let response = AppError::from(ForecastError::InsufficientRows).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Need at least 7 days of data (date,sales)."})
        );
    }

    #[tokio::test]
    async fn test_internal_errors_hide_detail() {
        let overflow = ForecastError::DateOutOfRange(NaiveDate::MAX);
        let response = AppError::from(overflow).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Server error");

        let response = AppError::from(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(body_json(response).await["error"], "Server error");
    }

    #[tokio::test]
    async fn test_bare_timeout_gets_json_body() {
        let bare = StatusCode::REQUEST_TIMEOUT.into_response();
        let response = timeout_response(bare).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Request timed out."})
        );

        let ok = timeout_response(StatusCode::OK.into_response()).await;
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Server error");
    }
}
