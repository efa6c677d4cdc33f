//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; anything that
//! converts into `AppError` renders consistently here (status, envelope,
//! logging). `AppError` lives in filedock-core, so the axum `IntoResponse`
//! impl needs this local wrapper (orphan rules).

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filedock_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorSource {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
    #[serde(rename = "errorSources")]
    pub error_sources: Vec<ErrorSource>,
}

/// Wrapper type for AppError to implement IntoResponse
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

/// Which request part an error variant points at in `errorSources`.
fn error_path(err: &AppError) -> &'static str {
    match err {
        AppError::Validation(_) | AppError::PayloadTooLarge(_) => "file",
        AppError::NotResolvable(_) => "url",
        AppError::InvalidInput(_) | AppError::NotFound(_) => "body",
        _ => "server",
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match err.log_level() {
            LogLevel::Error => {
                tracing::error!(error = %err, code = err.error_code(), "Request failed")
            }
            LogLevel::Warn => {
                tracing::warn!(error = %err, code = err.error_code(), "Request failed")
            }
            LogLevel::Debug => {
                tracing::debug!(error = %err, code = err.error_code(), "Request rejected")
            }
        }

        let message = err.client_message();
        let body = ErrorResponse {
            success: false,
            message: message.clone(),
            data: None,
            error_sources: vec![ErrorSource {
                path: error_path(&err).to_string(),
                message,
            }],
        };

        (status, Json(body)).into_response()
    }
}

/// JSON body extractor that renders deserialization failures in the
/// `ErrorResponse` envelope instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
            })?;
        Ok(ValidatedJson(value))
    }
}
