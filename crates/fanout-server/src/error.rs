use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fanout_core::FanoutError;

use crate::envelope::ApiResponse;

/// Private sentinel carrying an explicit 400 through the `anyhow::Error`
/// chain, for request problems that are not a `FanoutError`.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<BadRequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        match self.0.downcast_ref::<FanoutError>() {
            Some(FanoutError::InvalidTaskCount(_) | FanoutError::TaskCountOutOfRange { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Some(FanoutError::PoolClosed(_) | FanoutError::NoRuntime(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Some(
                FanoutError::InvalidTimeFormat(_)
                | FanoutError::InvalidConfig(_)
                | FanoutError::ConfigNotFound(_)
                | FanoutError::Io(_)
                | FanoutError::Yaml(_),
            )
            | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request rejected");
        }
        let body = ApiResponse::error(status.as_u16(), self.0.to_string());
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
