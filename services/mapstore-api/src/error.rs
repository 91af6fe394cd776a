//! HTTP rendering of service errors.

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use mapstore_core::{CoreError, ErrorCode};

/// Header mirroring the error code of a failed response.
pub const PLATFORM_ERROR_CODE: HeaderName = HeaderName::from_static("x-platform-error-code");

/// Message shown to clients in place of internal failure details.
pub const INTERNAL_MESSAGE: &str = "An internal error has occurred";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// A [`CoreError`] leaving through the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

/// Status code for each error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Invalid | ErrorCode::EmptyValue => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let message = if code == ErrorCode::Internal {
            error!(error = %self.0, cause = ?std::error::Error::source(&self.0), "internal error");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.0.to_string()
        };

        let body = ErrorBody {
            code: code.as_str().to_string(),
            message,
        };
        let mut response = (status_for(code), Json(body)).into_response();
        response
            .headers_mut()
            .insert(PLATFORM_ERROR_CODE, HeaderValue::from_static(code.as_str()));
        response
    }
}
