use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use telex_rtm::{ErrorKind, RtmError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rtm(#[from] RtmError),
    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Rtm(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::PersistenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Rtm(RtmError::ChannelNotFound(_)) => "channel_not_found",
            ApiError::Rtm(RtmError::Unauthenticated(_)) => "unauthenticated",
            ApiError::Rtm(RtmError::NotSubscribed { .. }) => "not_subscribed",
            ApiError::Rtm(RtmError::AlreadySubscribed { .. }) => "already_subscribed",
            ApiError::Rtm(RtmError::PersistenceFailure(_)) => "message_write_failed",
            ApiError::Rtm(RtmError::Storage(_)) | ApiError::Internal => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        // Storage details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            "internal error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
