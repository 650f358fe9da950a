use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

use crate::auth::AuthError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Failure talking to the hosted backend (table or auth endpoints).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Outcome of a screen action that never reached, or was refused by, the
/// backend. The display string is the alert shown to the user.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{alert}")]
    Write {
        alert: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ScreenError {
    pub fn write(alert: &'static str, source: impl Into<anyhow::Error>) -> Self {
        ScreenError::Write {
            alert,
            source: source.into(),
        }
    }
}

impl From<ScreenError> for AppError {
    fn from(value: ScreenError) -> Self {
        match value {
            ScreenError::Validation(message) => AppError::bad_request(message),
            ScreenError::Write { alert, .. } => AppError::bad_gateway(alert),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::AlreadyRegistered => AppError::conflict(value.to_string()),
            AuthError::InvalidCredentials => AppError::unauthorized(value.to_string()),
            AuthError::Rejected(message) => AppError::bad_request(message),
            AuthError::Backend(err) => AppError::bad_gateway(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::internal(value)
    }
}
