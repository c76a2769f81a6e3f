use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::utils::{error_codes, error_to_api_response};

/// Failures of the session store or the durable user store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response from durable store: {0}")]
    Upstream(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("session expired")]
    SessionExpired,
    #[error("external login failed: {0}")]
    UpstreamLoginFailure(String),
    #[error("user store failure: {0}")]
    DurableStoreFailure(String),
    #[error("session store failure: {0}")]
    SessionUnavailable(String),
    #[error("ticket error: {0}")]
    Ticket(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Short machine-readable tag, used in login redirect query strings.
    pub fn slug(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::SessionExpired => "session_expired",
            AuthError::UpstreamLoginFailure(_) => "upstream_login_failure",
            AuthError::DurableStoreFailure(_) => "store_failure",
            AuthError::SessionUnavailable(_) => "session_unavailable",
            AuthError::Ticket(_) => "ticket_error",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AuthError::Unauthenticated => error_codes::UNAUTHENTICATED,
            AuthError::SessionExpired => error_codes::SESSION_EXPIRED,
            AuthError::UpstreamLoginFailure(_) => error_codes::UPSTREAM_LOGIN_FAILURE,
            AuthError::DurableStoreFailure(_) | AuthError::SessionUnavailable(_) => {
                error_codes::STORE_FAILURE
            }
            AuthError::Ticket(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Message safe to show an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "Please sign in to continue",
            AuthError::SessionExpired => "Your session timed out, please sign in again",
            AuthError::UpstreamLoginFailure(_) => "Sign-in with the identity provider failed",
            AuthError::DurableStoreFailure(_) => "Your account could not be prepared, please try again",
            AuthError::SessionUnavailable(_) => "Sign-in is temporarily unavailable, please try again",
            AuthError::Ticket(_) => "Sign-in could not be completed",
        }
    }
}

/// Failures surfaced by handlers after the guard has passed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Store(e) => {
                tracing::error!("store failure while handling request: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response::<()>(
                        error_codes::INTERNAL_ERROR,
                        "Internal server error".to_string(),
                    ),
                )
                    .into_response()
            }
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                error_to_api_response::<()>(error_codes::NOT_FOUND, format!("{} not found", what)),
            )
                .into_response(),
        }
    }
}
