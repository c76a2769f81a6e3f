use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::auth::context::AuthContext;
use crate::auth::cookies;
use crate::auth::ticket::TicketClaims;
use crate::auth::validator::SessionVerdict;
use crate::cache::SessionRecord;
use crate::error::AuthError;
use crate::routes::login::LOGIN_PATH;
use crate::utils::redirect_to_api_response;

/// Extractor for handlers that read or change user-scoped data.
///
/// Runs the full session validation; handlers taking it never see an
/// expired or desynchronized session.
#[derive(Debug, Clone)]
pub struct ValidSession {
    pub session_id: String,
    pub identity: TicketClaims,
    pub record: SessionRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// There was never a session.
    Unauthenticated,
    /// There was one and it ended.
    SessionExpired,
}

impl From<GuardRejection> for AuthError {
    fn from(rejection: GuardRejection) -> Self {
        match rejection {
            GuardRejection::Unauthenticated => AuthError::Unauthenticated,
            GuardRejection::SessionExpired => AuthError::SessionExpired,
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let err = AuthError::from(self);
        (
            StatusCode::UNAUTHORIZED,
            cookies::cleared(CookieJar::new()),
            redirect_to_api_response::<()>(err.code(), err.user_message().to_string(), LOGIN_PATH),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for ValidSession {
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default();

        match state.validator.validate(&ctx).await {
            SessionVerdict::Valid => match (ctx.session_id, ctx.identity) {
                (Some(session_id), Some(identity)) => Ok(ValidSession {
                    session_id,
                    identity,
                    record: ctx.record,
                }),
                _ => Err(GuardRejection::Unauthenticated),
            },
            SessionVerdict::Unauthenticated => Err(GuardRejection::Unauthenticated),
            SessionVerdict::Expired(reason) => {
                tracing::debug!("Rejecting request, session expired: {:?}", reason);
                Err(GuardRejection::SessionExpired)
            }
        }
    }
}
