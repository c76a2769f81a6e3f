use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    auth::{AuthContext, ValidSession},
    cache::SessionRecord,
    utils::{format_countdown, success_to_api_response},
};

use super::model::{SessionInfoResponse, ValidateResponse};

/// Cheap check for client polling: a signed, unexpired, unrevoked ticket.
/// Never forces a logout; the guarded routes do that.
pub async fn validate(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Json<ValidateResponse> {
    let valid = match &ctx.identity {
        Some(claims) if claims.expires_at() >= state.clock.now() => {
            match state.sessions.is_ticket_revoked(&claims.jti).await {
                Ok(revoked) => !revoked,
                Err(e) => {
                    tracing::error!("Revocation lookup failed during session poll: {}", e);
                    false
                }
            }
        }
        _ => false,
    };
    Json(ValidateResponse { valid })
}

pub async fn session_info(State(state): State<AppState>, session: ValidSession) -> impl IntoResponse {
    (StatusCode::OK, success_to_api_response(describe(&state, &session.record)))
}

pub(crate) fn describe(state: &AppState, record: &SessionRecord) -> SessionInfoResponse {
    let remaining = state.validator.remaining_time(record);
    SessionInfoResponse {
        remaining_minutes: remaining.num_milliseconds() as f64 / 60_000.0,
        is_expiring_soon: state.validator.is_expiring_soon(record),
        formatted_time: format_countdown(remaining),
    }
}
