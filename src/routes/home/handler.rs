use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppState,
    auth::ValidSession,
    error::AppError,
    routes::session::describe,
    utils::success_to_api_response,
};

use super::model::HomeResponse;

pub async fn index(State(state): State<AppState>, session: ValidSession) -> impl IntoResponse {
    let name = session
        .record
        .name
        .clone()
        .unwrap_or_else(|| session.identity.email.clone());

    (
        StatusCode::OK,
        success_to_api_response(HomeResponse {
            name,
            email: session.identity.email.clone(),
            picture: session.identity.picture.clone(),
            session: describe(&state, &session.record),
        }),
    )
}

/// Durable user record behind the current ticket.
pub async fn me(
    State(state): State<AppState>,
    session: ValidSession,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_by_email(&session.identity.email)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok((StatusCode::OK, success_to_api_response(user)))
}
