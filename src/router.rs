use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    middleware::{attach_context, log_errors, session_context},
    routes,
};

/// Login and logout stay reachable whatever state the session is in.
pub fn login_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/login", get(routes::login::login_page))
        .route("/login/callback/{provider}", get(routes::login::external_callback))
        .route("/login/facebook", post(routes::login::facebook_login))
        .route("/logout", get(routes::login::logout))
        .layer(axum::middleware::from_fn_with_state(state, attach_context))
}

/// Everything behind the per-request session check.
pub fn app_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(routes::home::index))
        .route("/api/me", get(routes::home::me))
        .route("/api/session/validate", get(routes::session::validate))
        .route("/api/session/info", get(routes::session::session_info))
        .layer(axum::middleware::from_fn_with_state(state, session_context))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(login_routes(state.clone()))
        .merge(app_routes(state.clone()))
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
