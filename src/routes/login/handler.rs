use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    auth::{AuthContext, IssuedLogin, Provider, cookies},
    error::AuthError,
    utils::success_to_api_response,
};

use super::model::{
    CallbackQuery, FacebookLoginRequest, FacebookLoginResponse, LoginPageQuery, LoginPageResponse,
};
use super::{HOME_PATH, LOGIN_PATH};

fn login_page_body(error: Option<String>) -> LoginPageResponse {
    LoginPageResponse {
        providers: vec![Provider::Google.to_string(), Provider::Facebook.to_string()],
        error,
    }
}

fn issue(jar: CookieJar, issued: IssuedLogin, secure: bool) -> CookieJar {
    cookies::with_session(jar, issued.ticket, issued.session_id, secure)
}

/// Login landing. A ticket without session state is signed out here rather
/// than bounced back home.
pub async fn login_page(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    jar: CookieJar,
    Query(query): Query<LoginPageQuery>,
) -> Response {
    if ctx.is_desynchronized() {
        state.login.sign_out(&ctx).await;
        return (
            StatusCode::OK,
            cookies::cleared(jar),
            success_to_api_response(login_page_body(query.error)),
        )
            .into_response();
    }

    if ctx.is_authenticated() {
        return Redirect::to(HOME_PATH).into_response();
    }

    (StatusCode::OK, success_to_api_response(login_page_body(query.error))).into_response()
}

/// Completion of a browser-side provider handshake. Success lands on the
/// home page, failure back on the login page with a reason.
pub async fn external_callback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    jar: CookieJar,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let handshake = match provider.parse::<Provider>() {
        Ok(provider) => {
            state
                .identity
                .resolve(provider, query.access_token.as_deref().unwrap_or_default())
                .await
        }
        Err(e) => Err(e),
    };

    match state.login.handle_external_login(&ctx, handshake).await {
        Ok(issued) => {
            tracing::info!("External login result: success");
            (issue(jar, issued, state.config.cookie_secure), Redirect::to(HOME_PATH)).into_response()
        }
        Err(e) => {
            tracing::info!("External login result: {}", e);
            Redirect::to(&format!("{}?error={}", LOGIN_PATH, e.slug())).into_response()
        }
    }
}

pub async fn facebook_login(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    jar: CookieJar,
    Json(req): Json<FacebookLoginRequest>,
) -> Response {
    let handshake = state.identity.resolve(Provider::Facebook, &req.access_token).await;

    match state.login.handle_external_login(&ctx, handshake).await {
        Ok(issued) => (
            issue(jar, issued, state.config.cookie_secure),
            Json(FacebookLoginResponse {
                success: true,
                message: None,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error during Facebook login: {}", e);
            let status = match e {
                AuthError::UpstreamLoginFailure(_) => StatusCode::OK,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(FacebookLoginResponse {
                    success: false,
                    message: Some(e.user_message().to_string()),
                }),
            )
                .into_response()
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    jar: CookieJar,
) -> impl IntoResponse {
    state.login.sign_out(&ctx).await;
    (cookies::cleared(jar), Redirect::to(LOGIN_PATH))
}
