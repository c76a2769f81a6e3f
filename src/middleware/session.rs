use axum::{
    body::Body,
    extract::State,
    http::{Request, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Duration;

use crate::AppState;
use crate::auth::{AuthContext, TicketClaims, cookies};
use crate::routes::login::LOGIN_PATH;

/// Resolves the request's [`AuthContext`] without judging it. Used on the
/// login routes, which must stay reachable with a broken session.
pub async fn attach_context(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let ctx = AuthContext::resolve(&jar, &state.tickets, &state.sessions).await;
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Per-request guard for the application routes.
///
/// A verified ticket whose session record has no name means the session
/// store lost the session while the cookie survived: sign out and send the
/// client to the login page, whatever the ticket's own expiry says.
pub async fn session_context(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let ctx = AuthContext::resolve(&jar, &state.tickets, &state.sessions).await;

    if ctx.is_desynchronized() {
        if let Some(claims) = &ctx.identity {
            tracing::warn!("Ticket for {} has no session state, forcing sign-out", claims.email);
        }
        ctx.tear_down(&state.sessions).await;
        return (cookies::cleared(jar), Redirect::to(LOGIN_PATH)).into_response();
    }

    let renewal = renewed_ticket(&state, &ctx);
    req.extensions_mut().insert(ctx);
    let response = next.run(req).await;

    match renewal {
        Some((ticket, replaced)) if response.status().is_success() && !sets_auth_cookie(&response) => {
            if let Err(e) = state
                .sessions
                .revoke_ticket(&replaced.jti, replaced.expires_at())
                .await
            {
                tracing::error!("Failed to revoke renewed ticket {}: {}", replaced.jti, e);
            }
            (
                cookies::with_ticket(CookieJar::new(), ticket, state.config.cookie_secure),
                response,
            )
                .into_response()
        }
        _ => response,
    }
}

/// Sliding expiration: past the ticket's half-life, sign a fresh one.
/// Returns it with the claims it replaces.
fn renewed_ticket(state: &AppState, ctx: &AuthContext) -> Option<(String, TicketClaims)> {
    if !state.config.ticket_sliding_expiration {
        return None;
    }
    let claims = ctx.identity.as_ref()?;
    let now = state.clock.now();
    if !claims.wants_renewal(now) || state.validator.remaining_time(&ctx.record) <= Duration::zero() {
        return None;
    }

    let renewed = claims.renewed(now, state.config.ticket_expiration());
    match state.tickets.sign(&renewed) {
        Ok(ticket) => {
            tracing::debug!("Renewed ticket for {}", renewed.email);
            Some((ticket, claims.clone()))
        }
        Err(e) => {
            tracing::error!("Failed to renew ticket: {}", e);
            None
        }
    }
}

fn sets_auth_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", cookies::AUTH_COOKIE);
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
