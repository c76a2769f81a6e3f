#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::Query,
    http::{HeaderMap, Request, StatusCode, header},
    response::Response,
    routing::get,
};
use chrono::{TimeZone, Utc};
use moneywise::{
    AppState,
    cache::SessionStore,
    clock::ManualClock,
    config::Config,
    database::{UserStore, repositories::user::MemoryUserStore},
    router::build_router,
};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const GOOD_TOKEN: &str = "good-token";
pub const NO_EMAIL_TOKEN: &str = "no-email-token";
pub const MALFORMED_TOKEN: &str = "malformed-token";
pub const UNVERIFIED_TOKEN: &str = "unverified-token";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
    pub users: MemoryUserStore,
}

/// Stand-in for the Graph API `/me` endpoint and Google's `/userinfo`.
async fn fake_providers() -> String {
    async fn me(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        match params.get("access_token").map(String::as_str) {
            Some(GOOD_TOKEN) => (
                StatusCode::OK,
                Json(json!({
                    "id": "fb-42",
                    "name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "picture": { "data": { "url": "https://img.example/ada.png" } }
                })),
            ),
            Some(NO_EMAIL_TOKEN) => (StatusCode::OK, Json(json!({ "id": "fb-43", "name": "Nameless" }))),
            Some(MALFORMED_TOKEN) => (StatusCode::OK, Json(json!({ "unexpected": true }))),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "message": "Invalid OAuth access token" } })),
            ),
        }
    }

    async fn userinfo(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match token {
            Some(GOOD_TOKEN) => (
                StatusCode::OK,
                Json(json!({
                    "sub": "g-7",
                    "name": "Grace Hopper",
                    "email": "grace@example.com",
                    "email_verified": true,
                    "picture": "https://img.example/grace.png"
                })),
            ),
            Some(UNVERIFIED_TOKEN) => (
                StatusCode::OK,
                Json(json!({
                    "sub": "g-8",
                    "name": "Mallory",
                    "email": "mallory@example.com",
                    "email_verified": false
                })),
            ),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid_token" })),
            ),
        }
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let providers = Router::new()
        .route("/me", get(me))
        .route("/userinfo", get(userinfo));
    tokio::spawn(async move {
        axum::serve(listener, providers).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(&[]).await
}

pub async fn spawn_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let providers_url = fake_providers().await;
    let mut env: HashMap<String, String> = HashMap::from([
        ("TICKET_SECRET".to_string(), "integration-secret".to_string()),
        ("COOKIE_SECURE".to_string(), "false".to_string()),
        ("FACEBOOK_GRAPH_URL".to_string(), providers_url.clone()),
        ("GOOGLE_USERINFO_URL".to_string(), format!("{}/userinfo", providers_url)),
    ]);
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }
    let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
    let sessions = SessionStore::memory(Arc::new(clock.clone()), config.session_store_ttl());
    let memory_users = MemoryUserStore::default();
    let state = AppState::new(
        config,
        sessions,
        UserStore::Memory(memory_users.clone()),
        Arc::new(clock.clone()),
    )
    .unwrap();

    TestApp {
        router: build_router(state.clone()),
        state,
        clock,
        users: memory_users,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookies: &Cookies) -> Response {
        let mut builder = Request::builder().uri(uri);
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies.header());
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Logs in through the Facebook JSON endpoint and returns the cookies set.
    pub async fn login(&self, token: &str) -> (Response, Cookies) {
        let request = Request::builder()
            .method("POST")
            .uri("/login/facebook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "accessToken": token }).to_string()))
            .unwrap();
        let response = self.send(request).await;
        let cookies = Cookies::from_response(&response);
        (response, cookies)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cookies(pub HashMap<String, String>);

impl Cookies {
    pub fn from_response(response: &Response) -> Self {
        let mut cookies = Cookies::default();
        cookies.absorb(response);
        cookies
    }

    /// Applies a response's Set-Cookie headers the way a browser would.
    pub fn absorb(&mut self, response: &Response) {
        for raw in response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
        {
            let Some((name, value)) = raw.split(';').next().and_then(|p| p.split_once('=')) else {
                continue;
            };
            if raw.contains("Max-Age=0") {
                self.0.remove(name.trim());
            } else {
                self.0.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn header(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn removes_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix) && v.contains("Max-Age=0"))
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
