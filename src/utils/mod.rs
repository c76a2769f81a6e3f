use axum::Json;
use serde::{Deserialize, Serialize};

/// Response envelope shared by every JSON endpoint except the bare session poll.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
        redirect: None,
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
        redirect: None,
    })
}

/// Error envelope telling the client where to go next.
pub fn redirect_to_api_response<T>(code: i32, msg: String, redirect: &str) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
        redirect: Some(redirect.to_string()),
    })
}

/// `HH:MM:SS`, hours not wrapped at 24.
pub fn format_countdown(remaining: chrono::Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNAUTHENTICATED: i32 = 1001;
    pub const SESSION_EXPIRED: i32 = 1002;
    pub const UPSTREAM_LOGIN_FAILURE: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const STORE_FAILURE: i32 = 1005;
    pub const INTERNAL_ERROR: i32 = 5000;
}
