use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPageResponse {
    pub providers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FacebookLoginRequest {
    #[serde(rename = "accessToken", default)]
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FacebookLoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
