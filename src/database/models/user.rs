use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `"Users"` table.
///
/// Column names follow the table as PostgREST exposes it, so the same struct
/// decodes both JSON rows and sqlx rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct UserEntity {
    #[serde(rename = "UserID")]
    #[sqlx(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Username")]
    #[sqlx(rename = "Username")]
    pub username: String,
    #[serde(rename = "Email")]
    #[sqlx(rename = "Email")]
    pub email: String,
    #[serde(rename = "ContactNumber", default)]
    #[sqlx(rename = "ContactNumber")]
    pub contact_number: Option<String>,
    #[serde(rename = "Address", default)]
    #[sqlx(rename = "Address")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the store assigns `UserID`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Email")]
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Username defaults to the display name, or the email when there is none.
    pub fn from_identity(display_name: Option<&str>, email: &str, now: DateTime<Utc>) -> Self {
        let username = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(email);
        Self {
            username: username.to_string(),
            email: email.to_string(),
            created_at: now,
        }
    }
}
