use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::database::models::user::{NewUser, UserEntity};
use crate::error::StoreError;

const USERS_PATH: &str = "/rest/v1/Users";

const SELECT_USER_BY_EMAIL: &str = r#"
    SELECT "UserID"::bigint AS "UserID", "Username", "Email", "ContactNumber", "Address", created_at
    FROM "Users"
    WHERE "Email" = $1
    ORDER BY "UserID"
    LIMIT 1
"#;

// Needs a unique index on "Email".
const INSERT_USER: &str = r#"
    INSERT INTO "Users" ("Username", "Email", created_at)
    VALUES ($1, $2, $3)
    ON CONFLICT ("Email") DO NOTHING
    RETURNING "UserID"::bigint AS "UserID", "Username", "Email", "ContactNumber", "Address", created_at
"#;

/// Durable user store.
#[derive(Clone)]
pub enum UserStore {
    /// Hosted Postgres reached through its PostgREST interface.
    PostgRest(PostgRestUsers),
    Postgres(PgPool),
    Memory(MemoryUserStore),
}

#[derive(Clone)]
pub struct PostgRestUsers {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<Vec<UserEntity>>>,
}

impl PostgRestUsers {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| StoreError::Upstream("api key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| StoreError::Upstream("api key is not a valid header value".into()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, StoreError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, USERS_PATH))
            .query(&[("Email", format!("eq.{}", email)), ("select", "*".to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Upstream(format!("status {}: {}", status, body)));
        }

        let mut users: Vec<UserEntity> = response.json().await?;
        Ok(if users.is_empty() { None } else { Some(users.remove(0)) })
    }

    /// Inserts unless a row with the same email exists. `None` means the
    /// insert was skipped as a duplicate.
    async fn insert_if_absent(&self, user: &NewUser) -> Result<Option<UserEntity>, StoreError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, USERS_PATH))
            .query(&[("on_conflict", "Email")])
            .header("Prefer", "return=representation,resolution=ignore-duplicates")
            .json(user)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Upstream(format!("status {}: {}", status, body)));
        }

        let mut created: Vec<UserEntity> = response.json().await?;
        Ok(if created.is_empty() { None } else { Some(created.remove(0)) })
    }
}

impl MemoryUserStore {
    pub async fn snapshot(&self) -> Vec<UserEntity> {
        self.users.read().await.clone()
    }
}

impl UserStore {
    pub fn memory() -> Self {
        UserStore::Memory(MemoryUserStore::default())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, StoreError> {
        match self {
            UserStore::PostgRest(api) => api.find_by_email(email).await,
            UserStore::Postgres(pool) => {
                let user = sqlx::query_as::<_, UserEntity>(SELECT_USER_BY_EMAIL)
                    .bind(email)
                    .fetch_optional(pool)
                    .await?;
                Ok(user)
            }
            UserStore::Memory(store) => Ok(store
                .users
                .read()
                .await
                .iter()
                .find(|u| u.email == email)
                .cloned()),
        }
    }

    /// Creates the user unless one with the same email already exists, in
    /// which case the existing row is returned. Safe against concurrent first
    /// logins for the same email.
    pub async fn upsert_by_email(&self, user: &NewUser) -> Result<UserEntity, StoreError> {
        let inserted = match self {
            UserStore::PostgRest(api) => api.insert_if_absent(user).await?,
            UserStore::Postgres(pool) => {
                sqlx::query_as::<_, UserEntity>(INSERT_USER)
                    .bind(&user.username)
                    .bind(&user.email)
                    .bind(user.created_at)
                    .fetch_optional(pool)
                    .await?
            }
            UserStore::Memory(store) => {
                let mut users = store.users.write().await;
                if let Some(existing) = users.iter().find(|u| u.email == user.email) {
                    return Ok(existing.clone());
                }
                let entity = UserEntity {
                    user_id: users.len() as i64 + 1,
                    username: user.username.clone(),
                    email: user.email.clone(),
                    contact_number: None,
                    address: None,
                    created_at: user.created_at,
                };
                users.push(entity.clone());
                Some(entity)
            }
        };

        match inserted {
            Some(created) => {
                tracing::info!("Created user {} for {}", created.user_id, created.email);
                Ok(created)
            }
            None => self.find_by_email(&user.email).await?.ok_or_else(|| {
                StoreError::Upstream(format!("user {} neither inserted nor found", user.email))
            }),
        }
    }
}
