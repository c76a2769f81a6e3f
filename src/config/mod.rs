use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Redis backing the session store; in-memory when unset.
    pub redis_url: Option<String>,
    /// PostgREST endpoint of the durable user store.
    pub supabase_url: Option<String>,
    pub supabase_api_key: Option<String>,
    /// Direct Postgres connection, used when no PostgREST endpoint is configured.
    pub database_url: Option<String>,
    pub ticket_secret: String,
    pub ticket_expiration_minutes: u64,
    pub ticket_sliding_expiration: bool,
    pub idle_timeout_minutes: u64,
    pub session_warning_minutes: u64,
    pub session_store_ttl_minutes: u64,
    pub strict_user_provisioning: bool,
    pub cookie_secure: bool,
    pub facebook_graph_url: String,
    pub google_userinfo_url: String,
    pub identity_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&get, "SERVER_PORT", 3000)?,
            redis_url: get("REDIS_URL"),
            supabase_url: get("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            supabase_api_key: get("SUPABASE_API_KEY"),
            database_url: get("DATABASE_URL"),
            ticket_secret: get("TICKET_SECRET").ok_or(ConfigError::Missing("TICKET_SECRET"))?,
            ticket_expiration_minutes: parse_or(&get, "TICKET_EXPIRATION_MINUTES", 60)?,
            ticket_sliding_expiration: parse_or(&get, "TICKET_SLIDING_EXPIRATION", false)?,
            idle_timeout_minutes: parse_or(&get, "SESSION_IDLE_TIMEOUT_MINUTES", 60)?,
            session_warning_minutes: parse_or(&get, "SESSION_WARNING_MINUTES", 5)?,
            session_store_ttl_minutes: parse_or(&get, "SESSION_STORE_TTL_MINUTES", 120)?,
            strict_user_provisioning: parse_or(&get, "STRICT_USER_PROVISIONING", false)?,
            cookie_secure: parse_or(&get, "COOKIE_SECURE", true)?,
            facebook_graph_url: get("FACEBOOK_GRAPH_URL")
                .unwrap_or_else(|| "https://graph.facebook.com".into()),
            google_userinfo_url: get("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|| "https://www.googleapis.com/oauth2/v3/userinfo".into()),
            identity_timeout_secs: parse_or(&get, "IDENTITY_TIMEOUT_SECS", 10)?,
        })
    }

    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.idle_timeout_minutes as i64)
    }

    pub fn session_warning(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_warning_minutes as i64)
    }

    pub fn ticket_expiration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ticket_expiration_minutes as i64)
    }

    pub fn session_store_ttl(&self) -> Duration {
        Duration::from_secs(self.session_store_ttl_minutes * 60)
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout_secs)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("TICKET_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.idle_timeout_minutes, 60);
        assert_eq!(config.session_warning_minutes, 5);
        assert_eq!(config.ticket_expiration_minutes, 60);
        assert!(!config.ticket_sliding_expiration);
        assert!(!config.strict_user_provisioning);
        assert!(config.redis_url.is_none());
        assert_eq!(config.idle_timeout(), chrono::Duration::hours(1));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TICKET_SECRET")));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("TICKET_SECRET", "s3cret"),
            ("SESSION_IDLE_TIMEOUT_MINUTES", "an hour"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "SESSION_IDLE_TIMEOUT_MINUTES", .. }
        ));
    }

    #[test]
    fn supabase_url_loses_trailing_slash() {
        let config = Config::from_lookup(lookup(&[
            ("TICKET_SECRET", "s3cret"),
            ("SUPABASE_URL", "https://example.supabase.co/"),
            ("SESSION_IDLE_TIMEOUT_MINUTES", "30"),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url.as_deref(), Some("https://example.supabase.co"));
        assert_eq!(config.idle_timeout(), chrono::Duration::minutes(30));
    }
}
