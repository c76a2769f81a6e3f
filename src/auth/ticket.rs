use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::identity::{ExternalIdentity, Provider};
use crate::error::AuthError;

/// Identity claims carried by the authentication ticket cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketClaims {
    pub sub: String,
    pub name: Option<String>,
    pub email: String,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub iat: i64,
    pub exp: i64,
    /// Ticket id, the handle used for server-side revocation.
    pub jti: String,
}

impl TicketClaims {
    pub fn issue(identity: &ExternalIdentity, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            sub: identity.subject.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            provider: identity.provider,
            picture: identity.picture_url.clone(),
            iat: now.timestamp(),
            exp: (now + window).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Same identity, fresh id and validity window.
    pub fn renewed(&self, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            iat: now.timestamp(),
            exp: (now + window).timestamp(),
            jti: Uuid::new_v4().to_string(),
            ..self.clone()
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Past the midpoint of its validity window.
    pub fn wants_renewal(&self, now: DateTime<Utc>) -> bool {
        let midpoint = self.iat + (self.exp - self.iat) / 2;
        now.timestamp() > midpoint && now < self.expires_at()
    }
}

/// Signs and verifies tickets with a shared HS256 secret.
#[derive(Clone)]
pub struct TicketCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TicketCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn sign(&self, claims: &TicketClaims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Checks the signature only. Expiry is judged against the application
    /// clock by the session validator, not the system time.
    pub fn verify_signature(&self, token: &str) -> Result<TicketClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<TicketClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}
