use axum_extra::extract::cookie::CookieJar;

use crate::auth::cookies::{AUTH_COOKIE, SESSION_COOKIE};
use crate::auth::ticket::{TicketClaims, TicketCodec};
use crate::cache::{SessionRecord, SessionStore};

/// Authentication state of one request, resolved once at the framework
/// boundary and handed to handlers explicitly through request extensions.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub session_id: Option<String>,
    pub raw_ticket: Option<String>,
    /// Claims of a ticket whose signature checked out. Expiry and revocation
    /// are not judged here.
    pub identity: Option<TicketClaims>,
    pub record: SessionRecord,
}

impl AuthContext {
    pub async fn resolve(jar: &CookieJar, tickets: &TicketCodec, sessions: &SessionStore) -> Self {
        let raw_ticket = jar
            .get(AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());
        let identity = raw_ticket.as_deref().and_then(|raw| match tickets.verify_signature(raw) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("Ignoring unverifiable ticket: {}", e);
                None
            }
        });

        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());
        let record = match session_id.as_deref() {
            Some(sid) => match sessions.load(sid).await {
                Ok(record) => record.unwrap_or_default(),
                Err(e) => {
                    tracing::error!("Failed to load session record: {}", e);
                    SessionRecord::default()
                }
            },
            None => SessionRecord::default(),
        };

        Self {
            session_id,
            raw_ticket,
            identity,
            record,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Identity present but the store has no name for it.
    pub fn is_desynchronized(&self) -> bool {
        self.is_authenticated() && !self.record.has_name()
    }

    /// Clears the session record and revokes the ticket. Failures are logged;
    /// running it against an empty context does nothing.
    pub async fn tear_down(&self, sessions: &SessionStore) {
        if let Some(sid) = self.session_id.as_deref() {
            if let Err(e) = sessions.clear(sid).await {
                tracing::error!("Failed to clear session record: {}", e);
            }
        }
        if let Some(claims) = &self.identity {
            if let Err(e) = sessions.revoke_ticket(&claims.jti, claims.expires_at()).await {
                tracing::error!("Failed to revoke ticket {}: {}", claims.jti, e);
            }
        }
    }
}
