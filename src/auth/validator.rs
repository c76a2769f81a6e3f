use chrono::Duration;

use crate::auth::context::AuthContext;
use crate::auth::ticket::TicketCodec;
use crate::cache::{SessionRecord, SessionStore};
use crate::clock::SharedClock;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    MissingSessionName,
    IdleTimeout,
    TicketRejected,
    TicketRevoked,
    TicketExpired,
    StoreUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionVerdict {
    Valid,
    /// No identity on the request at all.
    Unauthenticated,
    /// There was an identity, but it can no longer be honoured.
    Expired(ExpiryReason),
}

impl SessionVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionVerdict::Valid)
    }
}

/// Decides whether a request's ticket and session record still hold together.
#[derive(Clone)]
pub struct SessionValidator {
    sessions: SessionStore,
    tickets: TicketCodec,
    clock: SharedClock,
    idle_timeout: Duration,
    warning_window: Duration,
}

impl SessionValidator {
    pub fn new(
        sessions: SessionStore,
        tickets: TicketCodec,
        clock: SharedClock,
        idle_timeout: Duration,
        warning_window: Duration,
    ) -> Self {
        Self {
            sessions,
            tickets,
            clock,
            idle_timeout,
            warning_window,
        }
    }

    /// Validates the request and forces a logout on anything but `Valid`.
    ///
    /// Never fails: store errors are logged and count as an expired session.
    pub async fn validate(&self, ctx: &AuthContext) -> SessionVerdict {
        let verdict = match self.check(ctx).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!("Error during session validation: {}", e);
                SessionVerdict::Expired(ExpiryReason::StoreUnavailable)
            }
        };

        if !verdict.is_valid() {
            self.force_logout(ctx).await;
        }
        verdict
    }

    async fn check(&self, ctx: &AuthContext) -> Result<SessionVerdict, StoreError> {
        let Some(identity) = &ctx.identity else {
            return Ok(SessionVerdict::Unauthenticated);
        };

        if !ctx.record.has_name() {
            tracing::warn!("Session validation failed: no session name for {}", identity.email);
            return Ok(SessionVerdict::Expired(ExpiryReason::MissingSessionName));
        }

        let now = self.clock.now();
        if let Some(created) = ctx.record.created_at() {
            if now - created > self.idle_timeout {
                tracing::warn!("Session validation failed: idle timeout for {}", identity.email);
                return Ok(SessionVerdict::Expired(ExpiryReason::IdleTimeout));
            }
        }

        let reauthenticated = ctx
            .raw_ticket
            .as_deref()
            .map(|raw| self.tickets.verify_signature(raw))
            .transpose();
        match reauthenticated {
            Ok(Some(claims)) if claims.jti == identity.jti => {}
            _ => {
                tracing::warn!("Session validation failed: ticket authentication failed");
                return Ok(SessionVerdict::Expired(ExpiryReason::TicketRejected));
            }
        }
        if self.sessions.is_ticket_revoked(&identity.jti).await? {
            tracing::warn!("Session validation failed: ticket {} was revoked", identity.jti);
            return Ok(SessionVerdict::Expired(ExpiryReason::TicketRevoked));
        }

        if identity.expires_at() < now {
            tracing::warn!("Session validation failed: ticket expired for {}", identity.email);
            return Ok(SessionVerdict::Expired(ExpiryReason::TicketExpired));
        }

        Ok(SessionVerdict::Valid)
    }

    pub async fn force_logout(&self, ctx: &AuthContext) {
        if ctx.session_id.is_none() && ctx.identity.is_none() {
            return;
        }
        ctx.tear_down(&self.sessions).await;
        tracing::info!("User forcefully logged out due to session/ticket expiration");
    }

    /// Idle time left, floored at zero. Zero when the creation marker is
    /// missing or unreadable.
    pub fn remaining_time(&self, record: &SessionRecord) -> Duration {
        let Some(created) = record.created_at() else {
            return Duration::zero();
        };
        let elapsed = (self.clock.now() - created).max(Duration::zero());
        (self.idle_timeout - elapsed).max(Duration::zero())
    }

    pub fn is_expiring_soon(&self, record: &SessionRecord) -> bool {
        let remaining = self.remaining_time(record);
        remaining > Duration::zero() && remaining <= self.warning_window
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::auth::identity::{ExternalIdentity, Provider};
    use crate::auth::ticket::TicketClaims;
    use crate::clock::{Clock, ManualClock};

    const SID: &str = "sid-1";

    struct Fixture {
        clock: ManualClock,
        sessions: SessionStore,
        tickets: TicketCodec,
        validator: SessionValidator,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        let shared: SharedClock = Arc::new(clock.clone());
        let sessions = SessionStore::memory(shared.clone(), std::time::Duration::from_secs(4 * 3600));
        let tickets = TicketCodec::new("test-secret");
        let validator = SessionValidator::new(
            sessions.clone(),
            tickets.clone(),
            shared,
            Duration::hours(1),
            Duration::minutes(5),
        );
        Fixture {
            clock,
            sessions,
            tickets,
            validator,
        }
    }

    impl Fixture {
        /// Logs in at the current clock time with a ticket valid for `window`.
        async fn login(&self, window: Duration) -> AuthContext {
            let identity = ExternalIdentity {
                provider: Provider::Google,
                subject: "g-1".into(),
                display_name: Some("Ada".into()),
                email: "ada@example.com".into(),
                picture_url: None,
            };
            let claims = TicketClaims::issue(&identity, self.clock.now(), window);
            let raw = self.tickets.sign(&claims).unwrap();
            let record = SessionRecord::new("Ada", self.clock.now());
            self.sessions.save(SID, &record).await.unwrap();
            AuthContext {
                session_id: Some(SID.into()),
                raw_ticket: Some(raw),
                identity: Some(claims),
                record,
            }
        }
    }

    #[tokio::test]
    async fn fresh_session_is_valid() {
        let f = fixture();
        let ctx = f.login(Duration::hours(2)).await;
        assert_eq!(f.validator.validate(&ctx).await, SessionVerdict::Valid);
        assert!(f.sessions.load(SID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn anonymous_request_is_unauthenticated() {
        let f = fixture();
        let verdict = f.validator.validate(&AuthContext::default()).await;
        assert_eq!(verdict, SessionVerdict::Unauthenticated);
        assert!(!verdict.is_valid());
    }

    #[tokio::test]
    async fn valid_at_fifty_nine_minutes_and_expiring_soon() {
        let f = fixture();
        let ctx = f.login(Duration::hours(2)).await;
        f.clock.advance(Duration::minutes(59));

        assert!(f.validator.validate(&ctx).await.is_valid());
        assert_eq!(f.validator.remaining_time(&ctx.record), Duration::minutes(1));
        assert!(f.validator.is_expiring_soon(&ctx.record));
    }

    #[tokio::test]
    async fn idle_timeout_forces_logout() {
        let f = fixture();
        let ctx = f.login(Duration::hours(2)).await;
        f.clock.advance(Duration::minutes(61));

        assert_eq!(
            f.validator.validate(&ctx).await,
            SessionVerdict::Expired(ExpiryReason::IdleTimeout)
        );
        assert_eq!(f.sessions.load(SID).await.unwrap(), None);
        assert!(f.sessions.is_ticket_revoked(&ctx.identity.as_ref().unwrap().jti).await.unwrap());

        let reloaded = f.sessions.load(SID).await.unwrap().unwrap_or_default();
        assert_eq!(f.validator.remaining_time(&reloaded), Duration::zero());
    }

    #[tokio::test]
    async fn missing_name_is_a_desync() {
        let f = fixture();
        let mut ctx = f.login(Duration::hours(2)).await;
        ctx.record.name = Some(String::new());
        assert_eq!(
            f.validator.validate(&ctx).await,
            SessionVerdict::Expired(ExpiryReason::MissingSessionName)
        );
        assert_eq!(f.sessions.load(SID).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_ticket_is_rejected_inside_idle_window() {
        let f = fixture();
        let ctx = f.login(Duration::minutes(30)).await;
        f.clock.advance(Duration::minutes(31));
        assert_eq!(
            f.validator.validate(&ctx).await,
            SessionVerdict::Expired(ExpiryReason::TicketExpired)
        );
    }

    #[tokio::test]
    async fn revoked_ticket_is_rejected() {
        let f = fixture();
        let ctx = f.login(Duration::hours(2)).await;
        let claims = ctx.identity.clone().unwrap();
        f.sessions.revoke_ticket(&claims.jti, claims.expires_at()).await.unwrap();
        assert_eq!(
            f.validator.validate(&ctx).await,
            SessionVerdict::Expired(ExpiryReason::TicketRevoked)
        );
    }

    #[tokio::test]
    async fn tampered_raw_ticket_fails_reauthentication() {
        let f = fixture();
        let mut ctx = f.login(Duration::hours(2)).await;
        ctx.raw_ticket = Some(TicketCodec::new("other").sign(ctx.identity.as_ref().unwrap()).unwrap());
        assert_eq!(
            f.validator.validate(&ctx).await,
            SessionVerdict::Expired(ExpiryReason::TicketRejected)
        );
    }

    #[tokio::test]
    async fn unparsable_creation_marker_skips_idle_check() {
        let f = fixture();
        let mut ctx = f.login(Duration::hours(3)).await;
        ctx.record.session_created = Some("not a timestamp".into());
        f.clock.advance(Duration::minutes(90));

        assert!(f.validator.validate(&ctx).await.is_valid());
        assert_eq!(f.validator.remaining_time(&ctx.record), Duration::zero());
        assert!(!f.validator.is_expiring_soon(&ctx.record));
    }

    #[tokio::test]
    async fn store_failure_counts_as_expired() {
        let f = fixture();
        let ctx = f.login(Duration::hours(2)).await;
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let broken = SessionValidator::new(
            SessionStore::redis(
                Arc::new(client),
                Arc::new(f.clock.clone()),
                std::time::Duration::from_secs(60),
            ),
            f.tickets.clone(),
            Arc::new(f.clock.clone()),
            Duration::hours(1),
            Duration::minutes(5),
        );
        assert_eq!(
            broken.validate(&ctx).await,
            SessionVerdict::Expired(ExpiryReason::StoreUnavailable)
        );
    }

    #[tokio::test]
    async fn expiring_soon_window_edges() {
        let f = fixture();
        let ctx = f.login(Duration::hours(2)).await;
        let record = ctx.record;

        f.clock.advance(Duration::minutes(54));
        assert_eq!(f.validator.remaining_time(&record), Duration::minutes(6));
        assert!(!f.validator.is_expiring_soon(&record));

        f.clock.advance(Duration::minutes(1));
        assert!(f.validator.is_expiring_soon(&record));

        f.clock.advance(Duration::minutes(5));
        assert_eq!(f.validator.remaining_time(&record), Duration::zero());
        assert!(!f.validator.is_expiring_soon(&record));
    }

    #[tokio::test]
    async fn remaining_time_never_increases() {
        let f = fixture();
        let record = f.login(Duration::hours(2)).await.record;
        let mut previous = f.validator.remaining_time(&record);
        assert_eq!(previous, Duration::hours(1));
        for _ in 0..20 {
            f.clock.advance(Duration::minutes(7));
            let remaining = f.validator.remaining_time(&record);
            assert!(remaining <= previous);
            assert!(remaining >= Duration::zero());
            previous = remaining;
        }
    }

    #[tokio::test]
    async fn future_creation_marker_is_capped_at_idle_timeout() {
        let f = fixture();
        let record = SessionRecord::new("Ada", f.clock.now() + Duration::hours(3));
        assert_eq!(f.validator.remaining_time(&record), Duration::hours(1));
    }
}
