use chrono::Duration;
use uuid::Uuid;

use crate::auth::context::AuthContext;
use crate::auth::identity::ExternalIdentity;
use crate::auth::ticket::{TicketClaims, TicketCodec};
use crate::cache::{SessionRecord, SessionStore};
use crate::clock::SharedClock;
use crate::database::{NewUser, UserEntity, UserStore};
use crate::error::{AuthError, StoreError};

/// Result of a completed login: everything the response needs to set cookies.
#[derive(Debug, Clone)]
pub struct IssuedLogin {
    pub session_id: String,
    pub ticket: String,
    pub claims: TicketClaims,
    /// `None` when provisioning failed and login went ahead anyway.
    pub user: Option<UserEntity>,
}

#[derive(Clone)]
pub struct LoginService {
    users: UserStore,
    sessions: SessionStore,
    tickets: TicketCodec,
    clock: SharedClock,
    ticket_window: Duration,
    strict_provisioning: bool,
}

impl LoginService {
    pub fn new(
        users: UserStore,
        sessions: SessionStore,
        tickets: TicketCodec,
        clock: SharedClock,
        ticket_window: Duration,
        strict_provisioning: bool,
    ) -> Self {
        Self {
            users,
            sessions,
            tickets,
            clock,
            ticket_window,
            strict_provisioning,
        }
    }

    /// Turns a completed external handshake into a user record, a signed
    /// ticket and a fresh session record.
    ///
    /// Any session the request already carried is torn down first, so a
    /// repeated login for the same identity just reissues state.
    pub async fn handle_external_login(
        &self,
        previous: &AuthContext,
        handshake: Result<ExternalIdentity, AuthError>,
    ) -> Result<IssuedLogin, AuthError> {
        let identity = handshake.inspect_err(|e| tracing::warn!("External login rejected: {}", e))?;

        let user = match self.provision_user(&identity).await {
            Ok(user) => Some(user),
            Err(e) if self.strict_provisioning => {
                tracing::error!("Aborting login for {}: {}", identity.email, e);
                return Err(AuthError::DurableStoreFailure(e.to_string()));
            }
            Err(e) => {
                tracing::error!("Error provisioning user {}: {}", identity.email, e);
                None
            }
        };

        let now = self.clock.now();
        let claims = TicketClaims::issue(&identity, now, self.ticket_window);
        let ticket = self.tickets.sign(&claims)?;

        previous.tear_down(&self.sessions).await;

        let session_id = Uuid::new_v4().to_string();
        let record = SessionRecord::new(identity.session_name(), now);
        self.sessions
            .save(&session_id, &record)
            .await
            .map_err(|e| AuthError::SessionUnavailable(e.to_string()))?;

        tracing::info!("{} login succeeded for {}", identity.provider, identity.email);
        Ok(IssuedLogin {
            session_id,
            ticket,
            claims,
            user,
        })
    }

    async fn provision_user(&self, identity: &ExternalIdentity) -> Result<UserEntity, StoreError> {
        if let Some(existing) = self.users.find_by_email(&identity.email).await? {
            return Ok(existing);
        }
        let user = NewUser::from_identity(
            identity.display_name.as_deref(),
            &identity.email,
            self.clock.now(),
        );
        self.users.upsert_by_email(&user).await
    }

    /// Best-effort; safe with no session or ticket.
    pub async fn sign_out(&self, ctx: &AuthContext) {
        ctx.tear_down(&self.sessions).await;
        if let Some(claims) = &ctx.identity {
            tracing::info!("{} signed out", claims.email);
        }
    }
}
