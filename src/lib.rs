use std::sync::Arc;

use auth::{IdentityClient, LoginService, SessionValidator, TicketCodec};
use cache::SessionStore;
use clock::SharedClock;
use config::Config;
use database::UserStore;

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clock: SharedClock,
    pub sessions: SessionStore,
    pub users: UserStore,
    pub tickets: TicketCodec,
    pub identity: IdentityClient,
    pub validator: SessionValidator,
    pub login: LoginService,
}

impl AppState {
    /// Wires the session services on top of already-connected stores.
    pub fn new(
        config: Config,
        sessions: SessionStore,
        users: UserStore,
        clock: SharedClock,
    ) -> Result<Self, reqwest::Error> {
        let tickets = TicketCodec::new(&config.ticket_secret);
        let identity = IdentityClient::new(
            &config.facebook_graph_url,
            &config.google_userinfo_url,
            config.identity_timeout(),
        )?;
        let validator = SessionValidator::new(
            sessions.clone(),
            tickets.clone(),
            clock.clone(),
            config.idle_timeout(),
            config.session_warning(),
        );
        let login = LoginService::new(
            users.clone(),
            sessions.clone(),
            tickets.clone(),
            clock.clone(),
            config.ticket_expiration(),
            config.strict_user_provisioning,
        );

        Ok(Self {
            config: Arc::new(config),
            clock,
            sessions,
            users,
            tickets,
            identity,
            validator,
            login,
        })
    }
}
