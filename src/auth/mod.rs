//! Session lifecycle: ticket issuance, session reconciliation and forced logout.

pub mod context;
pub mod cookies;
pub mod guard;
pub mod identity;
pub mod login;
pub mod ticket;
pub mod validator;

pub use context::AuthContext;
pub use guard::{GuardRejection, ValidSession};
pub use identity::{ExternalIdentity, IdentityClient, Provider};
pub use login::{IssuedLogin, LoginService};
pub use ticket::{TicketClaims, TicketCodec};
pub use validator::{ExpiryReason, SessionValidator, SessionVerdict};
