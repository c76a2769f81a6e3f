/// Cache key builders.
pub mod session_keys;

pub use session_keys::{revoked_ticket_key, session_key};
