// Session clock store: per-client session records and revoked tickets.

pub mod keys;
pub mod models;
pub mod operations;

pub use models::session::SessionRecord;
pub use operations::session::SessionStore;
