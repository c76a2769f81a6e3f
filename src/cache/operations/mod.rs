/// Cache operations
pub mod session;

pub use session::*;
