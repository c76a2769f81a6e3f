mod error_handler;
mod session;

pub use error_handler::log_errors;
pub use session::{attach_context, session_context};
