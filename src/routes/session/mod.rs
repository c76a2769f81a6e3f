mod handler;
mod model;

pub(crate) use handler::describe;
pub use handler::{session_info, validate};
pub use model::{SessionInfoResponse, ValidateResponse};
