mod handler;
mod model;

pub use handler::{index, me};
pub use model::HomeResponse;
