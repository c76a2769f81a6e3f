use serde::{Deserialize, Serialize};

use crate::routes::session::SessionInfoResponse;

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub session: SessionInfoResponse,
}
