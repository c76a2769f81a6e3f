use serde::{Deserialize, Serialize};

/// Bare polling answer; deliberately outside the usual envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfoResponse {
    pub remaining_minutes: f64,
    pub is_expiring_soon: bool,
    /// `HH:MM:SS`
    pub formatted_time: String,
}
