use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::errors::AppError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Serialize, Deserialize)]
pub struct WelcomePayload {
    pub message: String,
    pub version: String,
}

#[derive(Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store_backend: String,
    pub uptime_seconds: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ProbeStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

// Define an AppState struct to hold shared application state
pub struct AppState {
    pub start_time: Instant,
    pub name: String,
    pub version: String,
}
