//! Backend connection configuration.

use serde::Deserialize;

/// Configuration for the geofence backend and the user directory service.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Geofence service base URL, e.g. `https://api.example.com/api/v1/geofence`.
    #[serde(default)]
    pub base_url: String,

    /// User directory endpoint URL.
    #[serde(default)]
    pub user_service_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Use the in-memory backend instead of HTTP (offline / demo runs).
    #[serde(default)]
    pub mock: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_service_url: String::new(),
            timeout_ms: default_timeout_ms(),
            mock: false,
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}
