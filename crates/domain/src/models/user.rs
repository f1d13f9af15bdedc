//! User directory model.

use serde::{Deserialize, Serialize};

/// A user that can own geozones, as returned by the user service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Request body for the user-service directory lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSearchRequest {
    pub page: u32,
    pub limit: u32,
    #[serde(default = "empty_search")]
    pub search: serde_json::Value,
}

impl UserSearchRequest {
    /// Directory lookup with no filter applied.
    pub fn unfiltered(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            search: empty_search(),
        }
    }
}

fn empty_search() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

/// Response envelope from the user service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub data: Vec<User>,
}
