use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GOOGLE_PROVIDER: &str = "google";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn google(id: String, name: String, email: String, picture: Option<String>) -> Self {
        Self {
            id,
            name,
            email,
            picture,
            provider: GOOGLE_PROVIDER.to_string(),
            created_at: Utc::now(),
        }
    }
}
