use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image upload bookkeeping for one user. Timestamps travel as epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUsage {
    pub count: u32,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_upload: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub cooldown_until: Option<DateTime<Utc>>,
}
