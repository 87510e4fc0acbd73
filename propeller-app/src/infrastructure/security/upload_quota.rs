use crate::domain::UploadUsage;
use crate::infrastructure::store::DataStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const DAILY_IMAGE_LIMIT: u32 = 2;

fn quota_window() -> Duration {
    Duration::hours(24)
}

/// Per-user image upload quota: two images per 24 hours, counted from the
/// first image of the window. Reaching the limit starts a cooldown that
/// ends when the window does.
#[derive(Clone)]
pub struct UploadQuota {
    store: Arc<DataStore>,
}

impl UploadQuota {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    /// Records `images` new image uploads for the user, or explains why not.
    pub fn try_consume(
        &self,
        user_id: &str,
        images: u32,
        now: DateTime<Utc>,
    ) -> Result<(), UploadLimitError> {
        if images == 0 {
            return Ok(());
        }
        let mut usage = self.store.usage.entry(user_id.to_string()).or_default();
        consume(&mut usage, images, now)
    }

    /// Gives back images charged by `try_consume` whose upload then failed.
    pub fn refund(&self, user_id: &str, images: u32) {
        if images == 0 {
            return;
        }
        if let Some(mut usage) = self.store.usage.get_mut(user_id) {
            refund(&mut usage, images);
        }
    }

    pub fn status(&self, user_id: &str, now: DateTime<Utc>) -> UploadQuotaStatus {
        let usage = self
            .store
            .usage
            .get(user_id)
            .map(|usage| usage.value().clone())
            .unwrap_or_default();
        status_of(&usage, now)
    }
}

fn window_expired(usage: &UploadUsage, now: DateTime<Utc>) -> bool {
    usage
        .last_upload
        .is_some_and(|first| now - first >= quota_window())
}

fn consume(usage: &mut UploadUsage, images: u32, now: DateTime<Utc>) -> Result<(), UploadLimitError> {
    if let Some(until) = usage.cooldown_until {
        if now < until {
            return Err(UploadLimitError::Cooldown {
                cooldown_until: until,
                remaining_minutes: ceil_minutes(until - now),
            });
        }
    }

    if window_expired(usage, now) {
        *usage = UploadUsage::default();
    }

    if usage.count + images > DAILY_IMAGE_LIMIT {
        return Err(UploadLimitError::LimitExceeded {
            limit: DAILY_IMAGE_LIMIT,
            used: usage.count,
            remaining: DAILY_IMAGE_LIMIT.saturating_sub(usage.count),
        });
    }

    usage.count += images;
    let window_start = *usage.last_upload.get_or_insert(now);
    if usage.count >= DAILY_IMAGE_LIMIT {
        usage.cooldown_until = Some(window_start + quota_window());
    }
    Ok(())
}

fn refund(usage: &mut UploadUsage, images: u32) {
    usage.count = usage.count.saturating_sub(images);
    if usage.count < DAILY_IMAGE_LIMIT {
        usage.cooldown_until = None;
    }
    if usage.count == 0 {
        usage.last_upload = None;
    }
}

fn status_of(usage: &UploadUsage, now: DateTime<Utc>) -> UploadQuotaStatus {
    let fresh = UploadUsage::default();
    let usage = if window_expired(usage, now) { &fresh } else { usage };

    let cooldown_until = usage.cooldown_until.filter(|until| now < *until);

    UploadQuotaStatus {
        limit: DAILY_IMAGE_LIMIT,
        used: usage.count,
        remaining: DAILY_IMAGE_LIMIT.saturating_sub(usage.count),
        cooldown_active: cooldown_until.is_some(),
        cooldown_until,
        cooldown_minutes: cooldown_until.map(|until| ceil_minutes(until - now)),
        reset_in: usage
            .last_upload
            .map(|first| ceil_minutes(first + quota_window() - now)),
        last_upload: usage.last_upload,
    }
}

/// Whole minutes, rounded up; zero for non-positive durations.
fn ceil_minutes(duration: Duration) -> i64 {
    let ms = duration.num_milliseconds();
    if ms <= 0 {
        0
    } else {
        (ms + 59_999) / 60_000
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuotaStatus {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub cooldown_active: bool,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub cooldown_until: Option<DateTime<Utc>>,
    pub cooldown_minutes: Option<i64>,
    pub reset_in: Option<i64>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_upload: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadLimitError {
    Cooldown {
        cooldown_until: DateTime<Utc>,
        remaining_minutes: i64,
    },
    LimitExceeded {
        limit: u32,
        used: u32,
        remaining: u32,
    },
}

impl UploadLimitError {
    pub fn message(&self) -> String {
        match self {
            Self::Cooldown {
                remaining_minutes, ..
            } => format!(
                "You've reached your daily limit. Please wait {} minutes.",
                remaining_minutes
            ),
            Self::LimitExceeded {
                limit, remaining, ..
            } => format!(
                "You can only upload {} images per day. You have {} upload(s) remaining.",
                limit, remaining
            ),
        }
    }
}
