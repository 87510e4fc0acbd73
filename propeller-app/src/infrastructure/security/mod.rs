mod input_sanitizer;
mod rate_limiter;
mod upload_quota;

pub use input_sanitizer::InputSanitizer;
pub use rate_limiter::{RateLimitError, RateLimitPolicy, RateLimitStatus, RateLimiter};
pub use upload_quota::{UploadLimitError, UploadQuota, UploadQuotaStatus, DAILY_IMAGE_LIMIT};
