use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const CLEANUP_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
    pub message: &'static str,
}

impl RateLimitPolicy {
    /// Every `/api/*` request.
    pub const API: Self = Self::new(
        100,
        Duration::from_secs(15 * 60),
        "Too many requests from this IP, please try again later.",
    );

    /// Sending chat messages.
    pub const CHAT: Self = Self::new(20, Duration::from_secs(60), "Too many messages, please slow down.");

    pub const UPLOAD: Self = Self::new(
        10,
        Duration::from_secs(60 * 60),
        "Upload limit exceeded, please try again later.",
    );

    pub const fn new(max_requests: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max_requests,
            window,
            message,
        }
    }
}

#[derive(Clone)]
struct RequestRecord {
    count: u32,
    window_start: Instant,
}

/// What an allowed request still has left in the current window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Fixed-window request counter per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    requests: Arc<DashMap<IpAddr, RequestRecord>>,
    last_cleanup: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            requests: Arc::new(DashMap::new()),
            last_cleanup: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn check_rate_limit(&self, ip: IpAddr) -> Result<RateLimitStatus, RateLimitError> {
        self.maybe_cleanup();

        let now = Instant::now();
        let mut record = self.requests.entry(ip).or_insert_with(|| RequestRecord {
            count: 0,
            window_start: now,
        });

        if now.duration_since(record.window_start) >= self.policy.window {
            record.count = 0;
            record.window_start = now;
        }

        let reset_after = self
            .policy
            .window
            .saturating_sub(now.duration_since(record.window_start));

        if record.count >= self.policy.max_requests {
            return Err(RateLimitError {
                message: self.policy.message,
                limit: self.policy.max_requests,
                retry_after: reset_after,
            });
        }

        record.count += 1;

        Ok(RateLimitStatus {
            limit: self.policy.max_requests,
            remaining: self.policy.max_requests - record.count,
            reset_after,
        })
    }

    fn maybe_cleanup(&self) {
        let Ok(mut last_cleanup) = self.last_cleanup.lock() else {
            return;
        };
        if last_cleanup.elapsed() > Duration::from_secs(CLEANUP_INTERVAL_SECS) {
            let window = self.policy.window;
            self.requests
                .retain(|_, record| record.window_start.elapsed() < window);
            *last_cleanup = Instant::now();
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitError {
    pub message: &'static str,
    pub limit: u32,
    pub retry_after: Duration,
}

impl RateLimitError {
    /// Whole seconds until the window resets, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}
