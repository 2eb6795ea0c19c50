use std::collections::HashMap;
use std::sync::Mutex;
use time::{OffsetDateTime, Duration};
use tracing::{warn, error};

use crate::error::ApiError;

#[derive(Debug)]
struct RateLimit {
    attempts: u32,
    window_start: OffsetDateTime,
}

/// Fixed-window attempt counter keyed by caller.
#[derive(Debug)]
pub struct RateLimiter {
    limits: Mutex<HashMap<String, RateLimit>>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window_minutes: i64) -> Self {
        Self {
            limits: Mutex::new(HashMap::new()),
            max_attempts,
            window: Duration::minutes(window_minutes),
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> Result<(), ApiError> {
        self.check_at(key, OffsetDateTime::now_utc())
    }

    fn check_at(&self, key: &str, now: OffsetDateTime) -> Result<(), ApiError> {
        let mut limits = self.limits.lock().map_err(|e| {
            error!("Failed to acquire rate limit lock: {}", e);
            ApiError::Internal("rate limiter unavailable".into())
        })?;

        limits.retain(|_, limit| now - limit.window_start <= self.window * 2);

        let limit = limits.entry(key.to_string()).or_insert(RateLimit {
            attempts: 0,
            window_start: now,
        });

        if now - limit.window_start > self.window {
            *limit = RateLimit { attempts: 0, window_start: now };
        }

        if limit.attempts >= self.max_attempts {
            let minutes_to_wait = (limit.window_start + self.window - now).whole_minutes().max(1);
            warn!("Rate limit triggered for key {}", key);
            return Err(ApiError::RateLimited(format!(
                "Rate limit exceeded. Please try again in {} minutes.",
                minutes_to_wait
            )));
        }

        limit.attempts += 1;
        Ok(())
    }
}
