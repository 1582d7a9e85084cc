use deadpool_redis::Pool;
use deadpool_redis::redis::{self, Pipeline, RedisError};

use crate::domain::repository::RateLimiter;
use crate::error::OnboardServiceError;

/// Fixed-window counter: the first hit in a window sets the key's TTL.
#[derive(Clone)]
pub struct RedisRateLimiter {
    pub pool: Pool,
    pub window_secs: u64,
}

fn window_key(scope: &str, key: &str) -> String {
    format!("ratelimit:{}:{}", scope, key)
}

/// `INCR` and `EXPIRE … NX` in one `MULTI`/`EXEC`, so a counter never outlives its window
/// and later hits do not push the expiry back. Needs Redis 7+.
fn window_pipeline(key: &str, window_secs: u64) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1u64)
        .cmd("EXPIRE")
        .arg(key)
        .arg(window_secs)
        .arg("NX")
        .ignore();
    pipe
}

impl RateLimiter for RedisRateLimiter {
    async fn check(&self, scope: &str, key: &str, max: u64) -> Result<bool, OnboardServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| OnboardServiceError::Internal(e.into()))?;
        let key = window_key(scope, key);
        let (count,): (u64,) = window_pipeline(&key, self.window_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e: RedisError| OnboardServiceError::Internal(e.into()))?;
        Ok(count <= max)
    }
}
