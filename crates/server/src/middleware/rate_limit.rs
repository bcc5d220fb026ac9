//! Rate limiting middleware using token bucket algorithm
//!
//! Models the fixed request-count-per-window gate on the GraphQL
//! endpoint: a window's worth of requests may burst, refilled evenly
//! across the window.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Create a new rate limiter allowing `max_requests` per `window`
pub fn create_rate_limiter(max_requests: u32, window: Duration) -> Arc<GlobalRateLimiter> {
    let max = NonZeroU32::new(max_requests.max(1)).expect("nonzero rate limit");
    let quota = Quota::with_period(window / max.get())
        .expect("nonzero rate limit period")
        .allow_burst(max);

    Arc::new(RateLimiter::direct(quota))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    request: Request,
    next: Next,
    limiter: Arc<GlobalRateLimiter>,
) -> Result<Response, StatusCode> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!("Rate limit exceeded");
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = create_rate_limiter(100, Duration::from_secs(900));
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_burst_exhaustion() {
        let limiter = create_rate_limiter(2, Duration::from_secs(3600));
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
