//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use postforge_common::errors::AppError;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Shared limiter plus the configured rate reported to rejected clients
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<GlobalRateLimiter>,
    per_second: u32,
}

/// Create a new rate limiter; a zero rate is raised to one
pub fn create_rate_limiter(requests_per_second: u32, burst: u32) -> RateLimit {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(rate).max(rate);

    RateLimit {
        limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate).allow_burst(burst))),
        per_second: rate.get(),
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(request: Request, next: Next, limit: RateLimit) -> Response {
    match limit.limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            AppError::RateLimited {
                limit: limit.per_second,
            }
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_rate_limiter_creation() {
        let limit = create_rate_limiter(100, 200);
        assert_ok!(limit.limiter.check());
        assert_eq!(limit.per_second, 100);
    }

    #[test]
    fn test_burst_exhaustion() {
        let limit = create_rate_limiter(1, 2);
        assert_ok!(limit.limiter.check());
        assert_ok!(limit.limiter.check());
        assert_err!(limit.limiter.check());
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let limit = create_rate_limiter(0, 0);
        assert_eq!(limit.per_second, 1);
        assert_ok!(limit.limiter.check());
    }
}
