// src/transfer/limiter.rs
// =============================================================================
// Speed limiting for a single download stream.
//
// This is a coarse throttle, not a token bucket: after each chunk we look at
// the average speed since the transfer started, and while it is above the
// limit we nap for 100ms. The average therefore converges on the limit, but
// short bursts above it are normal.
//
// Rust concepts:
// - FromStr: parse "200K" / "2M" straight into a typed value
// - Newtypes: `RateLimit` instead of a bare f64 that might mean anything
// =============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

pub const ONE_KB: f64 = 1024.0;
pub const ONE_MB: f64 = 1024.0 * 1024.0;

// How long to back off when the transfer is running too fast
pub const THROTTLE_NAP: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid rate limit '{0}' (use a number followed by K or M, e.g. 200K or 2M)")]
pub struct InvalidRateLimit(pub String);

/// A target upper bound on average transfer speed, in bytes per second.
///
/// `RateLimit::UNLIMITED` (the default) disables throttling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateLimit(Option<f64>);

impl RateLimit {
    pub const UNLIMITED: RateLimit = RateLimit(None);

    pub fn bytes_per_sec(limit: f64) -> Self {
        if limit > 0.0 {
            RateLimit(Some(limit))
        } else {
            RateLimit::UNLIMITED
        }
    }

    pub fn limit(&self) -> Option<f64> {
        self.0
    }

    pub fn is_unlimited(&self) -> bool {
        self.0.is_none()
    }
}

impl FromStr for RateLimit {
    type Err = InvalidRateLimit;

    // Accepts "<integer>K" or "<integer>M" (either case); empty means unlimited
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(RateLimit::UNLIMITED);
        }

        let invalid = || InvalidRateLimit(s.to_string());

        let (digits, multiplier) = if let Some(digits) = s.strip_suffix(&['K', 'k'][..]) {
            (digits, ONE_KB)
        } else if let Some(digits) = s.strip_suffix(&['M', 'm'][..]) {
            (digits, ONE_MB)
        } else {
            return Err(invalid());
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let amount: u64 = digits.parse().map_err(|_| invalid())?;
        Ok(RateLimit::bytes_per_sec(amount as f64 * multiplier))
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => write!(f, "unlimited"),
            Some(limit) if limit >= ONE_MB => write!(f, "{:.2} MB/s", limit / ONE_MB),
            Some(limit) => write!(f, "{:.2} KB/s", limit / ONE_KB),
        }
    }
}

/// Tracks one stream's start time and slows it down when it runs ahead.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: RateLimit,
    started_at: Instant,
}

impl RateLimiter {
    pub fn start(limit: RateLimit) -> Self {
        Self {
            limit,
            started_at: Instant::now(),
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Average speed since the transfer started, in bytes per second.
    pub fn average_speed(&self, bytes_received: u64) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            // Nothing measurable yet; report "infinitely fast" only if
            // something was actually received
            return if bytes_received == 0 { 0.0 } else { f64::INFINITY };
        }
        bytes_received as f64 / elapsed
    }

    pub fn is_over_limit(&self, bytes_received: u64) -> bool {
        match self.limit.limit() {
            Some(limit) => self.average_speed(bytes_received) > limit,
            None => false,
        }
    }

    // Naps in THROTTLE_NAP steps until the average drops back under the limit
    pub async fn throttle(&self, bytes_received: u64) {
        while self.is_over_limit(bytes_received) {
            tokio::time::sleep(THROTTLE_NAP).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kilobytes() {
        let limit: RateLimit = "200K".parse().unwrap();
        assert_eq!(limit.limit(), Some(200.0 * 1024.0));
    }

    #[test]
    fn test_parse_megabytes_lowercase() {
        let limit: RateLimit = "2m".parse().unwrap();
        assert_eq!(limit.limit(), Some(2.0 * 1024.0 * 1024.0));
    }

    #[test]
    fn test_parse_empty_is_unlimited() {
        assert!("".parse::<RateLimit>().unwrap().is_unlimited());
        assert!("0K".parse::<RateLimit>().unwrap().is_unlimited());
    }

    #[test]
    fn test_parse_rejects_bad_syntax() {
        for bad in ["200", "K", "2G", "1.5M", "-3K", "2|M", "abcK", "2 M"] {
            assert!(bad.parse::<RateLimit>().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RateLimit::UNLIMITED.to_string(), "unlimited");
        assert_eq!("512K".parse::<RateLimit>().unwrap().to_string(), "512.00 KB/s");
        assert_eq!("3M".parse::<RateLimit>().unwrap().to_string(), "3.00 MB/s");
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_waits_until_average_is_under_limit() {
        let limiter = RateLimiter::start(RateLimit::bytes_per_sec(1024.0));

        // 4 KiB "arrived" instantly; the average only drops to 1 KiB/s after 4s
        limiter.throttle(4096).await;

        let elapsed = limiter.started_at().elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_millis(4200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlimited_never_sleeps() {
        let limiter = RateLimiter::start(RateLimit::UNLIMITED);
        limiter.throttle(u64::MAX).await;
        assert_eq!(limiter.started_at().elapsed(), Duration::ZERO);
    }
}
