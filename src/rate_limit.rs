//! Fixed-window rate limiting for expensive operations (AI calls, bulk deletes).
//!
//! Each key owns one bucket holding a counter and the instant its window closes. The first call
//! of a window opens it with `count = 1`; later calls increment until `limit` is reached, after
//! which calls are denied without touching the counter until the window closes. Bursts of up to
//! `2 * limit` across a window boundary are possible.
//!
//! Buckets are never removed on their own, so the map grows with the number of distinct keys
//! seen. Long-running processes that key by client origin should call
//! [`RateLimiter::purge_expired`] periodically.

// crates.io
use time::PrimitiveDateTime;
// self
use crate::{
	_prelude::*,
	obs::{self, GuardKind, GuardOutcome},
};

/// Builds the conventional `<operation>:<identity>:<origin>` bucket key.
pub fn rate_limit_key(operation: &str, identity: &str, origin: &str) -> String {
	format!("{operation}:{identity}:{origin}")
}

fn window_end(now: OffsetDateTime, window: Duration) -> OffsetDateTime {
	now.checked_add(window).unwrap_or(if window.is_negative() {
		PrimitiveDateTime::MIN.assume_utc()
	} else {
		PrimitiveDateTime::MAX.assume_utc()
	})
}

/// Counter state for one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitBucket {
	/// Calls admitted in the current window.
	pub count: u32,
	/// Instant the current window closes.
	pub reset_at: OffsetDateTime,
}

/// Result of [`RateLimiter::check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
	/// Whether the call may proceed.
	pub allowed: bool,
	/// Calls still available in the current window.
	pub remaining: u32,
	/// Instant the current window closes.
	pub reset_at: OffsetDateTime,
}
impl RateLimitDecision {
	/// Time left until the window closes, never negative.
	pub fn retry_after(&self, now: OffsetDateTime) -> Duration {
		let delta = self.reset_at - now;

		if delta.is_positive() { delta } else { Duration::ZERO }
	}
}

/// In-process fixed-window limiter shared by request handlers.
///
/// Clones share the same buckets. Construct one per process (or per test) and inject it; there
/// is no global instance.
#[derive(Clone, Debug, Default)]
pub struct RateLimiter(Arc<Mutex<HashMap<String, RateLimitBucket>>>);
impl RateLimiter {
	/// Admits or rejects a call for `key` at the current instant.
	pub fn check(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
		self.check_at(key, limit, window, OffsetDateTime::now_utc())
	}

	/// Admits or rejects a call for `key` at `now`.
	///
	/// A `limit` of zero denies every call and leaves no bucket behind. This departs from the
	/// plain fixed-window rule, where a call finding no bucket always opens one and is admitted.
	/// Windows reaching past the largest representable instant close at that instant.
	pub fn check_at(
		&self,
		key: &str,
		limit: u32,
		window: Duration,
		now: OffsetDateTime,
	) -> RateLimitDecision {
		let decision = if limit == 0 {
			RateLimitDecision { allowed: false, remaining: 0, reset_at: window_end(now, window) }
		} else {
			Self::admit(&mut self.0.lock(), key, limit, window, now)
		};

		obs::record_guard_outcome(
			GuardKind::RateLimit,
			if decision.allowed { GuardOutcome::Success } else { GuardOutcome::Failure },
		);

		decision
	}

	fn admit(
		buckets: &mut HashMap<String, RateLimitBucket>,
		key: &str,
		limit: u32,
		window: Duration,
		now: OffsetDateTime,
	) -> RateLimitDecision {
		if let Some(bucket) = buckets.get_mut(key).filter(|bucket| now < bucket.reset_at) {
			if bucket.count >= limit {
				return RateLimitDecision { allowed: false, remaining: 0, reset_at: bucket.reset_at };
			}

			bucket.count += 1;

			return RateLimitDecision {
				allowed: true,
				remaining: limit - bucket.count,
				reset_at: bucket.reset_at,
			};
		}

		let reset_at = window_end(now, window);

		buckets.insert(key.to_owned(), RateLimitBucket { count: 1, reset_at });

		RateLimitDecision { allowed: true, remaining: limit - 1, reset_at }
	}

	/// Current bucket for `key`, if any.
	pub fn bucket(&self, key: &str) -> Option<RateLimitBucket> {
		self.0.lock().get(key).copied()
	}

	/// Drops every bucket whose window closed at or before `now`; returns how many were removed.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let mut buckets = self.0.lock();
		let before = buckets.len();

		buckets.retain(|_, bucket| now < bucket.reset_at);

		before - buckets.len()
	}

	/// Number of tracked keys.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Returns `true` when no key is tracked.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}
}
