// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for bulk deletion.
#[derive(Debug, Default)]
pub struct PurgeMetrics {
	submissions: AtomicU64,
	retries: AtomicU64,
	deleted: AtomicU64,
	abandoned: AtomicU64,
}
impl PurgeMetrics {
	/// Returns the total number of batch submissions, retries included.
	pub fn submissions(&self) -> u64 {
		self.submissions.load(Ordering::Relaxed)
	}

	/// Returns the number of submissions that resent an unprocessed remainder.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of records confirmed deleted.
	pub fn deleted(&self) -> u64 {
		self.deleted.load(Ordering::Relaxed)
	}

	/// Returns the number of records abandoned after the final attempt.
	pub fn abandoned(&self) -> u64 {
		self.abandoned.load(Ordering::Relaxed)
	}

	pub(crate) fn record_submission(&self, attempt: u32) {
		self.submissions.fetch_add(1, Ordering::Relaxed);

		if attempt > 1 {
			self.retries.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn record_settled(&self, deleted: u64, abandoned: u64) {
		self.deleted.fetch_add(deleted, Ordering::Relaxed);
		self.abandoned.fetch_add(abandoned, Ordering::Relaxed);
	}
}
