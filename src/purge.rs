//! Bulk deletion of everything a user owns in a paginated, batch-limited store.
//!
//! [`PurgeEngine::purge_owner`] enumerates the owner's keys page by page, deletes them in
//! batches no larger than the store accepts, and resubmits only the keys a batch left
//! unprocessed with a linear back-off. Whatever is still unprocessed after the last attempt is
//! counted and reported, never dropped silently, so callers can tell a complete purge from a
//! partial one.

/// Counters shared by purge engine clones.
pub mod metrics;
/// Retry back-off seam.
pub mod sleep;

pub use metrics::PurgeMetrics;
#[cfg(feature = "tokio")] pub use sleep::TokioSleep;
pub use sleep::{RetrySleep, SleepFuture};

// self
use crate::{
	_prelude::*,
	auth::SubjectId,
	obs::{self, GuardKind, GuardOutcome, GuardSpan},
	store::{DEFAULT_MAX_BATCH_SIZE, PageCursor, RecordKey, RecordStore, StoreError},
};

/// Tunables for [`PurgeEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurgeConfig {
	max_batch_size: usize,
	max_attempts: u32,
	base_delay: Duration,
}
impl PurgeConfig {
	/// Default number of submissions per batch: one initial write plus five retries.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
	/// Default retry unit; attempt `n` waits `n * base_delay` before the next submission.
	pub const DEFAULT_BASE_DELAY: Duration = Duration::milliseconds(200);

	/// Caps the batch size (at least one). The store's own limit still applies.
	pub fn with_max_batch_size(mut self, max: usize) -> Self {
		self.max_batch_size = max.max(1);

		self
	}

	/// Caps submissions per batch (at least one).
	pub fn with_max_attempts(mut self, attempts: u32) -> Self {
		self.max_attempts = attempts.max(1);

		self
	}

	/// Overrides the retry unit; negative values clamp to zero.
	pub fn with_base_delay(mut self, delay: Duration) -> Self {
		self.base_delay = if delay.is_negative() { Duration::ZERO } else { delay };

		self
	}

	/// Batch size cap.
	pub fn max_batch_size(&self) -> usize {
		self.max_batch_size
	}

	/// Submission cap per batch.
	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// Retry unit.
	pub fn base_delay(&self) -> Duration {
		self.base_delay
	}

	/// Delay slept after failed attempt number `attempt` (1-based), saturating at
	/// [`Duration::MAX`].
	pub fn delay_after(&self, attempt: u32) -> Duration {
		i32::try_from(attempt)
			.ok()
			.and_then(|attempt| self.base_delay.checked_mul(attempt))
			.unwrap_or(Duration::MAX)
	}
}
impl Default for PurgeConfig {
	fn default() -> Self {
		Self {
			max_batch_size: DEFAULT_MAX_BATCH_SIZE,
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
			base_delay: Self::DEFAULT_BASE_DELAY,
		}
	}
}

/// Settlement of one batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
	/// Keys in the batch.
	pub size: usize,
	/// Keys confirmed deleted.
	pub deleted: usize,
	/// Keys still unprocessed after the final attempt.
	pub unprocessed: usize,
	/// Submissions made, between one and the configured maximum.
	pub attempts: u32,
}

/// Aggregate result of a purge.
///
/// `deleted + unprocessed` equals the number of keys enumerated.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeOutcome {
	/// Records confirmed deleted.
	pub deleted: u64,
	/// Records abandoned after exhausting retries.
	pub unprocessed: u64,
	/// Pages enumerated.
	pub pages: u32,
	/// Per-batch settlements, in submission order.
	pub batches: Vec<BatchReport>,
}
impl PurgeOutcome {
	/// Returns `true` when nothing was left behind.
	pub fn is_complete(&self) -> bool {
		self.unprocessed == 0
	}

	fn absorb(&mut self, report: BatchReport) {
		self.deleted += report.deleted as u64;
		self.unprocessed += report.unprocessed as u64;
		self.batches.push(report);
	}
}

/// Keys gathered for one owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectedKeys {
	/// Every key the owner holds, in store order.
	pub keys: Vec<RecordKey>,
	/// Pages the query spanned.
	pub pages: u32,
}

/// Result of purging one named collection inside [`PurgeEngine::purge_account`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionPurge {
	/// Collection label supplied by the caller.
	pub name: String,
	/// Outcome, or the enumeration error that stopped this collection.
	pub result: Result<PurgeOutcome, StoreError>,
}

/// Result of purging every collection an account spans.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountPurgeReport {
	/// Per-collection results, in the order supplied.
	pub collections: Vec<CollectionPurge>,
	/// Records deleted across collections.
	pub deleted: u64,
	/// Records abandoned across collections.
	pub unprocessed: u64,
	/// Collections whose enumeration failed.
	pub failed: usize,
}
impl AccountPurgeReport {
	/// Returns `true` when every collection was enumerated and fully drained.
	pub fn is_complete(&self) -> bool {
		self.failed == 0 && self.unprocessed == 0
	}
}

/// Runs purges against [`RecordStore`]s.
#[derive(Clone)]
pub struct PurgeEngine {
	config: PurgeConfig,
	sleeper: Arc<dyn RetrySleep>,
	metrics: Arc<PurgeMetrics>,
}
impl PurgeEngine {
	/// Creates an engine that waits between retries on the tokio timer.
	#[cfg(feature = "tokio")]
	pub fn new(config: PurgeConfig) -> Self {
		Self::with_sleeper(config, Arc::new(TokioSleep))
	}

	/// Creates an engine with a caller-supplied retry sleeper.
	pub fn with_sleeper(config: PurgeConfig, sleeper: Arc<dyn RetrySleep>) -> Self {
		Self { config, sleeper, metrics: Default::default() }
	}

	/// Engine configuration.
	pub fn config(&self) -> &PurgeConfig {
		&self.config
	}

	/// Counters shared by every clone of this engine.
	pub fn metrics(&self) -> &Arc<PurgeMetrics> {
		&self.metrics
	}

	/// Deletes every record `owner` holds in `store`.
	///
	/// Fails only when enumeration fails; delete failures are retried and then reported through
	/// [`PurgeOutcome::unprocessed`].
	pub async fn purge_owner(
		&self,
		store: &dyn RecordStore,
		owner: &SubjectId,
	) -> Result<PurgeOutcome, StoreError> {
		obs::record_guard_outcome(GuardKind::Purge, GuardOutcome::Attempt);

		let span = GuardSpan::new(GuardKind::Purge, "purge_owner");
		let result = span.instrument(self.purge_owner_inner(store, owner)).await;

		match &result {
			Ok(outcome) if outcome.is_complete() => {
				obs::record_guard_outcome(GuardKind::Purge, GuardOutcome::Success);
			},
			Ok(outcome) => {
				obs::warn(
					GuardKind::Purge,
					"purge_owner",
					&format_args!(
						"owner {} left {} record(s) unprocessed",
						obs::fingerprint(owner),
						outcome.unprocessed
					),
				);
				obs::record_guard_outcome(GuardKind::Purge, GuardOutcome::Partial);
			},
			Err(err) => {
				obs::warn(
					GuardKind::Purge,
					"collect_keys",
					&format_args!("owner {}: {err}", obs::fingerprint(owner)),
				);
				obs::record_guard_outcome(GuardKind::Purge, GuardOutcome::Failure);
			},
		}

		result
	}

	async fn purge_owner_inner(
		&self,
		store: &dyn RecordStore,
		owner: &SubjectId,
	) -> Result<PurgeOutcome, StoreError> {
		let collected = self.collect_keys(store, owner).await?;
		let mut outcome = self.delete_keys(store, &collected.keys).await;

		outcome.pages = collected.pages;

		Ok(outcome)
	}

	/// Follows the continuation cursor until the store reports no further page.
	pub async fn collect_keys(
		&self,
		store: &dyn RecordStore,
		owner: &SubjectId,
	) -> Result<CollectedKeys, StoreError> {
		let mut collected = CollectedKeys::default();
		let mut cursor: Option<PageCursor> = None;

		loop {
			let page = store.query_keys(owner, cursor.as_ref()).await?;

			collected.pages += 1;
			collected.keys.extend(page.keys);

			match page.next_cursor {
				Some(next) => cursor = Some(next),
				None => return Ok(collected),
			}
		}
	}

	/// Deletes `keys` in batches of `min(engine cap, store cap)`, retrying each batch's remainder.
	pub async fn delete_keys(&self, store: &dyn RecordStore, keys: &[RecordKey]) -> PurgeOutcome {
		let batch_size = self.config.max_batch_size.min(store.max_batch_size()).max(1);
		let mut outcome = PurgeOutcome::default();

		for batch in keys.chunks(batch_size) {
			let report = self.settle_batch(store, batch).await;

			outcome.absorb(report);
		}

		outcome
	}

	async fn settle_batch(&self, store: &dyn RecordStore, batch: &[RecordKey]) -> BatchReport {
		let mut pending = batch.to_vec();
		let mut attempt = 0;

		loop {
			attempt += 1;

			self.metrics.record_submission(attempt);

			match store.delete_batch(&pending).await {
				Ok(output) => pending = output.unprocessed,
				// The whole pending set stays queued; the failed write still used an attempt.
				Err(err) => obs::warn(GuardKind::Purge, "delete_batch", &err),
			}

			if pending.is_empty() || attempt >= self.config.max_attempts {
				break;
			}

			self.sleeper.sleep(self.config.delay_after(attempt)).await;
		}

		let unprocessed = pending.len().min(batch.len());
		let deleted = batch.len() - unprocessed;

		self.metrics.record_settled(deleted as u64, unprocessed as u64);

		BatchReport { size: batch.len(), deleted, unprocessed, attempts: attempt }
	}

	/// Purges `owner` from each named collection in order, continuing past failures.
	pub async fn purge_account(
		&self,
		collections: &[(&str, &dyn RecordStore)],
		owner: &SubjectId,
	) -> AccountPurgeReport {
		let mut report = AccountPurgeReport::default();

		for (name, store) in collections {
			let result = self.purge_owner(*store, owner).await;

			match &result {
				Ok(outcome) => {
					report.deleted += outcome.deleted;
					report.unprocessed += outcome.unprocessed;
				},
				Err(_) => report.failed += 1,
			}

			report.collections.push(CollectionPurge { name: (*name).to_owned(), result });
		}

		report
	}
}
impl Debug for PurgeEngine {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PurgeEngine")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}
