//! Demand-driven, TTL-bounded cache over a [`KeySource`].

// self
use crate::{
	_prelude::*,
	error::KeyFetchError,
	jwks::{KeySet, KeySource},
	obs::{self, GuardKind, GuardOutcome, GuardSpan},
};

#[derive(Clone, Debug)]
struct CachedKeySet {
	keys: Arc<KeySet>,
	fetched_at: OffsetDateTime,
}
impl CachedKeySet {
	fn is_fresh(&self, now: OffsetDateTime, ttl: Duration) -> bool {
		now - self.fetched_at < ttl
	}
}

/// Process-wide key ring shared by every verification.
///
/// The first verification fetches the key set; later ones reuse it until it is older than the
/// configured TTL, at which point the next caller refetches synchronously. There is no
/// background refresh. Readers hold an `Arc` snapshot, so a refresh never disturbs in-flight
/// verifications. Callers that observe an expired entry at the same time queue behind a
/// single-flight guard and reuse the first caller's result.
pub struct KeyRing {
	source: Arc<dyn KeySource>,
	ttl: Duration,
	state: RwLock<Option<CachedKeySet>>,
	refresh_guard: AsyncMutex<()>,
}
impl KeyRing {
	/// Creates an empty key ring over `source`.
	pub fn new(source: Arc<dyn KeySource>, ttl: Duration) -> Self {
		Self { source, ttl, state: RwLock::new(None), refresh_guard: AsyncMutex::new(()) }
	}

	/// Configured key set lifetime.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the current key set, fetching it when absent or expired.
	pub async fn signing_keys(&self) -> Result<Arc<KeySet>, KeyFetchError> {
		self.signing_keys_at(OffsetDateTime::now_utc()).await
	}

	/// Same as [`KeyRing::signing_keys`], evaluating freshness at `now`.
	pub async fn signing_keys_at(&self, now: OffsetDateTime) -> Result<Arc<KeySet>, KeyFetchError> {
		if let Some(keys) = self.fresh_keys(now) {
			return Ok(keys);
		}

		let _singleflight = self.refresh_guard.lock().await;

		if let Some(keys) = self.fresh_keys(now) {
			return Ok(keys);
		}

		const KIND: GuardKind = GuardKind::KeyFetch;

		let span = GuardSpan::new(KIND, "signing_keys");

		obs::record_guard_outcome(KIND, GuardOutcome::Attempt);

		match span.instrument(self.source.fetch_keys()).await {
			Ok(set) => {
				let keys = Arc::new(set);

				*self.state.write() = Some(CachedKeySet { keys: keys.clone(), fetched_at: now });
				obs::record_guard_outcome(KIND, GuardOutcome::Success);

				Ok(keys)
			},
			Err(err) => {
				obs::record_guard_outcome(KIND, GuardOutcome::Failure);
				obs::warn(KIND, "signing_keys", &err);

				Err(err)
			},
		}
	}

	/// Returns the cached key set without fetching, regardless of age.
	pub fn cached(&self) -> Option<Arc<KeySet>> {
		self.state.read().as_ref().map(|cached| cached.keys.clone())
	}

	fn fresh_keys(&self, now: OffsetDateTime) -> Option<Arc<KeySet>> {
		self.state
			.read()
			.as_ref()
			.filter(|cached| cached.is_fresh(now, self.ttl))
			.map(|cached| cached.keys.clone())
	}
}
impl Debug for KeyRing {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeyRing")
			.field("ttl", &self.ttl)
			.field("cached", &self.state.read().is_some())
			.finish()
	}
}
