//! Thread-safe in-memory [`RecordStore`] for local development and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::SubjectId,
	store::{
		BatchDeleteOutput, DEFAULT_MAX_BATCH_SIZE, KeyPage, PageCursor, RecordKey, RecordStore,
		StoreError, StoreFuture,
	},
};

type RecordMap = Arc<RwLock<BTreeMap<RecordKey, serde_json::Value>>>;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Storage backend that keeps records in-process, ordered by owner then discriminator.
///
/// Queries return a cursor only while more of the owner's records remain, so `n` records are
/// enumerated in `ceil(n / page_size)` queries (one query when the owner has none).
#[derive(Clone, Debug)]
pub struct MemoryRecordStore {
	records: RecordMap,
	page_size: usize,
	max_batch_size: usize,
	queries: Arc<AtomicU64>,
	delete_calls: Arc<AtomicU64>,
}
impl Default for MemoryRecordStore {
	fn default() -> Self {
		Self {
			records: Default::default(),
			page_size: DEFAULT_PAGE_SIZE,
			max_batch_size: DEFAULT_MAX_BATCH_SIZE,
			queries: Default::default(),
			delete_calls: Default::default(),
		}
	}
}
impl MemoryRecordStore {
	/// Overrides the page size (at least one).
	pub fn with_page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size.max(1);

		self
	}

	/// Overrides the batch limit (at least one).
	pub fn with_max_batch_size(mut self, max: usize) -> Self {
		self.max_batch_size = max.max(1);

		self
	}

	/// Inserts or replaces a record.
	pub fn insert(&self, key: RecordKey, body: serde_json::Value) {
		self.records.write().insert(key, body);
	}

	/// Returns a record body.
	pub fn get(&self, key: &RecordKey) -> Option<serde_json::Value> {
		self.records.read().get(key).cloned()
	}

	/// Number of records owned by `owner`.
	pub fn count_for(&self, owner: &SubjectId) -> usize {
		self.records.read().keys().filter(|key| &key.owner == owner).count()
	}

	/// Total number of records.
	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	/// Returns `true` when the store holds no records.
	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}

	/// Number of [`RecordStore::query_keys`] calls served.
	pub fn queries(&self) -> u64 {
		self.queries.load(Ordering::Relaxed)
	}

	/// Number of [`RecordStore::delete_batch`] calls served.
	pub fn delete_calls(&self) -> u64 {
		self.delete_calls.load(Ordering::Relaxed)
	}

	fn page_now(
		records: &BTreeMap<RecordKey, serde_json::Value>,
		owner: &SubjectId,
		after: Option<&str>,
		page_size: usize,
	) -> KeyPage {
		let mut remaining = records
			.keys()
			.filter(|key| &key.owner == owner)
			.filter(|key| after.is_none_or(|after| key.discriminator.as_str() > after));
		let keys: Vec<RecordKey> = remaining.by_ref().take(page_size).cloned().collect();
		let next_cursor = match (remaining.next(), keys.last()) {
			(Some(_), Some(last)) => Some(PageCursor(last.discriminator.clone())),
			_ => None,
		};

		KeyPage { keys, next_cursor }
	}

	fn delete_now(&self, keys: &[RecordKey]) -> Result<BatchDeleteOutput, StoreError> {
		if keys.len() > self.max_batch_size {
			return Err(StoreError::BatchTooLarge { size: keys.len(), max: self.max_batch_size });
		}

		let mut records = self.records.write();

		for key in keys {
			records.remove(key);
		}

		Ok(BatchDeleteOutput::default())
	}
}
impl RecordStore for MemoryRecordStore {
	fn max_batch_size(&self) -> usize {
		self.max_batch_size
	}

	fn query_keys<'a>(
		&'a self,
		owner: &'a SubjectId,
		cursor: Option<&'a PageCursor>,
	) -> StoreFuture<'a, KeyPage> {
		Box::pin(async move {
			self.queries.fetch_add(1, Ordering::Relaxed);

			let records = self.records.read();

			Ok(Self::page_now(&records, owner, cursor.map(AsRef::as_ref), self.page_size))
		})
	}

	fn delete_batch<'a>(&'a self, keys: &'a [RecordKey]) -> StoreFuture<'a, BatchDeleteOutput> {
		Box::pin(async move {
			self.delete_calls.fetch_add(1, Ordering::Relaxed);

			self.delete_now(keys)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn owner(value: &str) -> SubjectId {
		SubjectId::new(value).expect("Owner fixture should be valid.")
	}

	#[tokio::test]
	async fn pages_follow_the_cursor_and_stop_exactly() {
		let store = MemoryRecordStore::default().with_page_size(2);
		let alice = owner("alice");

		for day in 1..=4 {
			store.insert(RecordKey::new(alice.clone(), format!("2025-01-0{day}")), serde_json::json!({}));
		}

		store.insert(RecordKey::new(owner("bob"), "2025-01-01"), serde_json::json!({}));

		let first = store.query_keys(&alice, None).await.expect("First page should load.");

		assert_eq!(first.keys.len(), 2);

		let cursor = first.next_cursor.expect("A second page should be announced.");
		let second = store.query_keys(&alice, Some(&cursor)).await.expect("Second page should load.");

		assert_eq!(second.keys.len(), 2);
		assert_eq!(second.keys[1].discriminator, "2025-01-04");
		assert!(second.next_cursor.is_none(), "Exhausted queries must not return a cursor.");
		assert_eq!(store.queries(), 2);
	}

	#[tokio::test]
	async fn oversized_batches_are_rejected() {
		let store = MemoryRecordStore::default().with_max_batch_size(1);
		let alice = owner("alice");
		let keys = [RecordKey::new(alice.clone(), "a"), RecordKey::new(alice, "b")];
		let err = store.delete_batch(&keys).await.expect_err("Batch above the limit should fail.");

		assert_eq!(err, StoreError::BatchTooLarge { size: 2, max: 1 });
	}
}
