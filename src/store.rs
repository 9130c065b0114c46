//! Record-store contract used by the purge engine, plus an in-memory implementation.

pub mod memory;

pub use memory::MemoryRecordStore;

// self
use crate::{_prelude::*, auth::SubjectId};

/// Largest batch accepted by typical document stores for one batched write.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

/// Boxed future returned by [`RecordStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Paginated, batch-limited store holding per-user records.
pub trait RecordStore
where
	Self: Send + Sync,
{
	/// Largest number of keys accepted by one [`RecordStore::delete_batch`] call.
	fn max_batch_size(&self) -> usize {
		DEFAULT_MAX_BATCH_SIZE
	}

	/// Returns one page of keys owned by `owner`, resuming after `cursor`.
	///
	/// Implementations return only the key pair, never record bodies, and set
	/// [`KeyPage::next_cursor`] while further pages may exist.
	fn query_keys<'a>(
		&'a self,
		owner: &'a SubjectId,
		cursor: Option<&'a PageCursor>,
	) -> StoreFuture<'a, KeyPage>;

	/// Deletes `keys` in one batched write, reporting the subset the store did not process.
	fn delete_batch<'a>(&'a self, keys: &'a [RecordKey]) -> StoreFuture<'a, BatchDeleteOutput>;
}

/// Minimal identity of one persisted record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
	/// Partition key: the owning user.
	pub owner: SubjectId,
	/// Sort key distinguishing the owner's records (e.g. date plus save timestamp).
	pub discriminator: String,
}
impl RecordKey {
	/// Builds a key for `owner`'s record `discriminator`.
	pub fn new(owner: SubjectId, discriminator: impl Into<String>) -> Self {
		Self { owner, discriminator: discriminator.into() }
	}
}

/// Opaque continuation cursor returned by paginated queries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(pub String);
impl AsRef<str> for PageCursor {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// One page of a key query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPage {
	/// Keys on this page.
	pub keys: Vec<RecordKey>,
	/// Cursor for the next page; `None` once the query is exhausted.
	pub next_cursor: Option<PageCursor>,
}

/// Result of one batched delete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchDeleteOutput {
	/// Keys the store did not process; the caller may resubmit them.
	pub unprocessed: Vec<RecordKey>,
}

/// Error type produced by [`RecordStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure (unreachable, throttled, rejected).
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A batch exceeded the store's limit.
	#[error("Batch of {size} keys exceeds the store limit of {max}.")]
	BatchTooLarge {
		/// Submitted batch size.
		size: usize,
		/// Store limit.
		max: usize,
	},
}
