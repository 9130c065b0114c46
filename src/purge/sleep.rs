// self
use crate::_prelude::*;

/// Boxed future returned by [`RetrySleep::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Waits between delete retries.
pub trait RetrySleep
where
	Self: Send + Sync,
{
	/// Suspends for `delay`.
	fn sleep(&self, delay: Duration) -> SleepFuture<'_>;
}

/// [`RetrySleep`] backed by the tokio timer.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleep;
#[cfg(feature = "tokio")]
impl RetrySleep for TokioSleep {
	fn sleep(&self, delay: Duration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(delay.unsigned_abs()))
	}
}
