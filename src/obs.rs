//! Optional observability helpers for the trust boundary.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `study_gate.guard` with the `guard` and
//!   `stage` fields, plus `warn` events for key-fetch failures and partial purges.
//! - Enable `metrics` to increment the `study_gate_guard_total` counter for every
//!   attempt/success/failure, labeled by `guard` + `outcome`.
//!
//! Subjects only ever reach logs through [`fingerprint`].

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Guarded operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardKind {
	/// Token verification.
	Verify,
	/// Signing key set retrieval.
	KeyFetch,
	/// Rate-limit admission.
	RateLimit,
	/// Bulk record deletion.
	Purge,
}
impl GuardKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GuardKind::Verify => "verify",
			GuardKind::KeyFetch => "key_fetch",
			GuardKind::RateLimit => "rate_limit",
			GuardKind::Purge => "purge",
		}
	}
}
impl Display for GuardKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardOutcome {
	/// Entry to a guarded operation.
	Attempt,
	/// Successful completion (token accepted, call admitted, purge fully drained).
	Success,
	/// Completion with some work abandoned.
	Partial,
	/// Rejection or failure propagated back to the caller.
	Failure,
}
impl GuardOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GuardOutcome::Attempt => "attempt",
			GuardOutcome::Success => "success",
			GuardOutcome::Partial => "partial",
			GuardOutcome::Failure => "failure",
		}
	}
}
impl Display for GuardOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Short, stable, non-reversible label for a user identity (first 8 hex digits of SHA-256).
pub fn fingerprint(value: &str) -> String {
	let digest = Sha256::digest(value.as_bytes());

	digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fingerprint_is_short_and_stable() {
		// sha256("abc") = ba7816bf...
		assert_eq!(fingerprint("abc"), "ba7816bf");
		assert_eq!(fingerprint("abc"), fingerprint("abc"));
		assert_ne!(fingerprint("abc"), fingerprint("abd"));
	}
}
