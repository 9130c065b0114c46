//! Published signing keys: wire model, fetch contract, and the TTL-bounded key ring.
//!
//! [`KeySource`] is the only dependency the key ring has on a transport. The crate ships
//! [`HttpKeySource`] (behind the `reqwest` feature) which performs a single HTTP GET against the
//! provider's key-publication endpoint; tests and alternative deployments plug in their own
//! implementation. [`KeyRing`] layers the demand-driven cache on top.

pub mod cache;
#[cfg(feature = "reqwest")] pub mod http;

pub use cache::*;
#[cfg(feature = "reqwest")] pub use http::*;

// self
use crate::{_prelude::*, auth::KeyId, error::KeyFetchError};

/// Boxed future returned by [`KeySource::fetch_keys`].
pub type KeySourceFuture<'a> =
	Pin<Box<dyn Future<Output = Result<KeySet, KeyFetchError>> + 'a + Send>>;

/// Retrieves the provider's current key set. Implementations perform exactly one fetch per call
/// and never retry.
pub trait KeySource
where
	Self: Send + Sync,
{
	/// Fetches the full key set.
	fn fetch_keys(&self) -> KeySourceFuture<'_>;
}

/// Key set document published by the identity provider (`{"keys": [...]}`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
	/// Published keys.
	pub keys: Vec<KeyRecord>,
}
impl KeySet {
	/// Returns the record published under `kid`, if any.
	pub fn find(&self, kid: &str) -> Option<&KeyRecord> {
		self.keys.iter().find(|record| record.kid.as_ref() == kid)
	}

	/// Number of published keys.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Returns `true` when the provider published no keys.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}
}

/// One published public key.
///
/// RSA parameters are base64url-encoded big-endian integers. Records of other key types keep
/// their parameters absent and are never usable for verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
	/// Key identifier referenced by token headers.
	pub kid: KeyId,
	/// Key type (`RSA` for usable keys).
	pub kty: String,
	/// Algorithm the key is meant for, when declared.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alg: Option<String>,
	/// Intended key use (`sig`), when declared.
	#[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
	pub key_use: Option<String>,
	/// RSA modulus.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub n: Option<String>,
	/// RSA public exponent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub e: Option<String>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn key_set_parses_provider_document() {
		let set: KeySet = serde_json::from_str(
			r#"{"keys":[
				{"kid":"a","kty":"RSA","alg":"RS256","use":"sig","n":"AQAB","e":"AQAB"},
				{"kid":"b","kty":"EC","crv":"P-256","x":"AA","y":"AA"}
			]}"#,
		)
		.expect("Key set fixture should parse.");

		assert_eq!(set.len(), 2);
		assert_eq!(set.find("a").and_then(|record| record.key_use.as_deref()), Some("sig"));
		assert!(set.find("b").is_some_and(|record| record.n.is_none()));
		assert!(set.find("c").is_none());
	}

	#[test]
	fn key_set_requires_keys_array() {
		assert!(serde_json::from_str::<KeySet>("{}").is_err());
		assert!(serde_json::from_str::<KeySet>(r#"{"keys":{}}"#).is_err());
		assert!(serde_json::from_str::<KeySet>(r#"{"keys":[]}"#).is_ok_and(|set| set.is_empty()));
	}
}
