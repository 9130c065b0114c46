//! Crate-level error types shared across the key ring, verifier, and purge engine.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs that can fail for reasons other than bad input.
///
/// Token rejections never appear here; they collapse into an unauthenticated outcome at the
/// request boundary. What remains are the failures that prevent a trust decision altogether.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The signing key set could not be retrieved.
	#[error(transparent)]
	KeyFetch(#[from] KeyFetchError),
}

/// Configuration and validation failures raised while assembling the trust boundary.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL could not be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which configuration field failed to parse.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The key-publication endpoint must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A required setting was not supplied.
	#[error("Missing required setting `{field}`.")]
	Missing {
		/// Name of the missing setting.
		field: &'static str,
	},
	/// A string setting was supplied but empty.
	#[error("Setting `{field}` cannot be empty.")]
	Empty {
		/// Name of the empty setting.
		field: &'static str,
	},
	/// Key cache lifetime must be strictly positive.
	#[error("The key cache TTL must be positive.")]
	NonPositiveKeyTtl,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while retrieving the provider's published signing keys.
#[derive(Debug, ThisError)]
pub enum KeyFetchError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while fetching the signing key set.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The key-publication endpoint answered with a non-success status.
	#[error("Signing key endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// The response body is not a well-formed key set.
	#[error("Signing key endpoint returned a malformed key set.")]
	Parse {
		/// Structured parsing failure, including the JSON path of the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl KeyFetchError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for KeyFetchError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
