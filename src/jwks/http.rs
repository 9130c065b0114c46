//! reqwest-backed [`KeySource`] that reads the provider's key-publication endpoint.

// self
use crate::{
	_prelude::*,
	config::IdentityProviderConfig,
	error::{ConfigError, KeyFetchError},
	jwks::{KeySet, KeySource, KeySourceFuture},
};

const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Fetches the key set with one HTTP GET per call.
///
/// Key-publication endpoints answer directly, so the default client does not follow redirects;
/// supply a custom [`ReqwestClient`] through [`HttpKeySource::with_client`] to change that or to
/// install custom roots.
#[derive(Clone, Debug)]
pub struct HttpKeySource {
	client: ReqwestClient,
	endpoint: Url,
}
impl HttpKeySource {
	/// Builds a source with the crate's default client settings.
	pub fn new(endpoint: Url) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.timeout(DEFAULT_TIMEOUT)
			.build()?;

		Ok(Self { client, endpoint })
	}

	/// Builds a source for the endpoint named by `config`.
	pub fn from_config(config: &IdentityProviderConfig) -> Result<Self, ConfigError> {
		Self::new(config.jwks_endpoint.clone())
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, endpoint: Url) -> Self {
		Self { client, endpoint }
	}

	/// Endpoint this source reads.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
impl KeySource for HttpKeySource {
	fn fetch_keys(&self) -> KeySourceFuture<'_> {
		Box::pin(async move {
			let response = self.client.get(self.endpoint.clone()).send().await?;
			let status = response.status();

			if !status.is_success() {
				return Err(KeyFetchError::Status { status: status.as_u16() });
			}

			let body = response.bytes().await?;
			let mut de = serde_json::Deserializer::from_slice(&body);

			serde_path_to_error::deserialize::<_, KeySet>(&mut de)
				.map_err(|source| KeyFetchError::Parse { source })
		})
	}
}
