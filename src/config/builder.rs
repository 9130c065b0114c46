// self
use crate::{
	_prelude::*,
	config::{DEFAULT_KEY_TTL, DEFAULT_TOKEN_USE, IdentityProviderConfig},
};

pub use crate::error::ConfigError;

/// Builder for [`IdentityProviderConfig`] values.
#[derive(Debug)]
pub struct IdentityProviderConfigBuilder {
	/// Expected issuer.
	pub issuer: Option<String>,
	/// Expected audience.
	pub audience: Option<String>,
	/// Key-publication endpoint.
	pub jwks_endpoint: Option<Url>,
	/// Expected token kind.
	pub expected_token_use: String,
	/// Key set lifetime.
	pub key_ttl: Duration,
}
impl Default for IdentityProviderConfigBuilder {
	fn default() -> Self {
		Self {
			issuer: None,
			audience: None,
			jwks_endpoint: None,
			expected_token_use: DEFAULT_TOKEN_USE.into(),
			key_ttl: DEFAULT_KEY_TTL,
		}
	}
}
impl IdentityProviderConfigBuilder {
	/// Sets the expected issuer.
	pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer = Some(issuer.into());

		self
	}

	/// Sets the expected audience (client identifier).
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = Some(audience.into());

		self
	}

	/// Sets the key-publication endpoint.
	pub fn jwks_endpoint(mut self, url: Url) -> Self {
		self.jwks_endpoint = Some(url);

		self
	}

	/// Parses and sets the key-publication endpoint.
	pub fn jwks_endpoint_str(self, url: &str) -> Result<Self, ConfigError> {
		let url =
			Url::parse(url).map_err(|source| ConfigError::InvalidUrl { field: "jwks_endpoint", source })?;

		Ok(self.jwks_endpoint(url))
	}

	/// Overrides the accepted token kind.
	pub fn expected_token_use(mut self, token_use: impl Into<String>) -> Self {
		self.expected_token_use = token_use.into();

		self
	}

	/// Overrides the key set lifetime.
	pub fn key_ttl(mut self, ttl: Duration) -> Self {
		self.key_ttl = ttl;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<IdentityProviderConfig, ConfigError> {
		let issuer = self.issuer.ok_or(ConfigError::Missing { field: "issuer" })?;
		let audience = self.audience.ok_or(ConfigError::Missing { field: "audience" })?;
		let jwks_endpoint =
			self.jwks_endpoint.ok_or(ConfigError::Missing { field: "jwks_endpoint" })?;
		let config = IdentityProviderConfig {
			issuer,
			audience,
			jwks_endpoint,
			expected_token_use: self.expected_token_use,
			key_ttl: self.key_ttl,
		};

		config.validate()?;

		Ok(config)
	}
}

impl IdentityProviderConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ConfigError> {
		validate_non_empty("issuer", &self.issuer)?;
		validate_non_empty("audience", &self.audience)?;
		validate_non_empty("expected_token_use", &self.expected_token_use)?;

		if self.jwks_endpoint.scheme() != "https" {
			return Err(ConfigError::InsecureEndpoint {
				endpoint: "jwks",
				url: self.jwks_endpoint.to_string(),
			});
		}
		if !self.key_ttl.is_positive() {
			return Err(ConfigError::NonPositiveKeyTtl);
		}

		Ok(())
	}
}

fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
	if value.trim().is_empty() { Err(ConfigError::Empty { field }) } else { Ok(()) }
}
