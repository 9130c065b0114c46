//! Identity-provider settings consumed by the token verifier and key ring.
//!
//! The surrounding application supplies these values at startup; this crate treats the
//! resulting [`IdentityProviderConfig`] as immutable and uses its fields literally.

/// Builder API for assembling provider configuration.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Token kind accepted by default (`token_use` claim of identity tokens).
pub const DEFAULT_TOKEN_USE: &str = "id";
/// Default lifetime of a fetched signing key set.
pub const DEFAULT_KEY_TTL: Duration = Duration::hours(6);

/// Immutable identity-provider settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
	/// Expected `iss` claim, compared verbatim.
	pub issuer: String,
	/// Expected `aud` claim (the application's client identifier).
	pub audience: String,
	/// Key-publication (JWKS) endpoint.
	pub jwks_endpoint: Url,
	/// Expected `token_use` claim.
	pub expected_token_use: String,
	/// How long a fetched key set is served before the next verification refetches it.
	pub key_ttl: Duration,
}
impl IdentityProviderConfig {
	/// Creates a new builder with default token use and key TTL.
	pub fn builder() -> IdentityProviderConfigBuilder {
		IdentityProviderConfigBuilder::default()
	}

	/// Derives the issuer and JWKS endpoint of an AWS Cognito user pool.
	pub fn cognito(
		region: &str,
		user_pool_id: &str,
		client_id: impl Into<String>,
	) -> Result<Self, ConfigError> {
		if region.trim().is_empty() {
			return Err(ConfigError::Empty { field: "region" });
		}
		if user_pool_id.trim().is_empty() {
			return Err(ConfigError::Empty { field: "user_pool_id" });
		}

		let issuer = format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}");
		let jwks_endpoint = Url::parse(&format!("{issuer}/.well-known/jwks.json"))
			.map_err(|source| ConfigError::InvalidUrl { field: "jwks_endpoint", source })?;

		Self::builder().issuer(issuer).audience(client_id).jwks_endpoint(jwks_endpoint).build()
	}
}
