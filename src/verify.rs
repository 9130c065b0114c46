//! Identity-token verification against the provider's published keys.
//!
//! [`TokenVerifier::verify`] splits the compact token, decodes header and payload, and runs the
//! claim checks (issuer, audience, token kind, expiry) before it touches the key ring. Garbage
//! and obviously wrong tokens therefore never trigger a key fetch or an RSA operation. Only then
//! is the signing key looked up by `kid`, the algorithm pinned to `RS256`, and the signature
//! checked over the raw `<header>.<payload>` bytes.

pub mod signature;

pub use signature::*;

// crates.io
use base64::{
	Engine, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{IdentityClaims, TokenHeader, TokenPayload},
	config::IdentityProviderConfig,
	error::KeyFetchError,
	jwks::KeyRing,
	obs::{self, GuardKind, GuardOutcome, GuardSpan},
};

/// The only signing algorithm accepted.
pub const SUPPORTED_ALGORITHM: &str = "RS256";
/// Tokens longer than this are rejected before decoding.
pub const MAX_TOKEN_LEN: usize = 16 * 1024;

pub(crate) const BASE64URL: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenErrorReason {
	/// Wrong shape, undecodable segment, missing mandatory claim, or unsupported algorithm.
	Malformed,
	/// No published key matches the header's `kid`.
	UnknownKey,
	/// `iss` differs from the configured issuer.
	BadIssuer,
	/// `aud` is present and does not name the configured client.
	BadAudience,
	/// `token_use` differs from the expected kind.
	WrongKind,
	/// The token's expiry instant has been reached.
	Expired,
	/// The signature does not verify with the matched key.
	BadSignature,
}
impl TokenErrorReason {
	/// Returns a stable label suitable for logs and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Malformed => "malformed",
			Self::UnknownKey => "unknown-key",
			Self::BadIssuer => "bad-issuer",
			Self::BadAudience => "bad-audience",
			Self::WrongKind => "wrong-kind",
			Self::Expired => "expired",
			Self::BadSignature => "bad-signature",
		}
	}
}
impl Display for TokenErrorReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Rejection of a token on its own merits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Identity token rejected: {reason}.")]
pub struct TokenError {
	/// Failed check.
	pub reason: TokenErrorReason,
}
impl From<TokenErrorReason> for TokenError {
	fn from(reason: TokenErrorReason) -> Self {
		Self { reason }
	}
}

/// Failure of [`TokenVerifier::verify`].
#[derive(Debug, ThisError)]
pub enum VerifyError {
	/// The token itself is invalid.
	#[error(transparent)]
	Token(#[from] TokenError),
	/// The key set could not be retrieved, so no trust decision was possible.
	#[error(transparent)]
	KeyFetch(#[from] KeyFetchError),
}
impl VerifyError {
	/// Returns the rejection reason when the token itself was at fault.
	pub fn reason(&self) -> Option<TokenErrorReason> {
		match self {
			Self::Token(err) => Some(err.reason),
			Self::KeyFetch(_) => None,
		}
	}
}
impl From<TokenErrorReason> for VerifyError {
	fn from(reason: TokenErrorReason) -> Self {
		Self::Token(reason.into())
	}
}

/// Verifies identity tokens issued by one provider.
pub struct TokenVerifier {
	config: IdentityProviderConfig,
	keys: Arc<KeyRing>,
	signature: Arc<dyn SignatureCheck>,
}
impl TokenVerifier {
	/// Creates a verifier backed by `keys`, checking signatures with [`Rs256SignatureCheck`].
	pub fn new(config: IdentityProviderConfig, keys: Arc<KeyRing>) -> Self {
		Self { config, keys, signature: Arc::new(Rs256SignatureCheck) }
	}

	/// Creates a verifier whose key ring reads the configured endpoint over HTTP.
	#[cfg(feature = "reqwest")]
	pub fn from_config(config: IdentityProviderConfig) -> Result<Self, crate::error::ConfigError> {
		let source = crate::jwks::HttpKeySource::from_config(&config)?;
		let keys = Arc::new(KeyRing::new(Arc::new(source), config.key_ttl));

		Ok(Self::new(config, keys))
	}

	/// Replaces the signature step.
	pub fn with_signature_check(mut self, check: Arc<dyn SignatureCheck>) -> Self {
		self.signature = check;

		self
	}

	/// Provider settings in use.
	pub fn config(&self) -> &IdentityProviderConfig {
		&self.config
	}

	/// Shared key ring.
	pub fn key_ring(&self) -> &Arc<KeyRing> {
		&self.keys
	}

	/// Verifies `token` at the current instant.
	pub async fn verify(&self, token: &str) -> Result<IdentityClaims, VerifyError> {
		self.verify_at(token, OffsetDateTime::now_utc()).await
	}

	/// Verifies `token`, evaluating expiry and key freshness at `now`.
	pub async fn verify_at(
		&self,
		token: &str,
		now: OffsetDateTime,
	) -> Result<IdentityClaims, VerifyError> {
		const KIND: GuardKind = GuardKind::Verify;

		let span = GuardSpan::new(KIND, "verify");

		obs::record_guard_outcome(KIND, GuardOutcome::Attempt);

		let result = span.instrument(self.verify_inner(token, now)).await;

		match &result {
			Ok(_) => obs::record_guard_outcome(KIND, GuardOutcome::Success),
			Err(_) => obs::record_guard_outcome(KIND, GuardOutcome::Failure),
		}

		result
	}

	async fn verify_inner(
		&self,
		token: &str,
		now: OffsetDateTime,
	) -> Result<IdentityClaims, VerifyError> {
		if token.len() > MAX_TOKEN_LEN {
			return Err(TokenErrorReason::Malformed.into());
		}

		let mut segments = token.split('.');
		let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(TokenErrorReason::Malformed.into());
		};
		let header: TokenHeader = decode_segment(header_b64)?;
		let payload: TokenPayload = decode_segment(payload_b64)?;
		let expires_at = self.check_claims(&payload, now)?;
		let keys = self.keys.signing_keys_at(now).await?;
		let record = header
			.kid
			.as_ref()
			.and_then(|kid| keys.find(kid))
			.ok_or(TokenErrorReason::UnknownKey)?;

		if header.alg.as_deref().is_some_and(|alg| alg != SUPPORTED_ALGORITHM) {
			return Err(TokenErrorReason::Malformed.into());
		}

		let signature =
			BASE64URL.decode(signature_b64).map_err(|_| TokenErrorReason::BadSignature)?;
		let signing_input = &token.as_bytes()[..header_b64.len() + 1 + payload_b64.len()];

		if !self.signature.verify(record, signing_input, &signature) {
			return Err(TokenErrorReason::BadSignature.into());
		}

		Ok(IdentityClaims::from_payload(payload, expires_at))
	}

	/// Runs the cheap claim checks in order and returns the expiry instant.
	fn check_claims(
		&self,
		payload: &TokenPayload,
		now: OffsetDateTime,
	) -> Result<OffsetDateTime, TokenError> {
		if payload.iss.as_deref() != Some(self.config.issuer.as_str()) {
			return Err(TokenErrorReason::BadIssuer.into());
		}
		if payload.aud.as_ref().is_some_and(|aud| !aud.accepts(&self.config.audience)) {
			return Err(TokenErrorReason::BadAudience.into());
		}
		if payload.token_use.as_deref() != Some(self.config.expected_token_use.as_str()) {
			return Err(TokenErrorReason::WrongKind.into());
		}

		let expires_at = OffsetDateTime::from_unix_timestamp(payload.exp)
			.map_err(|_| TokenErrorReason::Malformed)?;

		if now >= expires_at {
			return Err(TokenErrorReason::Expired.into());
		}

		Ok(expires_at)
	}
}
impl Debug for TokenVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenVerifier")
			.field("issuer", &self.config.issuer)
			.field("audience", &self.config.audience)
			.field("keys", &self.keys)
			.finish()
	}
}

fn decode_segment<T>(segment: &str) -> Result<T, TokenError>
where
	T: DeserializeOwned,
{
	let bytes = BASE64URL.decode(segment).map_err(|_| TokenErrorReason::Malformed)?;

	serde_json::from_slice(&bytes).map_err(|_| TokenErrorReason::Malformed.into())
}
