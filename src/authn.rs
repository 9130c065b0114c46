//! Request-level authentication: the single entry point protected handlers call.
//!
//! [`RequestAuthenticator::authenticate`] turns request headers into an identity or `None`. Every
//! rejection looks the same from the outside, whatever check failed, so callers answer with one
//! generic "unauthorized" response and never hand an attacker a verification oracle.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, IdentityClaims},
	verify::{TokenVerifier, VerifyError},
};

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "authorization";
/// Proxy header listing the client address first.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
/// Proxy header carrying the client address.
pub const X_REAL_IP: &str = "x-real-ip";
/// Origin reported when no proxy header names the client.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Read access to request headers with case-insensitive names.
pub trait HeaderLookup {
	/// Returns the first value of `name`, if present and valid UTF-8.
	fn header(&self, name: &str) -> Option<&str>;
}
impl HeaderLookup for HashMap<String, String> {
	fn header(&self, name: &str) -> Option<&str> {
		self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
	}
}
impl HeaderLookup for BTreeMap<String, String> {
	fn header(&self, name: &str) -> Option<&str> {
		self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
	}
}
impl HeaderLookup for [(&str, &str)] {
	fn header(&self, name: &str) -> Option<&str> {
		self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| *value)
	}
}
impl<const N: usize> HeaderLookup for [(&str, &str); N] {
	fn header(&self, name: &str) -> Option<&str> {
		self.as_slice().header(name)
	}
}
#[cfg(feature = "reqwest")]
impl HeaderLookup for reqwest::header::HeaderMap {
	fn header(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(|value| value.to_str().ok())
	}
}

/// Extracts the bearer credential from the `Authorization` header.
pub fn bearer_token<H>(headers: &H) -> Option<BearerToken>
where
	H: ?Sized + HeaderLookup,
{
	headers.header(AUTHORIZATION).and_then(BearerToken::from_authorization)
}

/// Best-effort client origin: first `x-forwarded-for` entry, then `x-real-ip`, else `unknown`.
///
/// These headers are client-controlled unless a trusted proxy overwrites them; use the result
/// for rate-limit bucketing only, never for authorization.
pub fn client_origin<H>(headers: &H) -> String
where
	H: ?Sized + HeaderLookup,
{
	if let Some(forwarded) = headers.header(X_FORWARDED_FOR) {
		let first = forwarded.split(',').next().map(str::trim).unwrap_or_default();

		return if first.is_empty() { UNKNOWN_ORIGIN.into() } else { first.into() };
	}

	headers.header(X_REAL_IP).unwrap_or(UNKNOWN_ORIGIN).into()
}

/// Wraps a [`TokenVerifier`] with header extraction.
#[derive(Clone, Debug)]
pub struct RequestAuthenticator {
	verifier: Arc<TokenVerifier>,
}
impl RequestAuthenticator {
	/// Creates an authenticator over a shared verifier.
	pub fn new(verifier: Arc<TokenVerifier>) -> Self {
		Self { verifier }
	}

	/// Underlying verifier.
	pub fn verifier(&self) -> &Arc<TokenVerifier> {
		&self.verifier
	}

	/// Returns the caller's identity, or `None` for any missing, malformed, or rejected
	/// credential. Never fails.
	pub async fn authenticate<H>(&self, headers: &H) -> Option<IdentityClaims>
	where
		H: ?Sized + HeaderLookup,
	{
		self.authenticate_at(headers, OffsetDateTime::now_utc()).await
	}

	/// Same as [`RequestAuthenticator::authenticate`], evaluated at `now`.
	pub async fn authenticate_at<H>(&self, headers: &H, now: OffsetDateTime) -> Option<IdentityClaims>
	where
		H: ?Sized + HeaderLookup,
	{
		let token = bearer_token(headers)?;

		self.verifier.verify_at(token.expose(), now).await.ok()
	}

	/// Like [`RequestAuthenticator::authenticate`], but surfaces key-fetch failures so callers
	/// can tell "cannot decide right now" apart from "not authenticated".
	pub async fn authenticate_strict<H>(&self, headers: &H) -> Result<Option<IdentityClaims>>
	where
		H: ?Sized + HeaderLookup,
	{
		self.authenticate_strict_at(headers, OffsetDateTime::now_utc()).await
	}

	/// Same as [`RequestAuthenticator::authenticate_strict`], evaluated at `now`.
	pub async fn authenticate_strict_at<H>(
		&self,
		headers: &H,
		now: OffsetDateTime,
	) -> Result<Option<IdentityClaims>>
	where
		H: ?Sized + HeaderLookup,
	{
		let Some(token) = bearer_token(headers) else {
			return Ok(None);
		};

		match self.verifier.verify_at(token.expose(), now).await {
			Ok(identity) => Ok(Some(identity)),
			Err(VerifyError::Token(_)) => Ok(None),
			Err(VerifyError::KeyFetch(err)) => Err(err.into()),
		}
	}
}
