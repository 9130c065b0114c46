//! Redacting wrapper for bearer credentials lifted from `Authorization` headers.

// self
use crate::_prelude::*;

const BEARER_SCHEME: &str = "bearer";

/// Raw bearer credential that keeps the token string out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Parses an `Authorization` header value of the form `Bearer <token>`.
	///
	/// The scheme is matched case-insensitively and must be followed by at least one whitespace
	/// character. Returns `None` for any other scheme or an empty credential.
	pub fn from_authorization(value: &str) -> Option<Self> {
		let (scheme, rest) = value.split_once(char::is_whitespace)?;

		if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
			return None;
		}

		let token = rest.trim();

		if token.is_empty() { None } else { Some(Self(token.to_owned())) }
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bearer_formatters_redact() {
		let token = BearerToken::new("eyJhbGciOi.secret.sig");

		assert_eq!(format!("{token:?}"), "BearerToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
	}

	#[test]
	fn scheme_matching_is_case_insensitive() {
		for header in ["Bearer abc.def.ghi", "bearer abc.def.ghi", "BEARER\tabc.def.ghi"] {
			let token = BearerToken::from_authorization(header)
				.unwrap_or_else(|| panic!("Header `{header}` should yield a token."));

			assert_eq!(token.expose(), "abc.def.ghi");
		}
	}

	#[test]
	fn other_schemes_and_empty_credentials_are_rejected() {
		assert!(BearerToken::from_authorization("Basic dXNlcjpwYXNz").is_none());
		assert!(BearerToken::from_authorization("Bearer").is_none());
		assert!(BearerToken::from_authorization("Bearer    ").is_none());
		assert!(BearerToken::from_authorization("Bearerabc.def.ghi").is_none());
		assert!(BearerToken::from_authorization("").is_none());
	}
}
