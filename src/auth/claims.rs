//! Wire shapes of identity-token segments and the normalized identity handed to callers.

// self
use crate::{
	_prelude::*,
	auth::{KeyId, SubjectId},
};

/// Decoded JOSE header of an identity token.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
	/// Identifier of the key that signed the token.
	#[serde(default)]
	pub kid: Option<KeyId>,
	/// Declared signing algorithm.
	#[serde(default)]
	pub alg: Option<String>,
}

/// `aud` claim, which may be a single value or a list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
	/// Single audience string.
	One(String),
	/// Audience list.
	Many(Vec<String>),
}
impl Audience {
	/// Returns `true` when the expected client identifier is named by this claim.
	pub fn accepts(&self, expected: &str) -> bool {
		match self {
			Self::One(value) => value == expected,
			Self::Many(values) => values.iter().any(|value| value == expected),
		}
	}
}

/// Decoded payload of an identity token.
///
/// `sub` and `exp` are mandatory; a payload missing either fails to decode.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenPayload {
	/// Subject identifier.
	pub sub: SubjectId,
	/// Issuer.
	#[serde(default)]
	pub iss: Option<String>,
	/// Audience.
	#[serde(default)]
	pub aud: Option<Audience>,
	/// Expiry as unix seconds.
	pub exp: i64,
	/// Token kind marker (`id`, `access`, ...).
	#[serde(default)]
	pub token_use: Option<String>,
	/// Display-only username.
	#[serde(default, rename = "cognito:username", alias = "username")]
	pub username: Option<String>,
	/// Display-only email.
	#[serde(default)]
	pub email: Option<String>,
}

/// Identity extracted from a fully verified token.
///
/// Only [`IdentityClaims::subject`] is suitable for authorization decisions; the display
/// attributes are passed through as the provider stated them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
	/// Canonical user identity.
	pub subject: SubjectId,
	/// Display-only username.
	pub username: Option<String>,
	/// Display-only email.
	pub email: Option<String>,
	/// Instant after which the token stops being accepted.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl IdentityClaims {
	pub(crate) fn from_payload(payload: TokenPayload, expires_at: OffsetDateTime) -> Self {
		Self { subject: payload.sub, username: payload.username, email: payload.email, expires_at }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn payload_reads_provider_username_claim() {
		let payload: TokenPayload = serde_json::from_str(
			r#"{"sub":"u-1","exp":1700000000,"token_use":"id","cognito:username":"alice","email":"a@example.com"}"#,
		)
		.expect("Payload fixture should decode.");

		assert_eq!(payload.sub.as_ref(), "u-1");
		assert_eq!(payload.username.as_deref(), Some("alice"));
		assert_eq!(payload.email.as_deref(), Some("a@example.com"));
		assert!(payload.aud.is_none());
	}

	#[test]
	fn payload_requires_subject_and_expiry() {
		assert!(serde_json::from_str::<TokenPayload>(r#"{"exp":1700000000}"#).is_err());
		assert!(serde_json::from_str::<TokenPayload>(r#"{"sub":"u-1"}"#).is_err());
		assert!(serde_json::from_str::<TokenPayload>(r#"{"sub":"","exp":1700000000}"#).is_err());
	}

	#[test]
	fn audience_accepts_single_or_listed_client() {
		let one: Audience = serde_json::from_str("\"client-a\"").expect("String audience.");
		let many: Audience =
			serde_json::from_str("[\"client-b\",\"client-a\"]").expect("List audience.");

		assert!(one.accepts("client-a"));
		assert!(!one.accepts("client-b"));
		assert!(many.accepts("client-a"));
		assert!(!many.accepts("client-c"));
	}
}
