//! Shared fixtures for integration tests: RSA keys, token minting, and observable collaborators.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::{
	RsaPrivateKey,
	pkcs1v15::SigningKey,
	pkcs8::DecodePrivateKey,
	signature::{SignatureEncoding, Signer},
	traits::PublicKeyParts,
};
use serde_json::{Value, json};
use sha2::Sha256;
use time::{Duration, OffsetDateTime, macros};
// self
use study_gate::{
	auth::KeyId,
	config::IdentityProviderConfig,
	error::KeyFetchError,
	jwks::{KeyRecord, KeyRing, KeySet, KeySource, KeySourceFuture},
	verify::{Rs256SignatureCheck, SignatureCheck, TokenVerifier},
};

pub const ISSUER: &str = "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_StudyPool";
pub const AUDIENCE: &str = "study-dashboard";
pub const KID: &str = "primary-2025";
pub const SUBJECT: &str = "5f0c7b2e-1111-4c4c-9a9a-0123456789ab";
pub const NOW: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing_key.pem");
const ROGUE_KEY_PEM: &str = include_str!("../fixtures/rogue_key.pem");

pub fn signing_key() -> RsaPrivateKey {
	RsaPrivateKey::from_pkcs8_pem(SIGNING_KEY_PEM).expect("Signing key fixture should parse.")
}

pub fn rogue_key() -> RsaPrivateKey {
	RsaPrivateKey::from_pkcs8_pem(ROGUE_KEY_PEM).expect("Rogue key fixture should parse.")
}

/// Publishes the public half of `key` under `kid`.
pub fn key_record(kid: &str, key: &RsaPrivateKey) -> KeyRecord {
	KeyRecord {
		kid: KeyId::new(kid).expect("Key identifier fixture should be valid."),
		kty: "RSA".into(),
		alg: Some("RS256".into()),
		key_use: Some("sig".into()),
		n: Some(URL_SAFE_NO_PAD.encode(key.n().to_bytes_be())),
		e: Some(URL_SAFE_NO_PAD.encode(key.e().to_bytes_be())),
	}
}

pub fn key_set() -> KeySet {
	KeySet { keys: vec![key_record(KID, &signing_key())] }
}

pub fn jwks_body() -> String {
	serde_json::to_string(&key_set()).expect("Key set fixture should serialize.")
}

pub fn config() -> IdentityProviderConfig {
	IdentityProviderConfig::builder()
		.issuer(ISSUER)
		.audience(AUDIENCE)
		.jwks_endpoint_str(&format!("{ISSUER}/.well-known/jwks.json"))
		.expect("JWKS endpoint fixture should parse.")
		.build()
		.expect("Provider configuration fixture should build.")
}

pub fn header(kid: &str) -> Value {
	json!({ "alg": "RS256", "kid": kid, "typ": "JWT" })
}

/// Identity-token claims valid for one hour past [`NOW`].
pub fn claims() -> Value {
	json!({
		"sub": SUBJECT,
		"iss": ISSUER,
		"aud": AUDIENCE,
		"token_use": "id",
		"exp": (NOW + Duration::hours(1)).unix_timestamp(),
		"iat": (NOW - Duration::minutes(5)).unix_timestamp(),
		"cognito:username": "ada",
		"email": "ada@example.com",
	})
}

pub fn encode_segment(value: &Value) -> String {
	URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).expect("Segment fixture should serialize."))
}

/// Signs `header.payload` with RS256 and returns the compact token.
pub fn mint(key: &RsaPrivateKey, header: &Value, payload: &Value) -> String {
	let signing_input = format!("{}.{}", encode_segment(header), encode_segment(payload));
	let signature = SigningKey::<Sha256>::new(key.clone()).sign(signing_input.as_bytes());

	format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature.to_vec()))
}

/// A token the verifier should accept at [`NOW`].
pub fn valid_token() -> String {
	mint(&signing_key(), &header(KID), &claims())
}

/// Serves a fixed key set and counts fetches.
#[derive(Debug)]
pub struct CountingSource {
	keys: Option<KeySet>,
	fetches: AtomicUsize,
}
impl CountingSource {
	pub fn serving(keys: KeySet) -> Arc<Self> {
		Arc::new(Self { keys: Some(keys), fetches: AtomicUsize::new(0) })
	}

	/// Every fetch fails with HTTP 503.
	pub fn unavailable() -> Arc<Self> {
		Arc::new(Self { keys: None, fetches: AtomicUsize::new(0) })
	}

	pub fn fetches(&self) -> usize {
		self.fetches.load(Ordering::SeqCst)
	}
}
impl KeySource for CountingSource {
	fn fetch_keys(&self) -> KeySourceFuture<'_> {
		Box::pin(async move {
			self.fetches.fetch_add(1, Ordering::SeqCst);

			self.keys.clone().ok_or(KeyFetchError::Status { status: 503 })
		})
	}
}

/// Delegates to RS256 and counts invocations.
#[derive(Debug, Default)]
pub struct CountingSignatureCheck {
	calls: AtomicUsize,
}
impl CountingSignatureCheck {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl SignatureCheck for CountingSignatureCheck {
	fn verify(&self, key: &KeyRecord, message: &[u8], signature: &[u8]) -> bool {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Rs256SignatureCheck.verify(key, message, signature)
	}
}

pub fn verifier_over(source: Arc<CountingSource>) -> TokenVerifier {
	let config = config();
	let keys = Arc::new(KeyRing::new(source, config.key_ttl));

	TokenVerifier::new(config, keys)
}
