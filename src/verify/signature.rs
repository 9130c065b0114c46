//! Signature step of token verification, isolated behind [`SignatureCheck`].

// crates.io
use base64::Engine;
use rsa::{
	BigUint, RsaPublicKey,
	pkcs1v15::{Signature, VerifyingKey},
	signature::Verifier,
};
use sha2::Sha256;
// self
use crate::{
	jwks::KeyRecord,
	verify::{BASE64URL, SUPPORTED_ALGORITHM},
};

/// Verifies a token signature with a published key record.
///
/// Implementations return `false` for every failure, including key records they cannot turn
/// into a usable public key.
pub trait SignatureCheck
where
	Self: Send + Sync,
{
	/// Checks `signature` over `message` with the key described by `key`.
	fn verify(&self, key: &KeyRecord, message: &[u8], signature: &[u8]) -> bool;
}

/// RSASSA-PKCS1-v1_5 with SHA-256 (`RS256`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Rs256SignatureCheck;
impl SignatureCheck for Rs256SignatureCheck {
	fn verify(&self, key: &KeyRecord, message: &[u8], signature: &[u8]) -> bool {
		let Some(public_key) = rsa_public_key(key) else {
			return false;
		};
		let Ok(signature) = Signature::try_from(signature) else {
			return false;
		};

		VerifyingKey::<Sha256>::new(public_key).verify(message, &signature).is_ok()
	}
}

/// Rebuilds an RSA public key from a key record's `n` and `e` parameters.
///
/// Returns `None` for non-RSA records, records pinned to another algorithm, and parameters that
/// are missing or do not decode.
pub fn rsa_public_key(record: &KeyRecord) -> Option<RsaPublicKey> {
	if record.kty != "RSA" {
		return None;
	}
	if record.alg.as_deref().is_some_and(|alg| alg != SUPPORTED_ALGORITHM) {
		return None;
	}

	let n = BASE64URL.decode(record.n.as_deref()?).ok()?;
	let e = BASE64URL.decode(record.e.as_deref()?).ok()?;

	RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e)).ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::KeyId;

	fn record(kty: &str, alg: Option<&str>, n: Option<&str>) -> KeyRecord {
		KeyRecord {
			kid: KeyId::new("k").expect("Fixture kid should be valid."),
			kty: kty.into(),
			alg: alg.map(Into::into),
			key_use: None,
			n: n.map(Into::into),
			e: Some("AQAB".into()),
		}
	}

	#[test]
	fn unusable_records_yield_no_key() {
		assert!(rsa_public_key(&record("EC", None, Some("AQAB"))).is_none());
		assert!(rsa_public_key(&record("RSA", Some("RS512"), Some("AQAB"))).is_none());
		assert!(rsa_public_key(&record("RSA", None, None)).is_none());
		assert!(rsa_public_key(&record("RSA", None, Some("***"))).is_none());
	}

	#[test]
	fn unusable_records_never_verify() {
		let check = Rs256SignatureCheck;

		assert!(!check.verify(&record("EC", None, Some("AQAB")), b"a.b", &[0_u8; 256]));
	}
}
