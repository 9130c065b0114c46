mod common;

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use time::Duration;
// self
use common::*;
use study_gate::{
	authn::{RequestAuthenticator, client_origin},
	error::{Error, KeyFetchError},
	rate_limit::{RateLimiter, rate_limit_key},
};

fn authenticator(source: Arc<CountingSource>) -> RequestAuthenticator {
	RequestAuthenticator::new(Arc::new(verifier_over(source)))
}

fn bearer(token: &str) -> HashMap<String, String> {
	HashMap::from([("Authorization".to_owned(), format!("Bearer {token}"))])
}

#[tokio::test]
async fn requests_without_a_bearer_never_touch_the_key_ring() {
	let source = CountingSource::serving(key_set());
	let authn = authenticator(source.clone());
	let token = valid_token();
	let basic = format!("Basic {token}");
	let bare = format!("Bearer{token}");

	assert!(authn.authenticate_at(&HashMap::<String, String>::new(), NOW).await.is_none());
	assert!(authn.authenticate_at(&[("authorization", basic.as_str())], NOW).await.is_none());
	assert!(authn.authenticate_at(&[("authorization", bare.as_str())], NOW).await.is_none());
	assert!(authn.authenticate_at(&[("authorization", "Bearer   ")], NOW).await.is_none());
	assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
	let authn = authenticator(CountingSource::serving(key_set()));
	let header = format!("bEaReR {}", valid_token());
	let identity = authn
		.authenticate_at(&[("Authorization", header.as_str())], NOW)
		.await
		.expect("Mixed-case scheme should authenticate.");

	assert_eq!(identity.subject.as_ref(), SUBJECT);
}

#[tokio::test]
async fn every_rejection_collapses_to_none() {
	let authn = authenticator(CountingSource::serving(key_set()));
	let forged = mint(&rogue_key(), &header(KID), &claims());

	assert!(authn.authenticate_at(&bearer(&forged), NOW).await.is_none());
	assert!(authn.authenticate_at(&bearer("garbage"), NOW).await.is_none());
	assert!(
		authn.authenticate_at(&bearer(&valid_token()), NOW + Duration::hours(2)).await.is_none()
	);
	assert!(authn.authenticate_at(&bearer(&valid_token()), NOW).await.is_some());
}

#[tokio::test]
async fn strict_mode_separates_outages_from_rejections() {
	let outage = authenticator(CountingSource::unavailable());

	assert!(outage.authenticate_at(&bearer(&valid_token()), NOW).await.is_none());

	let err = outage
		.authenticate_strict_at(&bearer(&valid_token()), NOW)
		.await
		.expect_err("Key fetch outage should surface in strict mode.");

	assert!(matches!(err, Error::KeyFetch(KeyFetchError::Status { status: 503 })));

	let healthy = authenticator(CountingSource::serving(key_set()));
	let forged = mint(&rogue_key(), &header(KID), &claims());

	assert_eq!(healthy.authenticate_strict_at(&bearer(&forged), NOW).await.ok(), Some(None));
	assert!(
		healthy
			.authenticate_strict_at(&bearer(&valid_token()), NOW)
			.await
			.expect("Valid token should not error.")
			.is_some()
	);
}

#[tokio::test]
async fn authenticated_calls_are_rate_limited_per_identity_and_origin() {
	let authn = authenticator(CountingSource::serving(key_set()));
	let limiter = RateLimiter::default();
	let token = valid_token();
	let header = format!("Bearer {token}");
	let headers =
		[("authorization", header.as_str()), ("x-forwarded-for", "198.51.100.4, 10.0.0.1")];
	let identity =
		authn.authenticate_at(&headers, NOW).await.expect("Valid token should authenticate.");
	let key = rate_limit_key("feedback", identity.subject.as_ref(), &client_origin(&headers));

	assert_eq!(key, format!("feedback:{SUBJECT}:198.51.100.4"));

	let window = Duration::minutes(1);
	let admitted = (0..7)
		.filter(|i| limiter.check_at(&key, 5, window, NOW + Duration::seconds(*i)).allowed)
		.count();

	assert_eq!(admitted, 5);

	let other_origin = rate_limit_key("feedback", SUBJECT, "unknown");

	assert!(limiter.check_at(&other_origin, 5, window, NOW).allowed);
}
