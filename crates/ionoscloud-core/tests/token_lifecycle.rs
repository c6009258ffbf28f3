//! Token issuance and renewal behavior against a mock auth endpoint.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Months, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ionoscloud_core::auth::Credentials;
use ionoscloud_core::config::store_keys;
use ionoscloud_core::{ClientSettings, CloudClient, MemoryConfigStore};

/// Unsigned JWT expiring the given number of months from now.
fn make_token(months_from_now: u32) -> String {
    let exp = Utc::now()
        .checked_add_months(Months::new(months_from_now))
        .unwrap()
        .timestamp();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string().as_bytes());
    format!("{header}.{payload}.sig")
}

fn settings_for(server: &MockServer) -> ClientSettings {
    ClientSettings::new()
        .with_cloud_api(format!("{}/cloudapi/v6", server.uri()))
        .with_auth_api(server.uri())
}

#[tokio::test]
async fn basic_credentials_trigger_token_issuance() {
    let server = MockServer::start().await;
    let fresh = make_token(12);
    Mock::given(method("GET"))
        .and(path("/tokens/generate"))
        // base64("jane:secret")
        .and(header("Authorization", "Basic amFuZTpzZWNyZXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": fresh })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryConfigStore::with_credentials(&Credentials::basic(
        "jane", "secret",
    )));
    let client = CloudClient::connect(settings_for(&server), store.clone())
        .await
        .unwrap();

    assert_eq!(store.get(store_keys::TOKEN), Some(fresh.clone()));
    assert_eq!(store.get(store_keys::PASSWORD), None);
    assert_eq!(client.credentials().token, Some(fresh));
    assert!(client.credentials().password.is_none());
}

#[tokio::test]
async fn near_expiry_token_is_renewed_with_bearer_auth() {
    let server = MockServer::start().await;
    let expiring = make_token(1);
    let fresh = make_token(12);
    Mock::given(method("GET"))
        .and(path("/tokens/generate"))
        .and(header(
            "Authorization",
            format!("Bearer {expiring}").as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": fresh })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryConfigStore::with_credentials(&Credentials::bearer(
        expiring,
    )));
    let client = CloudClient::connect(settings_for(&server), store.clone())
        .await
        .unwrap();

    assert_eq!(store.get(store_keys::TOKEN), Some(fresh.clone()));
    assert_eq!(client.credentials().token, Some(fresh));
}

#[tokio::test]
async fn fresh_token_is_not_renewed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokens/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "unused" })))
        .expect(0)
        .mount(&server)
        .await;

    let far = make_token(6);
    let store = Arc::new(MemoryConfigStore::with_credentials(&Credentials::bearer(
        far.clone(),
    )));
    let client = CloudClient::connect(settings_for(&server), store.clone())
        .await
        .unwrap();

    assert_eq!(store.get(store_keys::TOKEN), Some(far.clone()));
    assert_eq!(client.credentials().token, Some(far));
}

#[tokio::test]
async fn generation_failure_leaves_credentials_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokens/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryConfigStore::with_credentials(&Credentials::basic(
        "jane", "secret",
    )));
    let client = CloudClient::connect(settings_for(&server), store.clone())
        .await
        .unwrap();

    // No token was issued and the password survives for the next attempt.
    assert_eq!(store.get(store_keys::TOKEN), None);
    assert_eq!(store.get(store_keys::PASSWORD), Some("secret".to_string()));
    assert!(client.credentials().token.is_none());
    assert!(client.credentials().password.is_some());
}
