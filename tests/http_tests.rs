use anyhow::Result;
use gam::credentials::CredentialRecord;
use gam::error::GamError;
use gam::http::Transport;
use gam::oauth::KeyPair;
use gam::retry::RetryConfig;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retries() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        initial_backoff_ms: 10,
        backoff_factor: 2.0,
        max_backoff_ms: 50,
        add_jitter: false,
    }
}

fn signed_transport() -> Result<Transport> {
    let record = CredentialRecord::new(
        "example.com",
        &KeyPair::anonymous(),
        &KeyPair::new("access-token", "access-secret"),
    );
    Ok(Transport::new(Duration::from_secs(5))?
        .with_credentials(&record)
        .with_retry_config(fast_retries()))
}

#[tokio::test]
async fn test_requests_are_oauth_signed() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a/feeds/example.com/user/2.0/jsmith"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = signed_transport()?;
    let body = transport
        .get_text(&format!("{}/a/feeds/example.com/user/2.0/jsmith", server.uri()))
        .await?;
    assert_eq!(body, "ok");

    let requests = server.received_requests().await.unwrap_or_default();
    let header = requests[0]
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(header.starts_with("OAuth "));
    assert!(header.contains(r#"oauth_consumer_key="anonymous""#));
    assert!(header.contains(r#"oauth_token="access-token""#));
    assert!(header.contains(r#"oauth_signature_method="HMAC-SHA1""#));
    assert!(header.contains(r#"oauth_version="1.0""#));
    assert!(header.contains("oauth_signature="));
    Ok(())
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .mount(&server)
        .await;

    let transport = signed_transport()?;
    let body = transport.get_text(&format!("{}/busy", server.uri())).await?;
    assert_eq!(body, "done");
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_provider_errors_are_decoded_and_not_retried() -> Result<()> {
    let server = MockServer::start().await;
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<AppsForYourDomainErrors>
  <error errorCode="1301" invalidInput="nobody" reason="EntityDoesNotExist" />
</AppsForYourDomainErrors>"#;
    Mock::given(method("DELETE"))
        .and(path("/a/feeds/example.com/user/2.0/nobody"))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let transport = signed_transport()?;
    let err = transport
        .delete(&format!("{}/a/feeds/example.com/user/2.0/nobody", server.uri()))
        .await
        .unwrap_err();
    match err {
        GamError::Api(api) => {
            assert_eq!(api.status, 400);
            assert_eq!(api.reason, "EntityDoesNotExist");
            assert_eq!(api.invalid_input, "nobody");
        }
        other => panic!("expected a provider error, got {:?}", other),
    }
    Ok(())
}
