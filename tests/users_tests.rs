use anyhow::Result;
use gam::api::Session;
use gam::args::Words;
use gam::command::{self, Context};
use gam::commands::users::sha1_hex;
use gam::config::{Config, Endpoints};
use gam::credentials::CredentialRecord;
use gam::error::exit_code;
use gam::http::Transport;
use gam::oauth::KeyPair;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CREATED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<atom:entry xmlns:atom="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <apps:login userName="jsmith" suspended="false" admin="false" agreedToTerms="false"/>
  <apps:name familyName="Smith" givenName="John"/>
</atom:entry>"#;

fn session_for(server: &MockServer) -> Result<Session> {
    let record = CredentialRecord::new(
        "example.com",
        &KeyPair::anonymous(),
        &KeyPair::new("token", "secret"),
    );
    let transport = Transport::new(Duration::from_secs(5))?.with_credentials(&record);
    Ok(Session::new(transport, Endpoints::single(&server.uri()), "example.com"))
}

async fn run_line(session: &Session, config: &Config, line: &str) -> Result<()> {
    let ctx = Context { session, config };
    let command = command::parse(Words::new(line.split_whitespace()))?;
    command::run(&ctx, command).await
}

#[tokio::test]
async fn test_create_user_sends_one_hashed_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/a/feeds/example.com/user/2.0"))
        .and(body_string_contains(r#"userName="jsmith""#))
        .and(body_string_contains(format!(r#"password="{}""#, sha1_hex("secret"))))
        .and(body_string_contains(r#"hashFunctionName="SHA-1""#))
        .and(body_string_contains(r#"givenName="John""#))
        .and(body_string_contains(r#"familyName="Smith""#))
        .respond_with(ResponseTemplate::new(201).set_body_string(CREATED))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let session = session_for(&server)?;
    run_line(
        &session,
        &config,
        "create user jsmith firstname John lastname Smith password secret",
    )
    .await?;
    assert_eq!(
        sha1_hex("secret"),
        "e5e9fa1ba31ecd1ae84f75caaa474f3a663f05f4"
    );
    Ok(())
}

#[tokio::test]
async fn test_create_user_requires_names_and_password() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_string(CREATED))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let session = session_for(&server)?;
    let err = run_line(&session, &config, "create user jsmith firstname John password secret")
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), 2);
    Ok(())
}

#[tokio::test]
async fn test_create_user_rejection_exits_22() -> Result<()> {
    let server = MockServer::start().await;
    let body = r#"<AppsForYourDomainErrors><error errorCode="1300" invalidInput="jsmith" reason="EntityExists"/></AppsForYourDomainErrors>"#;
    Mock::given(method("POST"))
        .and(path("/a/feeds/example.com/user/2.0"))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let session = session_for(&server)?;
    let err = run_line(
        &session,
        &config,
        "create user jsmith firstname John lastname Smith password secret",
    )
    .await
    .unwrap_err();
    assert_eq!(exit_code(&err), 22);
    assert!(format!("{:#}", err).contains("EntityExists"));
    Ok(())
}

#[tokio::test]
async fn test_bad_toggle_is_rejected_before_any_call() -> Result<()> {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let session = session_for(&server)?;
    let err = run_line(&session, &config, "update user jsmith suspended yes")
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), 2);
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(0));
    Ok(())
}
