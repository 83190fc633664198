use anyhow::Result;
use gam::api::Session;
use gam::args::Words;
use gam::command::{self, Context};
use gam::config::{Config, Endpoints};
use gam::credentials::CredentialRecord;
use gam::error::GamError;
use gam::http::Transport;
use gam::oauth::KeyPair;
use gam::retry::RetryConfig;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MEMBER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<atom:entry xmlns:atom="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <apps:property name="memberId" value="ann@example.com"/>
</atom:entry>"#;

const NOT_AN_OWNER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AppsForYourDomainErrors>
  <error errorCode="1301" invalidInput="ann@example.com" reason="EntityDoesNotExist" />
</AppsForYourDomainErrors>"#;

fn session_for(server: &MockServer, timeout: Duration) -> Result<Session> {
    let record = CredentialRecord::new(
        "example.com",
        &KeyPair::anonymous(),
        &KeyPair::new("token", "secret"),
    );
    let transport = Transport::new(timeout)?
        .with_credentials(&record)
        .with_retry_config(RetryConfig {
            max_retries: 1,
            ..RetryConfig::default()
        });
    Ok(Session::new(transport, Endpoints::single(&server.uri()), "example.com"))
}

async fn run_line(session: &Session, config: &Config, line: &str) -> Result<()> {
    let ctx = Context { session, config };
    let command = command::parse(Words::new(line.split_whitespace()))?;
    command::run(&ctx, command).await
}

async fn mount_add_member(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/a/feeds/group/2.0/example.com/staff@other.org/member"))
        .and(body_string_contains(r#"value="ann@example.com""#))
        .respond_with(ResponseTemplate::new(201).set_body_string(MEMBER))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_add_member_ignores_missing_owner_entry() -> Result<()> {
    let server = MockServer::start().await;
    mount_add_member(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/a/feeds/group/2.0/example.com/staff@other.org/owner/ann@example.com"))
        .respond_with(ResponseTemplate::new(400).set_body_string(NOT_AN_OWNER))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let session = session_for(&server, Duration::from_secs(5))?;
    run_line(&session, &config, "update group staff@other.org add member ann").await?;
    Ok(())
}

#[tokio::test]
async fn test_add_member_propagates_transport_failures() -> Result<()> {
    let server = MockServer::start().await;
    mount_add_member(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/a/feeds/group/2.0/example.com/staff@other.org/owner/ann@example.com"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let session = session_for(&server, Duration::from_millis(300))?;
    let err = run_line(&session, &config, "update group staff@other.org add member ann")
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<GamError>(), Some(GamError::Http(_))));
    Ok(())
}
