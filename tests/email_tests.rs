use anyhow::Result;
use gam::api::Session;
use gam::args::Words;
use gam::command::{self, Context};
use gam::config::{Config, Endpoints};
use gam::credentials::CredentialRecord;
use gam::error::exit_code;
use gam::http::Transport;
use gam::oauth::KeyPair;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OK_ENTRY: &str = r#"<entry xmlns:apps="http://schemas.google.com/apps/2006"/>"#;

async fn run_line(server: &MockServer, line: &str) -> Result<()> {
    let record = CredentialRecord::new("example.com", &KeyPair::anonymous(), &KeyPair::new("t", "s"));
    let transport = Transport::new(Duration::from_secs(5))?.with_credentials(&record);
    let session = Session::new(transport, Endpoints::single(&server.uri()), "example.com");
    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let ctx = Context {
        session: &session,
        config: &config,
    };
    command::run(&ctx, command::parse(Words::new(line.split_whitespace()))?).await
}

#[tokio::test]
async fn test_imap_noconfirm_skips_terms_lookup() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/a/feeds/emailsettings/2.0/example.com/jsmith/imap"))
        .and(body_string_contains(r#"name="enable" value="true""#))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_ENTRY))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_ENTRY))
        .expect(0)
        .mount(&server)
        .await;

    run_line(&server, "user jsmith imap on noconfirm").await
}

#[tokio::test]
async fn test_enabling_pop_checks_terms_of_service() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a/feeds/example.com/user/2.0/jsmith"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<entry xmlns:apps="http://schemas.google.com/apps/2006"><apps:login userName="jsmith" agreedToTerms="false"/></entry>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/a/feeds/emailsettings/2.0/example.com/jsmith/pop"))
        .and(body_string_contains(r#"name="enableFor" value="MAIL_FROM_NOW_ON""#))
        .and(body_string_contains(r#"name="action" value="ARCHIVE""#))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_ENTRY))
        .expect(1)
        .mount(&server)
        .await;

    run_line(&server, "user jsmith pop on for newmail action archive").await
}

#[tokio::test]
async fn test_signature_is_escaped_with_line_breaks() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/a/feeds/emailsettings/2.0/other.org/ann/signature"))
        .and(body_string_contains(
            r#"name="signature" value="Ann &amp; Co&#xA;Sales""#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_ENTRY))
        .expect(1)
        .mount(&server)
        .await;

    let record = CredentialRecord::new("example.com", &KeyPair::anonymous(), &KeyPair::new("t", "s"));
    let transport = Transport::new(Duration::from_secs(5))?.with_credentials(&record);
    let session = Session::new(transport, Endpoints::single(&server.uri()), "example.com");
    let dir = tempfile::tempdir()?;
    let config = Config::in_dir(dir.path(), Endpoints::single(&server.uri()));
    let ctx = Context {
        session: &session,
        config: &config,
    };
    let words = Words::new([
        "user",
        "ann@other.org",
        "signature",
        "Ann & Co\\nSales",
    ]);
    command::run(&ctx, command::parse(words)?).await
}

#[tokio::test]
async fn test_filter_without_action_sends_nothing() -> Result<()> {
    let server = MockServer::start().await;
    let err = run_line(&server, "user jsmith filter from boss@example.com")
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), 2);
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(0));
    Ok(())
}

#[tokio::test]
async fn test_delegate_requires_to_keyword() -> Result<()> {
    let server = MockServer::start().await;
    let err = run_line(&server, "user jsmith delegate assistant").await.unwrap_err();
    assert_eq!(exit_code(&err), 6);
    Ok(())
}

#[tokio::test]
async fn test_same_domain_delegation_needs_no_alias() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/a/feeds/emailsettings/2.0/example.com/boss/delegation"))
        .and(body_string_contains(r#"name="address" value="assistant@example.com""#))
        .respond_with(ResponseTemplate::new(201).set_body_string(OK_ENTRY))
        .expect(1)
        .mount(&server)
        .await;

    run_line(&server, "user boss delegate to assistant").await
}
