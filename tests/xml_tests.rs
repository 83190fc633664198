use anyhow::Result;
use gam::api::{all_pages, all_property_pages};
use gam::http::Transport;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn alias_page(next: Option<&str>, aliases: &[&str]) -> String {
    let link = next
        .map(|href| format!(r#"<link rel="next" href="{}"/>"#, href))
        .unwrap_or_default();
    let entries: String = aliases
        .iter()
        .map(|alias| {
            format!(
                r#"<entry><apps:property name="aliasEmail" value="{}"/><apps:property name="userEmail" value="owner@example.com"/></entry>"#,
                alias
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">{}{}</feed>"#,
        link, entries
    )
}

#[tokio::test]
async fn test_feeds_are_followed_through_next_links() -> Result<()> {
    let server = MockServer::start().await;
    let feed = "/a/feeds/alias/2.0/example.com";
    let second = format!("{}{}?start=b", server.uri(), feed);
    Mock::given(method("GET"))
        .and(path(feed))
        .and(query_param("start", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(alias_page(None, &["b@example.com"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(feed))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(alias_page(Some(&second), &["a1@example.com", "a2@example.com"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = Transport::new(Duration::from_secs(5))?;
    let props = all_property_pages(&transport, &format!("{}{}", server.uri(), feed)).await?;
    let aliases: Vec<&str> = props.iter().map(|p| p.value("aliasEmail")).collect();
    assert_eq!(aliases, vec!["a1@example.com", "a2@example.com", "b@example.com"]);
    Ok(())
}

#[tokio::test]
async fn test_empty_feed_has_no_entries() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(alias_page(None, &[])))
        .mount(&server)
        .await;

    let transport = Transport::new(Duration::from_secs(5))?;
    let entries = all_pages(&transport, &format!("{}/a/feeds/alias/2.0/example.com", server.uri())).await?;
    assert!(entries.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_an_xml_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<feed><entry></feed>"))
        .mount(&server)
        .await;

    let transport = Transport::new(Duration::from_secs(5))?;
    let err = transport
        .get_xml(&format!("{}/broken", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, gam::error::GamError::Xml(_)));
    Ok(())
}
