//! Compliance audit: email monitors, account information requests, mailbox
//! exports and the PGP key they are encrypted with.
//!
//! Base path `/a/feeds/compliance/audit`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ApiError, GamResult};
use crate::http::Transport;
use crate::xml::{bool_str, property_entry, Properties};

use super::{all_property_pages, segment};

/// Full messages, or headers only.
fn level(headers_only: bool) -> &'static str {
    if headers_only {
        "HEADER_ONLY"
    } else {
        "FULL_MESSAGE"
    }
}

/// A monitor copying one user's mail to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub destination: String,
    pub begin_date: Option<String>,
    pub end_date: String,
    pub incoming_headers_only: bool,
    pub outgoing_headers_only: bool,
    pub drafts: bool,
    pub drafts_headers_only: bool,
    pub chats: bool,
    pub chats_headers_only: bool,
}

impl Monitor {
    fn to_xml(&self) -> String {
        property_entry([
            ("destUserName", Some(self.destination.as_str())),
            ("beginDate", self.begin_date.as_deref()),
            ("endDate", Some(self.end_date.as_str())),
            ("incomingEmailMonitorLevel", Some(level(self.incoming_headers_only))),
            ("outgoingEmailMonitorLevel", Some(level(self.outgoing_headers_only))),
            ("draftMonitorLevel", self.drafts.then(|| level(self.drafts_headers_only))),
            ("chatMonitorLevel", self.chats.then(|| level(self.chats_headers_only))),
        ])
    }
}

/// Parameters of a mailbox export request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    pub begin_date: Option<String>,
    pub end_date: Option<String>,
    pub search_query: Option<String>,
    pub headers_only: bool,
    pub include_deleted: bool,
}

pub struct Audit<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> Audit<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    fn url(&self, kind: &str, domain: &str) -> String {
        format!("{}/a/feeds/compliance/audit/{}/{}", self.base, kind, domain)
    }

    fn user_url(&self, kind: &str, domain: &str, user: &str) -> String {
        format!("{}/{}", self.url(kind, domain), segment(user))
    }

    async fn post_entry(&self, url: &str, body: String) -> GamResult<Properties> {
        let doc = self.transport.post_xml(url, body).await?;
        Ok(doc.entries.first().map(|e| e.properties()).unwrap_or_default())
    }

    async fn get_entry(&self, url: &str) -> GamResult<Properties> {
        Ok(self.transport.get_xml(url).await?.into_entry()?.properties())
    }

    pub async fn create_monitor(&self, domain: &str, user: &str, monitor: &Monitor) -> GamResult<Properties> {
        self.post_entry(&self.user_url("mail/monitor", domain, user), monitor.to_xml())
            .await
    }

    /// Monitor entries (`destUserName`, `beginDate`, `endDate`, levels).
    pub async fn monitors(&self, domain: &str, user: &str) -> GamResult<Vec<Properties>> {
        all_property_pages(self.transport, &self.user_url("mail/monitor", domain, user)).await
    }

    pub async fn delete_monitor(&self, domain: &str, user: &str, destination: &str) -> GamResult<()> {
        let url = format!(
            "{}/{}",
            self.user_url("mail/monitor", domain, user),
            segment(destination)
        );
        self.transport.delete(&url).await
    }

    pub async fn request_activity(&self, domain: &str, user: &str) -> GamResult<Properties> {
        let body = property_entry(std::iter::empty());
        self.post_entry(&self.user_url("account", domain, user), body).await
    }

    pub async fn activity_status(&self, domain: &str, user: &str, request_id: &str) -> GamResult<Properties> {
        let url = format!("{}/{}", self.user_url("account", domain, user), segment(request_id));
        self.get_entry(&url).await
    }

    pub async fn all_activity_requests(&self, domain: &str) -> GamResult<Vec<Properties>> {
        all_property_pages(self.transport, &self.url("account", domain)).await
    }

    pub async fn delete_activity_request(&self, domain: &str, user: &str, request_id: &str) -> GamResult<()> {
        let url = format!("{}/{}", self.user_url("account", domain, user), segment(request_id));
        self.transport.delete(&url).await
    }

    pub async fn request_export(&self, domain: &str, user: &str, request: &ExportRequest) -> GamResult<Properties> {
        let body = property_entry([
            ("packageContent", Some(level(request.headers_only))),
            ("includeDeleted", Some(bool_str(request.include_deleted))),
            ("searchQuery", request.search_query.as_deref()),
            ("beginDate", request.begin_date.as_deref()),
            ("endDate", request.end_date.as_deref()),
        ]);
        self.post_entry(&self.user_url("mail/export", domain, user), body).await
    }

    pub async fn export_status(&self, domain: &str, user: &str, request_id: &str) -> GamResult<Properties> {
        let url = format!("{}/{}", self.user_url("mail/export", domain, user), segment(request_id));
        self.get_entry(&url).await
    }

    pub async fn all_export_requests(&self, domain: &str) -> GamResult<Vec<Properties>> {
        all_property_pages(self.transport, &self.url("mail/export", domain)).await
    }

    pub async fn delete_export_request(&self, domain: &str, user: &str, request_id: &str) -> GamResult<()> {
        let url = format!("{}/{}", self.user_url("mail/export", domain, user), segment(request_id));
        self.transport.delete(&url).await
    }

    /// Uploads the armored PGP public key that results are encrypted with.
    pub async fn upload_key(&self, domain: &str, key: &str) -> GamResult<()> {
        let encoded = STANDARD.encode(key.as_bytes());
        let body = property_entry([("publicKey", Some(encoded.as_str()))]);
        self.transport
            .post_xml(&self.url("publickey", domain), body)
            .await?;
        Ok(())
    }

    /// Fetches a result file. The URLs are pre-authorized and not signed.
    pub async fn download(&self, url: &str) -> GamResult<Vec<u8>> {
        let resp = self.transport.client().get(url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(ApiError::from_body(status.as_u16(), &text).into());
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    #[test]
    fn monitor_levels_follow_flags() {
        let monitor = Monitor {
            destination: "auditor".into(),
            begin_date: None,
            end_date: "2026-11-15 10:00".into(),
            incoming_headers_only: true,
            outgoing_headers_only: false,
            drafts: false,
            drafts_headers_only: false,
            chats: true,
            chats_headers_only: true,
        };
        let props = xml::parse(&monitor.to_xml()).unwrap().into_entry().unwrap().properties();
        assert_eq!(props.get("incomingEmailMonitorLevel"), Some("HEADER_ONLY"));
        assert_eq!(props.get("outgoingEmailMonitorLevel"), Some("FULL_MESSAGE"));
        assert_eq!(props.get("draftMonitorLevel"), None);
        assert_eq!(props.get("chatMonitorLevel"), Some("HEADER_ONLY"));
        assert_eq!(props.get("beginDate"), None);
    }
}
