//! Per-user mail settings: `/a/feeds/emailsettings/2.0/{domain}/{user}/{setting}`.
//!
//! Every setting is a property entry; the typed helpers below only name the
//! properties and the verb the provider expects for each setting.

use crate::error::GamResult;
use crate::http::Transport;
use crate::xml::{bool_str, property_entry, Properties};

use super::{all_property_pages, segment};

/// Conditions and actions of a mail filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub has_words: Option<String>,
    pub no_words: Option<String>,
    pub has_attachment: bool,
    pub label: Option<String>,
    pub mark_read: bool,
    pub archive: bool,
    pub star: bool,
    pub forward_to: Option<String>,
    pub trash: bool,
    pub never_spam: bool,
}

impl Filter {
    pub fn has_condition(&self) -> bool {
        self.from.is_some()
            || self.to.is_some()
            || self.subject.is_some()
            || self.has_words.is_some()
            || self.no_words.is_some()
            || self.has_attachment
    }

    pub fn has_action(&self) -> bool {
        self.label.is_some()
            || self.mark_read
            || self.archive
            || self.star
            || self.forward_to.is_some()
            || self.trash
            || self.never_spam
    }

    fn to_xml(&self) -> String {
        let set = |on: bool| on.then_some("true");
        property_entry([
            ("from", self.from.as_deref()),
            ("to", self.to.as_deref()),
            ("subject", self.subject.as_deref()),
            ("hasTheWord", self.has_words.as_deref()),
            ("doesNotHaveTheWord", self.no_words.as_deref()),
            ("hasAttachment", set(self.has_attachment)),
            ("label", self.label.as_deref()),
            ("shouldMarkAsRead", set(self.mark_read)),
            ("shouldArchive", set(self.archive)),
            ("shouldStar", set(self.star)),
            ("forwardTo", self.forward_to.as_deref()),
            ("shouldTrash", set(self.trash)),
            ("neverSpam", set(self.never_spam)),
        ])
    }
}

/// Options of the general settings page; `None` is left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct General {
    pub page_size: Option<String>,
    pub shortcuts: Option<bool>,
    pub arrows: Option<bool>,
    pub snippets: Option<bool>,
    pub unicode: Option<bool>,
}

/// An auto-reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vacation {
    pub enable: bool,
    pub subject: String,
    pub message: String,
    pub contacts_only: bool,
    pub domain_only: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub struct EmailSettings<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> EmailSettings<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    fn url(&self, domain: &str, user: &str, setting: &str) -> String {
        format!(
            "{}/a/feeds/emailsettings/2.0/{}/{}/{}",
            self.base,
            domain,
            segment(user),
            setting
        )
    }

    async fn post(&self, domain: &str, user: &str, setting: &str, body: String) -> GamResult<()> {
        self.transport
            .post_xml(&self.url(domain, user, setting), body)
            .await?;
        Ok(())
    }

    async fn put(&self, domain: &str, user: &str, setting: &str, body: String) -> GamResult<()> {
        self.transport
            .put_xml(&self.url(domain, user, setting), body)
            .await?;
        Ok(())
    }

    async fn get(&self, domain: &str, user: &str, setting: &str) -> GamResult<Properties> {
        let entry = self
            .transport
            .get_xml(&self.url(domain, user, setting))
            .await?
            .into_entry()?;
        Ok(entry.properties())
    }

    async fn list(&self, domain: &str, user: &str, setting: &str) -> GamResult<Vec<Properties>> {
        all_property_pages(self.transport, &self.url(domain, user, setting)).await
    }

    pub async fn create_label(&self, domain: &str, user: &str, label: &str) -> GamResult<()> {
        self.post(domain, user, "label", property_entry([("label", Some(label))]))
            .await
    }

    /// Label entries (`label`, `unreadCount`, `visibility`).
    pub async fn labels(&self, domain: &str, user: &str) -> GamResult<Vec<Properties>> {
        self.list(domain, user, "label").await
    }

    pub async fn delete_label(&self, domain: &str, user: &str, label: &str) -> GamResult<()> {
        let url = format!("{}/{}", self.url(domain, user, "label"), segment(label));
        self.transport.delete(&url).await
    }

    pub async fn create_filter(&self, domain: &str, user: &str, filter: &Filter) -> GamResult<()> {
        self.post(domain, user, "filter", filter.to_xml()).await
    }

    pub async fn create_send_as(
        &self,
        domain: &str,
        user: &str,
        name: &str,
        address: &str,
        reply_to: Option<&str>,
        make_default: bool,
    ) -> GamResult<()> {
        let body = property_entry([
            ("name", Some(name)),
            ("address", Some(address)),
            ("replyTo", reply_to),
            ("makeDefault", make_default.then_some("true")),
        ]);
        self.post(domain, user, "sendas", body).await
    }

    /// Send-as entries (`name`, `address`, `replyTo`, `isDefault`, `verified`).
    pub async fn send_as(&self, domain: &str, user: &str) -> GamResult<Vec<Properties>> {
        self.list(domain, user, "sendas").await
    }

    pub async fn update_web_clips(&self, domain: &str, user: &str, enable: bool) -> GamResult<()> {
        let body = property_entry([("enable", Some(bool_str(enable)))]);
        self.put(domain, user, "webclip", body).await
    }

    pub async fn update_forwarding(
        &self,
        domain: &str,
        user: &str,
        enable: bool,
        forward_to: Option<&str>,
        action: Option<&str>,
    ) -> GamResult<()> {
        let body = property_entry([
            ("enable", Some(bool_str(enable))),
            ("forwardTo", forward_to),
            ("action", action),
        ]);
        self.put(domain, user, "forwarding", body).await
    }

    pub async fn forwarding(&self, domain: &str, user: &str) -> GamResult<Properties> {
        self.get(domain, user, "forwarding").await
    }

    pub async fn update_pop(
        &self,
        domain: &str,
        user: &str,
        enable: bool,
        enable_for: Option<&str>,
        action: Option<&str>,
    ) -> GamResult<()> {
        let body = property_entry([
            ("enable", Some(bool_str(enable))),
            ("enableFor", enable_for),
            ("action", action),
        ]);
        self.put(domain, user, "pop", body).await
    }

    pub async fn pop(&self, domain: &str, user: &str) -> GamResult<Properties> {
        self.get(domain, user, "pop").await
    }

    pub async fn update_imap(&self, domain: &str, user: &str, enable: bool) -> GamResult<()> {
        let body = property_entry([("enable", Some(bool_str(enable)))]);
        self.put(domain, user, "imap", body).await
    }

    pub async fn imap(&self, domain: &str, user: &str) -> GamResult<Properties> {
        self.get(domain, user, "imap").await
    }

    /// Writes the auto-reply; only `enable` is sent when it is off.
    pub async fn update_vacation(&self, domain: &str, user: &str, vacation: &Vacation) -> GamResult<()> {
        let on = vacation.enable;
        let body = property_entry([
            ("enable", Some(bool_str(on))),
            ("subject", on.then_some(vacation.subject.as_str())),
            ("message", on.then_some(vacation.message.as_str())),
            ("contactsOnly", on.then_some(bool_str(vacation.contacts_only))),
            ("domainOnly", on.then_some(bool_str(vacation.domain_only))),
            ("startDate", vacation.start_date.as_deref().filter(|_| on)),
            ("endDate", vacation.end_date.as_deref().filter(|_| on)),
        ]);
        self.put(domain, user, "vacation", body).await
    }

    pub async fn vacation(&self, domain: &str, user: &str) -> GamResult<Properties> {
        self.get(domain, user, "vacation").await
    }

    pub async fn update_signature(&self, domain: &str, user: &str, signature: &str) -> GamResult<()> {
        let body = property_entry([("signature", Some(signature))]);
        self.put(domain, user, "signature", body).await
    }

    pub async fn signature(&self, domain: &str, user: &str) -> GamResult<Properties> {
        self.get(domain, user, "signature").await
    }

    pub async fn update_language(&self, domain: &str, user: &str, language: &str) -> GamResult<()> {
        let body = property_entry([("language", Some(language))]);
        self.put(domain, user, "language", body).await
    }

    pub async fn update_general(&self, domain: &str, user: &str, general: &General) -> GamResult<()> {
        let body = property_entry([
            ("pageSize", general.page_size.as_deref()),
            ("shortcuts", general.shortcuts.map(bool_str)),
            ("arrows", general.arrows.map(bool_str)),
            ("snippets", general.snippets.map(bool_str)),
            ("unicode", general.unicode.map(bool_str)),
        ]);
        self.put(domain, user, "general", body).await
    }

    pub async fn create_delegate(&self, domain: &str, delegator: &str, address: &str) -> GamResult<()> {
        let body = property_entry([("address", Some(address))]);
        self.post(domain, delegator, "delegation", body).await
    }

    /// Delegate entries (`delegate`, `address`, `delegationId`, `status`).
    pub async fn delegates(&self, domain: &str, delegator: &str) -> GamResult<Vec<Properties>> {
        self.list(domain, delegator, "delegation").await
    }

    pub async fn delete_delegate(&self, domain: &str, delegator: &str, address: &str) -> GamResult<()> {
        let url = format!("{}/{}", self.url(domain, delegator, "delegation"), segment(address));
        self.transport.delete(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    #[test]
    fn filter_sends_only_chosen_criteria() {
        let filter = Filter {
            from: Some("boss@example.com".into()),
            has_attachment: true,
            label: Some("Boss".into()),
            star: true,
            ..Filter::default()
        };
        assert!(filter.has_condition());
        assert!(filter.has_action());
        let props = xml::parse(&filter.to_xml()).unwrap().into_entry().unwrap().properties();
        assert_eq!(props.get("from"), Some("boss@example.com"));
        assert_eq!(props.get("hasAttachment"), Some("true"));
        assert_eq!(props.get("shouldStar"), Some("true"));
        assert_eq!(props.get("shouldTrash"), None);
        assert_eq!(props.get("subject"), None);
    }

    #[test]
    fn empty_filter_has_neither_part() {
        let filter = Filter::default();
        assert!(!filter.has_condition());
        assert!(!filter.has_action());
    }
}
