//! User provisioning: `/a/feeds/{domain}/user/2.0`.

use crate::error::GamResult;
use crate::http::Transport;
use crate::xml::{self, Entry, Node, APPS_NS, ATOM_NS, KIND_SCHEME};

use super::{all_pages, segment};

/// A provisioning user entry.
///
/// `None` fields are left out of the request so the provider keeps its
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEntry {
    pub user_name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub password: Option<String>,
    /// `SHA-1` or `MD5` when `password` is already hashed
    pub hash_function: Option<String>,
    pub suspended: Option<bool>,
    pub admin: Option<bool>,
    pub ip_whitelisted: Option<bool>,
    pub change_password: Option<bool>,
    pub agreed_to_terms: Option<bool>,
    /// Mailbox quota in MB
    pub quota: Option<String>,
}

fn flag(entry: &Entry, attr: &str) -> Option<bool> {
    entry
        .attr_of("login", attr)
        .map(|v| v.eq_ignore_ascii_case("true"))
}

impl UserEntry {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..Self::default()
        }
    }

    pub fn from_entry(entry: &Entry) -> Self {
        let attr = |element: &str, name: &str| entry.attr_of(element, name).map(str::to_string);
        Self {
            user_name: attr("login", "userName").unwrap_or_default(),
            given_name: attr("name", "givenName"),
            family_name: attr("name", "familyName"),
            password: None,
            hash_function: None,
            suspended: flag(entry, "suspended"),
            admin: flag(entry, "admin"),
            ip_whitelisted: flag(entry, "ipWhitelisted"),
            change_password: flag(entry, "changePasswordAtNextLogin"),
            agreed_to_terms: flag(entry, "agreedToTerms"),
            quota: attr("quota", "limit"),
        }
    }

    pub fn to_xml(&self) -> String {
        let mut login = Node::new("apps:login").attr("userName", &self.user_name);
        if let Some(password) = &self.password {
            login = login.attr("password", password);
        }
        if let Some(hash) = &self.hash_function {
            login = login.attr("hashFunctionName", hash);
        }
        let flags = [
            ("suspended", self.suspended),
            ("admin", self.admin),
            ("ipWhitelisted", self.ip_whitelisted),
            ("changePasswordAtNextLogin", self.change_password),
            ("agreedToTerms", self.agreed_to_terms),
        ];
        for (name, value) in flags {
            if let Some(value) = value {
                login = login.attr(name, xml::bool_str(value));
            }
        }

        let mut entry = Node::new("atom:entry")
            .attr("xmlns:atom", ATOM_NS)
            .attr("xmlns:apps", APPS_NS)
            .child(
                Node::new("atom:category")
                    .attr("scheme", KIND_SCHEME)
                    .attr("term", format!("{}#user", APPS_NS)),
            )
            .child(login);
        if let Some(quota) = &self.quota {
            entry = entry.child(Node::new("apps:quota").attr("limit", quota));
        }
        if self.given_name.is_some() || self.family_name.is_some() {
            let mut name = Node::new("apps:name");
            if let Some(family) = &self.family_name {
                name = name.attr("familyName", family);
            }
            if let Some(given) = &self.given_name {
                name = name.attr("givenName", given);
            }
            entry = entry.child(name);
        }
        entry.document()
    }
}

pub struct Provisioning<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> Provisioning<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    fn users_url(&self, domain: &str) -> String {
        format!("{}/a/feeds/{}/user/2.0", self.base, domain)
    }

    fn user_url(&self, domain: &str, user_name: &str) -> String {
        format!("{}/{}", self.users_url(domain), segment(user_name))
    }

    pub async fn create_user(&self, domain: &str, user: &UserEntry) -> GamResult<UserEntry> {
        let doc = self
            .transport
            .post_xml(&self.users_url(domain), user.to_xml())
            .await?;
        Ok(doc
            .entries
            .first()
            .map(UserEntry::from_entry)
            .unwrap_or_else(|| user.clone()))
    }

    pub async fn retrieve_user(&self, domain: &str, user_name: &str) -> GamResult<UserEntry> {
        let entry = self
            .transport
            .get_xml(&self.user_url(domain, user_name))
            .await?
            .into_entry()?;
        Ok(UserEntry::from_entry(&entry))
    }

    /// Replaces the entry of `user_name`; a different `user.user_name`
    /// renames the account.
    pub async fn update_user(&self, domain: &str, user_name: &str, user: &UserEntry) -> GamResult<()> {
        self.transport
            .put_xml(&self.user_url(domain, user_name), user.to_xml())
            .await?;
        Ok(())
    }

    pub async fn delete_user(&self, domain: &str, user_name: &str) -> GamResult<()> {
        self.transport.delete(&self.user_url(domain, user_name)).await
    }

    /// Every user of `domain`, following pagination.
    pub async fn list_users(&self, domain: &str) -> GamResult<Vec<UserEntry>> {
        let entries = all_pages(self.transport, &self.users_url(domain)).await?;
        Ok(entries.iter().map(UserEntry::from_entry).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_entry_round_trips_through_xml() {
        let user = UserEntry {
            user_name: "jsmith".into(),
            given_name: Some("John".into()),
            family_name: Some("Smith".into()),
            password: Some("e5e9fa1ba31ecd1ae84f75caaa474f3a663f05f4".into()),
            hash_function: Some("SHA-1".into()),
            suspended: Some(false),
            quota: Some("2048".into()),
            ..UserEntry::default()
        };
        let xml = user.to_xml();
        assert!(xml.contains(r#"hashFunctionName="SHA-1""#));
        assert!(!xml.contains("admin="));

        let parsed = UserEntry::from_entry(&xml::parse(&xml).unwrap().into_entry().unwrap());
        assert_eq!(parsed.user_name, "jsmith");
        assert_eq!(parsed.given_name.as_deref(), Some("John"));
        assert_eq!(parsed.family_name.as_deref(), Some("Smith"));
        assert_eq!(parsed.suspended, Some(false));
        assert_eq!(parsed.admin, None);
        assert_eq!(parsed.quota.as_deref(), Some("2048"));
    }
}
