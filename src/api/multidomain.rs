//! Multi-domain aliases and renames: `/a/feeds/alias/2.0/{domain}` and
//! `/a/feeds/user/userEmail/2.0/{domain}`.
//!
//! Paths always use the primary domain; the addresses in the entries may
//! belong to any domain of the organization.

use crate::error::GamResult;
use crate::http::Transport;
use crate::xml::{property_entry, Properties};

use super::{all_property_pages, segment};

/// An alias and the user it delivers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub alias: String,
    pub user: String,
}

impl Alias {
    fn from_properties(props: &Properties) -> Self {
        Self {
            alias: props.value("aliasEmail").to_string(),
            user: props.value("userEmail").to_string(),
        }
    }
}

pub struct MultiDomain<'a> {
    transport: &'a Transport,
    base: &'a str,
    domain: &'a str,
}

impl<'a> MultiDomain<'a> {
    pub fn new(transport: &'a Transport, base: &'a str, domain: &'a str) -> Self {
        Self {
            transport,
            base,
            domain,
        }
    }

    fn aliases_url(&self) -> String {
        format!("{}/a/feeds/alias/2.0/{}", self.base, self.domain)
    }

    pub async fn create_alias(&self, user_email: &str, alias_email: &str) -> GamResult<()> {
        let body = property_entry([
            ("userEmail", Some(user_email)),
            ("aliasEmail", Some(alias_email)),
        ]);
        self.transport.post_xml(&self.aliases_url(), body).await?;
        Ok(())
    }

    pub async fn retrieve_alias(&self, alias_email: &str) -> GamResult<Alias> {
        let url = format!("{}/{}", self.aliases_url(), segment(alias_email));
        let entry = self.transport.get_xml(&url).await?.into_entry()?;
        Ok(Alias::from_properties(&entry.properties()))
    }

    pub async fn delete_alias(&self, alias_email: &str) -> GamResult<()> {
        let url = format!("{}/{}", self.aliases_url(), segment(alias_email));
        self.transport.delete(&url).await
    }

    pub async fn aliases_of(&self, user_email: &str) -> GamResult<Vec<Alias>> {
        let url = format!("{}?userEmail={}", self.aliases_url(), segment(user_email));
        let props = all_property_pages(self.transport, &url).await?;
        Ok(props.iter().map(Alias::from_properties).collect())
    }

    pub async fn all_aliases(&self) -> GamResult<Vec<Alias>> {
        let props = all_property_pages(self.transport, &self.aliases_url()).await?;
        Ok(props.iter().map(Alias::from_properties).collect())
    }

    /// Changes the primary address of `old_email` to `new_email`.
    pub async fn rename_user(&self, old_email: &str, new_email: &str) -> GamResult<()> {
        let url = format!(
            "{}/a/feeds/user/userEmail/2.0/{}/{}",
            self.base,
            self.domain,
            segment(old_email)
        );
        self.transport
            .put_xml(&url, property_entry([("newEmail", Some(new_email))]))
            .await?;
        Ok(())
    }
}
