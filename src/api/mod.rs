//! One client per provider API family.
//!
//! A [`Session`] owns the signed [`Transport`] and the endpoint bases; the
//! family clients borrow it and know only their URL layout and entry
//! shapes. Domains are passed per call because a target address may live in
//! a secondary domain of the organization.

pub mod adminaudit;
pub mod adminsettings;
pub mod audit;
pub mod calendar;
pub mod emailsettings;
pub mod groups;
pub mod groupsettings;
pub mod multidomain;
pub mod orgs;
pub mod profiles;
pub mod provisioning;
pub mod reporting;
pub mod resources;

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::Endpoints;
use crate::error::GamResult;
use crate::http::Transport;
use crate::rate_limit::admin_settings_limiter;
use crate::xml::{Entry, Properties};

pub use adminaudit::AdminAudit;
pub use adminsettings::AdminSettings;
pub use audit::Audit;
pub use calendar::Calendar;
pub use emailsettings::EmailSettings;
pub use groups::Groups;
pub use groupsettings::GroupSettings;
pub use multidomain::MultiDomain;
pub use orgs::Orgs;
pub use profiles::Profiles;
pub use provisioning::Provisioning;
pub use reporting::Reporting;
pub use resources::Resources;

/// Authenticated access to every API family for one organization.
pub struct Session {
    transport: Transport,
    admin_transport: Transport,
    endpoints: Endpoints,
    domain: String,
    customer_id: OnceCell<String>,
}

impl Session {
    pub fn new(transport: Transport, endpoints: Endpoints, domain: impl Into<String>) -> Self {
        let admin_transport = transport
            .clone()
            .with_rate_limiter(Arc::new(admin_settings_limiter()));
        Self {
            transport,
            admin_transport,
            endpoints,
            domain: domain.into().to_lowercase(),
            customer_id: OnceCell::new(),
        }
    }

    /// Primary domain of the organization.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn provisioning(&self) -> Provisioning<'_> {
        Provisioning::new(&self.transport, &self.endpoints.apps)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(&self.transport, &self.endpoints.apps)
    }

    pub fn multidomain(&self) -> MultiDomain<'_> {
        MultiDomain::new(&self.transport, &self.endpoints.apps, &self.domain)
    }

    /// The multidomain feed of another domain of the organization.
    pub fn multidomain_for<'a>(&'a self, domain: &'a str) -> MultiDomain<'a> {
        MultiDomain::new(&self.transport, &self.endpoints.apps, domain)
    }

    pub fn orgs(&self) -> Orgs<'_> {
        Orgs::new(&self.transport, &self.endpoints.apps, &self.customer_id)
    }

    pub fn resources(&self) -> Resources<'_> {
        Resources::new(&self.transport, &self.endpoints.apps, &self.domain)
    }

    pub fn email_settings(&self) -> EmailSettings<'_> {
        EmailSettings::new(&self.transport, &self.endpoints.apps)
    }

    pub fn audit(&self) -> Audit<'_> {
        Audit::new(&self.transport, &self.endpoints.apps)
    }

    /// Admin settings calls are paced at one per second.
    pub fn admin_settings(&self) -> AdminSettings<'_> {
        AdminSettings::new(&self.admin_transport, &self.endpoints.apps, &self.domain)
    }

    pub fn admin_audit(&self) -> AdminAudit<'_> {
        AdminAudit::new(&self.transport, &self.endpoints.googleapis)
    }

    pub fn group_settings(&self) -> GroupSettings<'_> {
        GroupSettings::new(&self.transport, &self.endpoints.googleapis)
    }

    pub fn calendar(&self) -> Calendar<'_> {
        Calendar::new(&self.transport, &self.endpoints.www)
    }

    pub fn profiles(&self) -> Profiles<'_> {
        Profiles::new(&self.transport, &self.endpoints.www)
    }

    pub fn reporting(&self) -> Reporting<'_> {
        Reporting::new(&self.transport, &self.endpoints.www, &self.domain)
    }
}

/// Fetches `url` and every page reachable through `rel="next"` links.
pub async fn all_pages(transport: &Transport, url: &str) -> GamResult<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut next = Some(url.to_string());
    let mut pages = 0usize;
    while let Some(url) = next {
        let doc = transport.get_xml(&url).await?;
        pages += 1;
        next = doc.next_link();
        entries.extend(doc.entries);
    }
    debug!("fetched {} entries in {} pages", entries.len(), pages);
    Ok(entries)
}

/// [`all_pages`], keeping only each entry's property map.
pub async fn all_property_pages(transport: &Transport, url: &str) -> GamResult<Vec<Properties>> {
    Ok(all_pages(transport, url)
        .await?
        .iter()
        .map(Entry::properties)
        .collect())
}

/// Percent-encodes one path segment. `@` stays literal, as the provider
/// writes addresses in its own URLs.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).replace("%40", "@")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_keeps_addresses_readable() {
        assert_eq!(segment("jsmith@example.com"), "jsmith@example.com");
        assert_eq!(segment("/Sales/East Coast"), "%2FSales%2FEast%20Coast");
        assert_eq!(segment("en.usa#holiday@group"), "en.usa%23holiday@group");
    }
}
