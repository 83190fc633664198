//! Organization units: `/a/feeds/orgunit/2.0/{customerId}` and
//! `/a/feeds/orguser/2.0/{customerId}`.

use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::GamResult;
use crate::http::Transport;
use crate::xml::{bool_str, property_entry, Properties};

use super::{all_property_pages, segment};

/// Most users the provider accepts in one `usersToMove` list.
pub const MAX_USERS_PER_MOVE: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgUnit {
    pub name: String,
    pub path: String,
    pub description: String,
    pub parent: String,
    pub block_inheritance: bool,
}

impl OrgUnit {
    fn from_properties(props: &Properties) -> Self {
        Self {
            name: props.value("name").to_string(),
            path: props.value("orgUnitPath").to_string(),
            description: props.value("description").to_string(),
            parent: props.value("parentOrgUnitPath").to_string(),
            block_inheritance: props.is_true("blockInheritance"),
        }
    }
}

/// Attribute changes for an update; `None` leaves the attribute alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgUpdate {
    pub new_name: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub block_inheritance: Option<bool>,
}

impl OrgUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A user's placement in the OU tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgUser {
    pub email: String,
    pub org_unit_path: String,
}

impl OrgUser {
    fn from_properties(props: &Properties) -> Self {
        Self {
            email: props.value("orgUserEmail").to_string(),
            org_unit_path: props.value("orgUnitPath").to_string(),
        }
    }
}

pub struct Orgs<'a> {
    transport: &'a Transport,
    base: &'a str,
    customer_id: &'a OnceCell<String>,
}

impl<'a> Orgs<'a> {
    pub fn new(transport: &'a Transport, base: &'a str, customer_id: &'a OnceCell<String>) -> Self {
        Self {
            transport,
            base,
            customer_id,
        }
    }

    /// The organization's customer id, fetched once per session.
    pub async fn customer_id(&self) -> GamResult<String> {
        let id = self
            .customer_id
            .get_or_try_init(|| async {
                let url = format!("{}/a/feeds/customer/2.0/customerId", self.base);
                let entry = self.transport.get_xml(&url).await?.into_entry()?;
                let id = entry.properties().value("customerId").to_string();
                debug!("customer id is {}", id);
                Ok::<_, crate::error::GamError>(id)
            })
            .await?;
        Ok(id.clone())
    }

    async fn units_url(&self) -> GamResult<String> {
        Ok(format!("{}/a/feeds/orgunit/2.0/{}", self.base, self.customer_id().await?))
    }

    async fn unit_url(&self, path: &str) -> GamResult<String> {
        Ok(format!(
            "{}/{}",
            self.units_url().await?,
            segment(path.trim_start_matches('/'))
        ))
    }

    async fn users_url(&self) -> GamResult<String> {
        Ok(format!("{}/a/feeds/orguser/2.0/{}", self.base, self.customer_id().await?))
    }

    pub async fn create_org(
        &self,
        name: &str,
        description: &str,
        parent: &str,
        block_inheritance: bool,
    ) -> GamResult<()> {
        let body = property_entry([
            ("name", Some(name)),
            ("description", Some(description)),
            ("parentOrgUnitPath", Some(parent)),
            ("blockInheritance", Some(bool_str(block_inheritance))),
        ]);
        self.transport.post_xml(&self.units_url().await?, body).await?;
        Ok(())
    }

    pub async fn retrieve_org(&self, path: &str) -> GamResult<OrgUnit> {
        let entry = self
            .transport
            .get_xml(&self.unit_url(path).await?)
            .await?
            .into_entry()?;
        Ok(OrgUnit::from_properties(&entry.properties()))
    }

    /// Applies `update` and moves `users` into the OU in one request.
    ///
    /// At most [`MAX_USERS_PER_MOVE`] users may be passed.
    pub async fn update_org(&self, path: &str, update: &OrgUpdate, users: &[String]) -> GamResult<()> {
        let moving = users.join(", ");
        let body = property_entry([
            ("name", update.new_name.as_deref()),
            ("description", update.description.as_deref()),
            ("parentOrgUnitPath", update.parent.as_deref()),
            ("blockInheritance", update.block_inheritance.map(bool_str)),
            ("usersToMove", (!users.is_empty()).then_some(moving.as_str())),
        ]);
        self.transport.put_xml(&self.unit_url(path).await?, body).await?;
        Ok(())
    }

    pub async fn delete_org(&self, path: &str) -> GamResult<()> {
        self.transport.delete(&self.unit_url(path).await?).await
    }

    pub async fn all_orgs(&self) -> GamResult<Vec<OrgUnit>> {
        let url = format!("{}?get=all", self.units_url().await?);
        let props = all_property_pages(self.transport, &url).await?;
        Ok(props.iter().map(OrgUnit::from_properties).collect())
    }

    /// Every user in the organization with their OU.
    pub async fn all_org_users(&self) -> GamResult<Vec<OrgUser>> {
        let url = format!("{}?get=all", self.users_url().await?);
        let props = all_property_pages(self.transport, &url).await?;
        Ok(props.iter().map(OrgUser::from_properties).collect())
    }

    /// Users placed directly in `path`.
    pub async fn org_unit_users(&self, path: &str) -> GamResult<Vec<OrgUser>> {
        let url = format!(
            "{}?get=children&orgUnitPath={}",
            self.users_url().await?,
            segment(path.trim_start_matches('/'))
        );
        let props = all_property_pages(self.transport, &url).await?;
        Ok(props.iter().map(OrgUser::from_properties).collect())
    }

    pub async fn org_of_user(&self, email: &str) -> GamResult<OrgUser> {
        let url = format!("{}/{}", self.users_url().await?, segment(email));
        let entry = self.transport.get_xml(&url).await?.into_entry()?;
        Ok(OrgUser::from_properties(&entry.properties()))
    }
}
