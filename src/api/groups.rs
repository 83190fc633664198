//! Groups provisioning: `/a/feeds/group/2.0/{domain}`.

use crate::error::GamResult;
use crate::http::Transport;
use crate::xml::{property_entry, Properties};

use super::{all_property_pages, segment};

/// Who may post to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailPermission {
    Owner,
    Member,
    Domain,
    Anyone,
}

impl EmailPermission {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "member" => Some(Self::Member),
            "domain" => Some(Self::Domain),
            "anyone" => Some(Self::Anyone),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Member => "Member",
            Self::Domain => "Domain",
            Self::Anyone => "Anyone",
        }
    }
}

/// Group attributes sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permission: String,
}

impl GroupInfo {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            id: props.value("groupId").to_string(),
            name: props.value("groupName").to_string(),
            description: props.value("description").to_string(),
            permission: props.value("emailPermission").to_string(),
        }
    }

    fn to_xml(&self) -> String {
        property_entry([
            ("groupId", Some(self.id.as_str())),
            ("groupName", Some(self.name.as_str())),
            ("description", Some(self.description.as_str())),
            ("emailPermission", Some(self.permission.as_str())),
        ])
    }
}

pub struct Groups<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> Groups<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    fn groups_url(&self, domain: &str) -> String {
        format!("{}/a/feeds/group/2.0/{}", self.base, domain)
    }

    fn group_url(&self, domain: &str, group: &str) -> String {
        format!("{}/{}", self.groups_url(domain), segment(group))
    }

    pub async fn create_group(&self, domain: &str, group: &GroupInfo) -> GamResult<()> {
        self.transport
            .post_xml(&self.groups_url(domain), group.to_xml())
            .await?;
        Ok(())
    }

    pub async fn retrieve_group(&self, domain: &str, group: &str) -> GamResult<GroupInfo> {
        let entry = self
            .transport
            .get_xml(&self.group_url(domain, group))
            .await?
            .into_entry()?;
        Ok(GroupInfo::from_properties(&entry.properties()))
    }

    pub async fn update_group(&self, domain: &str, group: &GroupInfo) -> GamResult<()> {
        self.transport
            .put_xml(&self.group_url(domain, &group.id), group.to_xml())
            .await?;
        Ok(())
    }

    pub async fn delete_group(&self, domain: &str, group: &str) -> GamResult<()> {
        self.transport.delete(&self.group_url(domain, group)).await
    }

    /// Every group of `domain`; with `admin_created_only`, groups created by
    /// users are skipped.
    pub async fn list_groups(&self, domain: &str, admin_created_only: bool) -> GamResult<Vec<GroupInfo>> {
        let mut url = self.groups_url(domain);
        if admin_created_only {
            url.push_str("?skipUserCreatedGroups=true");
        }
        let props = all_property_pages(self.transport, &url).await?;
        Ok(props.iter().map(GroupInfo::from_properties).collect())
    }

    /// Groups `member` belongs to, directly or through another group.
    /// Each entry carries `groupId`, `groupName` and `directMember`.
    pub async fn groups_of(&self, domain: &str, member: &str) -> GamResult<Vec<Properties>> {
        let url = format!(
            "{}/?member={}&directOnly=false",
            self.groups_url(domain),
            segment(member)
        );
        all_property_pages(self.transport, &url).await
    }

    /// Member entries (`memberId`, `memberType`, `directMember`).
    pub async fn members(&self, domain: &str, group: &str) -> GamResult<Vec<Properties>> {
        let url = format!("{}/member", self.group_url(domain, group));
        all_property_pages(self.transport, &url).await
    }

    /// Owner entries (`email`).
    pub async fn owners(&self, domain: &str, group: &str) -> GamResult<Vec<Properties>> {
        let url = format!("{}/owner", self.group_url(domain, group));
        all_property_pages(self.transport, &url).await
    }

    pub async fn add_member(&self, domain: &str, group: &str, member: &str) -> GamResult<()> {
        let url = format!("{}/member", self.group_url(domain, group));
        self.transport
            .post_xml(&url, property_entry([("memberId", Some(member))]))
            .await?;
        Ok(())
    }

    pub async fn remove_member(&self, domain: &str, group: &str, member: &str) -> GamResult<()> {
        let url = format!("{}/member/{}", self.group_url(domain, group), segment(member));
        self.transport.delete(&url).await
    }

    pub async fn add_owner(&self, domain: &str, group: &str, owner: &str) -> GamResult<()> {
        let url = format!("{}/owner", self.group_url(domain, group));
        self.transport
            .post_xml(&url, property_entry([("email", Some(owner))]))
            .await?;
        Ok(())
    }

    pub async fn remove_owner(&self, domain: &str, group: &str, owner: &str) -> GamResult<()> {
        let url = format!("{}/owner/{}", self.group_url(domain, group), segment(owner));
        self.transport.delete(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_keywords_are_capitalized() {
        assert_eq!(EmailPermission::parse("DOMAIN").map(EmailPermission::as_str), Some("Domain"));
        assert_eq!(EmailPermission::parse("anyone").map(EmailPermission::as_str), Some("Anyone"));
        assert!(EmailPermission::parse("everyone").is_none());
    }
}
