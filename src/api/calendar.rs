//! Calendar data: sharing rules, calendar lists and user settings under
//! `/calendar/feeds`.

use crate::error::{GamError, GamResult};
use crate::http::Transport;
use crate::xml::{Entry, Node, ATOM_NS, GACL_NS, GCAL_NS, KIND_SCHEME};

use super::segment;

/// Access granted by a sharing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    FreeBusy,
    Read,
    Editor,
    Owner,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "freebusy" => Some(Self::FreeBusy),
            "read" => Some(Self::Read),
            "editor" => Some(Self::Editor),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::FreeBusy => "freebusy",
            Self::Read => "read",
            Self::Editor => "editor",
            Self::Owner => "owner",
        }
    }

    /// The role URI written into rules.
    pub fn uri(self) -> String {
        format!("{}#{}", GCAL_NS, self.keyword())
    }
}

/// Who a sharing rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    User(String),
    Domain(String),
    Default,
}

impl Scope {
    fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Domain(_) => "domain",
            Self::Default => "default",
        }
    }

    fn value(&self) -> Option<&str> {
        match self {
            Self::User(v) | Self::Domain(v) => Some(v),
            Self::Default => None,
        }
    }

    /// Rule id within the ACL feed: `user%3Ajsmith@example.com` or `default`.
    fn rule_id(&self) -> String {
        match self.value() {
            Some(value) => format!("{}%3A{}", self.kind(), segment(value)),
            None => self.kind().to_string(),
        }
    }
}

/// One rule of a calendar's ACL feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule {
    pub scope_type: String,
    pub scope_value: String,
    /// Human readable role, taken from the entry title
    pub role_title: String,
    pub role: String,
    pub edit_link: Option<String>,
}

impl AclRule {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            scope_type: entry.attr_of("scope", "type").unwrap_or_default().to_string(),
            scope_value: entry.attr_of("scope", "value").unwrap_or_default().to_string(),
            role_title: entry.text("title").unwrap_or_default().to_string(),
            role: entry.attr_of("role", "value").unwrap_or_default().to_string(),
            edit_link: entry.link_href("edit"),
        }
    }
}

/// A calendar in a user's calendar list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarListEntry {
    pub id: String,
    pub title: String,
    pub access_level: String,
    pub timezone: String,
    pub hidden: String,
    pub selected: String,
    pub color: String,
    pub edit_link: Option<String>,
}

impl CalendarListEntry {
    fn from_entry(entry: &Entry) -> Self {
        let value = |name: &str| entry.attr_of(name, "value").unwrap_or_default().to_string();
        Self {
            id: entry.text("id").unwrap_or_default().to_string(),
            title: entry.text("title").unwrap_or_default().to_string(),
            access_level: value("accesslevel"),
            timezone: value("timezone"),
            hidden: value("hidden"),
            selected: value("selected"),
            color: value("color"),
            edit_link: entry.link_href("edit"),
        }
    }

    /// Last path segment of the id, decoded.
    pub fn short_id(&self) -> String {
        let last = self.id.rsplit('/').next().unwrap_or(&self.id);
        urlencoding::decode(last)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| last.to_string())
    }
}

/// Display options of a calendar list entry; `None` is left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarOptions {
    pub selected: Option<bool>,
    pub hidden: Option<bool>,
    pub color: Option<String>,
}

impl CalendarOptions {
    fn to_xml(&self, id: &str, title: Option<&str>) -> String {
        let mut entry = Node::new("entry")
            .attr("xmlns", ATOM_NS)
            .attr("xmlns:gCal", GCAL_NS)
            .child(Node::new("id").text(id));
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            entry = entry.child(Node::new("title").attr("type", "text").text(title));
        }
        if let Some(hidden) = self.hidden {
            entry = entry.child(Node::new("gCal:hidden").attr("value", crate::xml::bool_str(hidden)));
        }
        if let Some(selected) = self.selected {
            entry = entry.child(Node::new("gCal:selected").attr("value", crate::xml::bool_str(selected)));
        }
        if let Some(color) = &self.color {
            entry = entry.child(Node::new("gCal:color").attr("value", color));
        }
        entry.document()
    }
}

fn acl_rule_xml(scope: &Scope, role: Role) -> String {
    let mut scope_node = Node::new("gAcl:scope").attr("type", scope.kind());
    if let Some(value) = scope.value() {
        scope_node = scope_node.attr("value", value);
    }
    Node::new("entry")
        .attr("xmlns", ATOM_NS)
        .attr("xmlns:gAcl", GACL_NS)
        .child(
            Node::new("category")
                .attr("scheme", KIND_SCHEME)
                .attr("term", format!("{}#accessRule", GACL_NS)),
        )
        .child(scope_node)
        .child(Node::new("gAcl:role").attr("value", role.uri()))
        .document()
}

pub struct Calendar<'a> {
    transport: &'a Transport,
    base: &'a str,
}

impl<'a> Calendar<'a> {
    pub fn new(transport: &'a Transport, base: &'a str) -> Self {
        Self { transport, base }
    }

    fn acl_url(&self, calendar: &str) -> String {
        format!("{}/calendar/feeds/{}/acl/full", self.base, segment(calendar))
    }

    fn list_url(&self, user_email: &str) -> String {
        format!("{}/calendar/feeds/{}/allcalendars/full", self.base, segment(user_email))
    }

    /// The feed title and every sharing rule of `calendar`.
    pub async fn acl(&self, calendar: &str) -> GamResult<(String, Vec<AclRule>)> {
        let doc = self.transport.get_xml(&self.acl_url(calendar)).await?;
        let rules = doc.entries.iter().map(AclRule::from_entry).collect();
        Ok((doc.title().to_string(), rules))
    }

    pub async fn insert_acl(&self, calendar: &str, scope: &Scope, role: Role) -> GamResult<()> {
        self.transport
            .post_xml(&self.acl_url(calendar), acl_rule_xml(scope, role))
            .await?;
        Ok(())
    }

    pub async fn update_acl(&self, calendar: &str, scope: &Scope, role: Role) -> GamResult<()> {
        let url = format!("{}/{}", self.acl_url(calendar), scope.rule_id());
        self.transport.put_xml(&url, acl_rule_xml(scope, role)).await?;
        Ok(())
    }

    pub async fn delete_acl(&self, rule: &AclRule) -> GamResult<()> {
        let url = rule
            .edit_link
            .as_deref()
            .ok_or_else(|| GamError::Xml("sharing rule has no edit link".to_string()))?;
        self.transport.delete(url).await
    }

    /// The feed title and the user's calendar list.
    pub async fn calendars(&self, user_email: &str) -> GamResult<(String, Vec<CalendarListEntry>)> {
        let doc = self.transport.get_xml(&self.list_url(user_email)).await?;
        let calendars = doc.entries.iter().map(CalendarListEntry::from_entry).collect();
        Ok((doc.title().to_string(), calendars))
    }

    pub async fn calendar(&self, user_email: &str, calendar: &str) -> GamResult<CalendarListEntry> {
        let url = format!("{}/{}", self.list_url(user_email), segment(calendar));
        let entry = self.transport.get_xml(&url).await?.into_entry()?;
        Ok(CalendarListEntry::from_entry(&entry))
    }

    /// Subscribes the user to `calendar`.
    pub async fn insert_calendar(&self, user_email: &str, calendar: &str, options: &CalendarOptions) -> GamResult<()> {
        self.transport
            .post_xml(&self.list_url(user_email), options.to_xml(calendar, None))
            .await?;
        Ok(())
    }

    /// Rewrites an existing list entry with `options` applied.
    pub async fn update_calendar(&self, current: &CalendarListEntry, options: &CalendarOptions) -> GamResult<()> {
        let url = current
            .edit_link
            .as_deref()
            .ok_or_else(|| GamError::Xml("calendar entry has no edit link".to_string()))?;
        let keep = |value: &str| match value {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        };
        let merged = CalendarOptions {
            selected: options.selected.or_else(|| keep(&current.selected)),
            hidden: options.hidden.or_else(|| keep(&current.hidden)),
            color: options
                .color
                .clone()
                .or_else(|| (!current.color.is_empty()).then(|| current.color.clone())),
        };
        self.transport
            .put_xml(url, merged.to_xml(&current.id, Some(&current.title)))
            .await?;
        Ok(())
    }

    pub async fn delete_calendar(&self, current: &CalendarListEntry) -> GamResult<()> {
        let url = current
            .edit_link
            .as_deref()
            .ok_or_else(|| GamError::Xml("calendar entry has no edit link".to_string()))?;
        self.transport.delete(url).await
    }

    /// The feed title and `(name, value)` of every setting.
    pub async fn settings(&self, user_email: &str) -> GamResult<(String, Vec<(String, String)>)> {
        let url = format!("{}/calendar/feeds/{}/settings", self.base, segment(user_email));
        let doc = self.transport.get_xml(&url).await?;
        let settings = doc
            .entries
            .iter()
            .filter_map(|e| {
                let setting = e.first("settingsProperty")?;
                Some((
                    setting.attr("name").unwrap_or_default().to_string(),
                    setting.attr("value").unwrap_or_default().to_string(),
                ))
            })
            .collect();
        Ok((doc.title().to_string(), settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    #[test]
    fn acl_rule_carries_scope_and_role_uri() {
        let body = acl_rule_xml(&Scope::User("jsmith@example.com".into()), Role::Editor);
        let entry = xml::parse(&body).unwrap().into_entry().unwrap();
        assert_eq!(entry.attr_of("scope", "type"), Some("user"));
        assert_eq!(entry.attr_of("scope", "value"), Some("jsmith@example.com"));
        assert_eq!(
            entry.attr_of("role", "value"),
            Some("http://schemas.google.com/gCal/2005#editor")
        );

        let default = acl_rule_xml(&Scope::Default, Role::Read);
        assert!(!default.contains("value=\"\""));
        assert_eq!(Scope::Default.rule_id(), "default");
        assert_eq!(Scope::Domain("example.com".into()).rule_id(), "domain%3Aexample.com");
    }

    #[test]
    fn short_id_is_decoded_last_segment() {
        let entry = CalendarListEntry {
            id: "https://www.google.com/calendar/feeds/default/allcalendars/full/en.usa%23holiday%40group.v.calendar.google.com".into(),
            ..CalendarListEntry::default()
        };
        assert_eq!(entry.short_id(), "en.usa#holiday@group.v.calendar.google.com");
    }

    #[test]
    fn roles_are_limited_to_four() {
        assert_eq!(Role::parse("FreeBusy"), Some(Role::FreeBusy));
        assert!(Role::parse("writer").is_none());
    }
}
