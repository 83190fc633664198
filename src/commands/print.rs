//! `print users|groups|aliases|nicknames|orgs|resources|postini`.
//!
//! Tables go to stdout as CSV with a header row; progress goes to stderr.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;

use crate::api::provisioning::UserEntry;
use crate::args::Words;
use crate::command::Context;
use crate::error::{GamError, GamResult};
use crate::output::print_csv;
use crate::targets::is_system_account;
use crate::validation::split_address;

/// A column of `print users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Firstname,
    Lastname,
    Username,
    Ou,
    Suspended,
    ChangePassword,
    AgreedToTerms,
    Admin,
    Aliases,
    Groups,
}

impl UserColumn {
    fn parse(word: &str) -> Option<Self> {
        Some(match word.to_lowercase().as_str() {
            "firstname" => Self::Firstname,
            "lastname" => Self::Lastname,
            "username" => Self::Username,
            "ou" => Self::Ou,
            "suspended" => Self::Suspended,
            "changepassword" => Self::ChangePassword,
            "agreed2terms" => Self::AgreedToTerms,
            "admin" => Self::Admin,
            "aliases" | "nicknames" => Self::Aliases,
            "groups" => Self::Groups,
            _ => return None,
        })
    }

    fn title(self) -> &'static str {
        match self {
            Self::Firstname => "Firstname",
            Self::Lastname => "Lastname",
            Self::Username => "Username",
            Self::Ou => "OU",
            Self::Suspended => "Suspended",
            Self::ChangePassword => "ChangePassword",
            Self::AgreedToTerms => "AgreedToTerms",
            Self::Admin => "Admin",
            Self::Aliases => "Aliases",
            Self::Groups => "Groups",
        }
    }

    /// Columns read from the per-domain user feed.
    fn needs_user_feed(self) -> bool {
        matches!(
            self,
            Self::Firstname
                | Self::Lastname
                | Self::Suspended
                | Self::ChangePassword
                | Self::AgreedToTerms
                | Self::Admin
        )
    }
}

/// Columns in argument order; an unknown word exits 5.
pub fn parse_user_columns(words: &mut Words) -> Result<Vec<UserColumn>, GamError> {
    let mut columns = Vec::new();
    while let Some(word) = words.next_word() {
        match UserColumn::parse(&word) {
            Some(column) => columns.push(column),
            None => {
                return Err(GamError::usage_code(
                    format!("Error: unknown argument {} for \"gam print users\"", word),
                    5,
                ))
            }
        }
    }
    Ok(columns)
}

fn flag(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Empty when the provider says the user is gone.
fn or_empty<T>(result: GamResult<Vec<T>>) -> GamResult<Vec<T>> {
    match result {
        Err(GamError::Api(err)) if err.is_reason("EntityDoesNotExist") => Ok(Vec::new()),
        other => other,
    }
}

pub async fn users(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let columns = parse_user_columns(words)?;
    let session = ctx.session;

    eprintln!(
        "Getting all users in the {} organization (may take some time on a large Google Apps account)...",
        session.domain()
    );
    let placements: Vec<(String, String)> = session
        .orgs()
        .all_org_users()
        .await?
        .into_iter()
        .map(|u| (u.email.to_lowercase(), u.org_unit_path))
        .filter(|(email, _)| !is_system_account(email))
        .collect();
    eprintln!("done.");

    let mut details: HashMap<String, UserEntry> = HashMap::new();
    if columns.iter().any(|c| c.needs_user_feed()) {
        let domains: BTreeSet<String> = placements
            .iter()
            .filter_map(|(email, _)| split_address(email).1.map(str::to_string))
            .collect();
        for domain in domains {
            eprintln!(
                "Getting detailed info for users in {} domain (may take some time on a large domain)...",
                domain
            );
            for user in session.provisioning().list_users(&domain).await? {
                let email = format!("{}@{}", user.user_name, domain).to_lowercase();
                details.insert(email, user);
            }
        }
    }

    let total = placements.len();
    let mut rows = Vec::with_capacity(total);
    for (index, (email, ou)) in placements.iter().enumerate() {
        let user = details.get(email);
        let mut row = vec![email.clone()];
        for column in &columns {
            let cell = match column {
                UserColumn::Firstname => user.and_then(|u| u.given_name.clone()).unwrap_or_default(),
                UserColumn::Lastname => user.and_then(|u| u.family_name.clone()).unwrap_or_default(),
                UserColumn::Username => split_address(email).0.to_string(),
                UserColumn::Ou => ou.clone(),
                UserColumn::Suspended => flag(user.and_then(|u| u.suspended)),
                UserColumn::ChangePassword => flag(user.and_then(|u| u.change_password)),
                UserColumn::AgreedToTerms => flag(user.and_then(|u| u.agreed_to_terms)),
                UserColumn::Admin => flag(user.and_then(|u| u.admin)),
                UserColumn::Aliases => {
                    eprintln!("Getting Aliases for {} ({}/{})", email, index + 1, total);
                    or_empty(session.multidomain().aliases_of(email).await)?
                        .into_iter()
                        .map(|a| a.alias)
                        .collect::<Vec<_>>()
                        .join(" ")
                }
                UserColumn::Groups => {
                    eprintln!(
                        "Getting Group Membership for {} ({}/{})",
                        email,
                        index + 1,
                        total
                    );
                    let (name, domain) = split_address(email);
                    let domain = domain.unwrap_or(session.domain());
                    or_empty(session.groups().groups_of(domain, name).await)?
                        .iter()
                        .map(|g| g.value("groupId").to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            };
            row.push(cell);
        }
        rows.push(row);
    }

    let mut header = vec!["Email"];
    header.extend(columns.iter().map(|c| c.title()));
    print_csv(&header, &rows)?;
    Ok(())
}

/// Which groups `print groups` lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupFilter {
    All,
    AdminCreated,
    UserManaged,
}

pub async fn groups(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let mut header = vec!["GroupID"];
    let mut domain = ctx.session.domain().to_string();
    let mut filter = GroupFilter::All;
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "name" => header.push("Name"),
            "description" => header.push("Description"),
            "permission" => header.push("Permission"),
            "domain" => domain = words.value_for("domain")?,
            "nousermanagedgroups" => filter = GroupFilter::AdminCreated,
            "onlyusermanagedgroups" => filter = GroupFilter::UserManaged,
            other => {
                return Err(GamError::usage_code(
                    format!("Error: unknown argument {} for \"gam print groups\"", other),
                    7,
                )
                .into())
            }
        }
    }

    eprintln!(
        "Retrieving All Groups for domain {} (may take some time on large domain)...",
        domain
    );
    let api = ctx.session.groups();
    let groups = match filter {
        GroupFilter::All => api.list_groups(&domain, false).await?,
        GroupFilter::AdminCreated => api.list_groups(&domain, true).await?,
        GroupFilter::UserManaged => {
            let admin: BTreeSet<String> = api
                .list_groups(&domain, true)
                .await?
                .into_iter()
                .map(|g| g.id)
                .collect();
            api.list_groups(&domain, false)
                .await?
                .into_iter()
                .filter(|g| !admin.contains(&g.id))
                .collect()
        }
    };

    let rows: Vec<Vec<String>> = groups
        .into_iter()
        .map(|group| {
            header
                .iter()
                .map(|column| match *column {
                    "Name" => group.name.clone(),
                    "Description" => group.description.clone(),
                    "Permission" if group.permission.is_empty() => "Unknown".to_string(),
                    "Permission" => group.permission.clone(),
                    _ => group.id.clone(),
                })
                .collect()
        })
        .collect();
    print_csv(&header, &rows)?;
    Ok(())
}

/// `print aliases|nicknames [domain <d>]`
pub async fn aliases(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let mut domain = ctx.session.domain().to_string();
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "domain" => domain = words.value_for("domain")?,
            other => return Err(super::unknown_argument(other, "gam print aliases").into()),
        }
    }
    eprintln!(
        "Retrieving All Aliases for domain {} (may take some time on large domain)...",
        domain
    );
    let aliases = ctx
        .session
        .multidomain_for(&domain)
        .all_aliases()
        .await?;
    println!("Alias, User");
    for alias in aliases {
        println!("{}, {}", alias.alias, alias.user);
    }
    Ok(())
}

pub async fn orgs(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let mut header = vec!["Path"];
    while let Some(keyword) = words.next_keyword() {
        header.push(match keyword.as_str() {
            "name" => "Name",
            "description" => "Description",
            "parent" => "Parent",
            "inherit" => "InheritanceBlocked",
            other => {
                return Err(GamError::usage_code(
                    format!("Error: unknown argument {} for \"gam print orgs\"", other),
                    8,
                )
                .into())
            }
        });
    }
    eprintln!(
        "Retrieving All Organizational Units for your account (may take some time on large domain)..."
    );
    let rows: Vec<Vec<String>> = ctx
        .session
        .orgs()
        .all_orgs()
        .await?
        .into_iter()
        .map(|unit| {
            header
                .iter()
                .map(|column| match *column {
                    "Name" => unit.name.clone(),
                    "Description" => unit.description.clone(),
                    "Parent" => unit.parent.clone(),
                    "InheritanceBlocked" => unit.block_inheritance.to_string(),
                    _ => unit.path.clone(),
                })
                .collect()
        })
        .collect();
    print_csv(&header, &rows)?;
    Ok(())
}

pub async fn resources(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let mut header = vec!["Name"];
    while let Some(keyword) = words.next_keyword() {
        header.push(match keyword.as_str() {
            "id" => "ID",
            "description" => "Description",
            "email" => "Email",
            other => return Err(super::unknown_argument(other, "gam print resources").into()),
        });
    }
    eprintln!(
        "Retrieving All Resource Calendars for your account (may take some time on a large domain)"
    );
    let rows: Vec<Vec<String>> = ctx
        .session
        .resources()
        .all_resources()
        .await?
        .into_iter()
        .map(|resource| {
            header
                .iter()
                .map(|column| match *column {
                    "ID" => resource.id.clone(),
                    "Description" => resource.description.clone(),
                    "Email" => resource.email.clone(),
                    _ => resource.common_name.clone(),
                })
                .collect()
        })
        .collect();
    print_csv(&header, &rows)?;
    Ok(())
}

/// Line templates of the Postini import script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostiniTemplates {
    pub user: String,
    pub alias: String,
    pub group: String,
}

impl Default for PostiniTemplates {
    fn default() -> Self {
        Self {
            user: "adduser %user%".into(),
            alias: "addalias %user%, %alias%".into(),
            group: "addalias %list_owner%, %group%".into(),
        }
    }
}

impl PostiniTemplates {
    /// First three lines of a template file: user, alias, group.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines();
        let defaults = Self::default();
        Self {
            user: lines.next().map(str::to_string).unwrap_or(defaults.user),
            alias: lines.next().map(str::to_string).unwrap_or(defaults.alias),
            group: lines.next().map(str::to_string).unwrap_or(defaults.group),
        }
    }

    pub fn user_line(&self, user: &str, ou: &str) -> String {
        self.user.replace("%user%", user).replace("%ou%", ou)
    }

    pub fn alias_line(&self, user: &str, alias: &str) -> String {
        self.alias.replace("%user%", user).replace("%alias%", alias)
    }

    pub fn group_line(&self, group: &crate::api::groups::GroupInfo, list_owner: &str) -> String {
        self.group
            .replace("%group%", &group.id)
            .replace("%name%", &group.name)
            .replace("%description%", &group.description)
            .replace("%list_owner%", list_owner)
    }
}

pub async fn postini(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let list_owner = words.next_word().ok_or_else(|| {
        GamError::usage_code(
            "You must include an email address that will own all group addresses",
            3,
        )
    })?;
    let template_file = ctx.config.path("postini-format.txt");
    let templates = match std::fs::read_to_string(&template_file) {
        Ok(text) => PostiniTemplates::parse(&text),
        Err(_) => PostiniTemplates::default(),
    };

    let session = ctx.session;
    eprint!(
        "Getting all users in the {} organization (may take some time on a large Google Apps account)...",
        session.domain()
    );
    let users = session.orgs().all_org_users().await?;
    eprintln!("done.");
    eprint!("Getting all email aliases in the organization...");
    let aliases = session.multidomain().all_aliases().await?;
    eprintln!("done.");
    eprint!("Getting all groups in the organization...");
    let groups = session.groups().list_groups(session.domain(), false).await?;
    eprintln!("done.");

    println!("# Begin Users");
    println!();
    for user in users.iter().filter(|u| !is_system_account(&u.email)) {
        println!("{}", templates.user_line(&user.email, &user.org_unit_path));
    }
    println!();
    println!("# Begin Aliases");
    println!();
    for alias in &aliases {
        println!("{}", templates.alias_line(&alias.user, &alias.alias));
    }
    println!();
    println!("# Begin Groups");
    println!();
    for group in &groups {
        println!("{}", templates.group_line(group, &list_owner));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::groups::GroupInfo;

    #[test]
    fn user_columns_keep_argument_order() {
        let mut words = Words::new(["OU", "firstname", "nicknames"]);
        let columns = parse_user_columns(&mut words).unwrap();
        assert_eq!(
            columns,
            vec![UserColumn::Ou, UserColumn::Firstname, UserColumn::Aliases]
        );
        let mut words = Words::new(["firstname", "shoesize"]);
        assert_eq!(parse_user_columns(&mut words).unwrap_err().exit_code(), 5);
    }

    #[test]
    fn postini_templates_fill_placeholders() {
        let templates = PostiniTemplates::parse("adduser %user% org=%ou%\naddalias %user%, %alias%\n");
        assert_eq!(
            templates.user_line("jsmith@example.com", "/Sales"),
            "adduser jsmith@example.com org=/Sales"
        );
        assert_eq!(templates.group, PostiniTemplates::default().group);

        let group = GroupInfo {
            id: "staff@example.com".into(),
            name: "Staff".into(),
            description: String::new(),
            permission: "Member".into(),
        };
        assert_eq!(
            templates.group_line(&group, "owner@example.com"),
            "addalias owner@example.com, staff@example.com"
        );
    }
}
