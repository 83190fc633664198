//! Expands `<user|group|ou|all> <name>` into the users a command acts on.

use crate::api::Session;
use crate::error::{GamError, GamResult};
use crate::validation::{qualify, split_address};

/// Who an entity command applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    User(String),
    Group(String),
    Ou(String),
    AllUsers,
}

impl Target {
    /// Reads the entity keyword and its argument.
    pub fn parse(entity: &str, value: &str) -> GamResult<Self> {
        match entity.to_lowercase().as_str() {
            "user" => Ok(Self::User(value.to_lowercase())),
            "group" => Ok(Self::Group(value.to_lowercase())),
            "ou" => Ok(Self::Ou(value.to_string())),
            "all" if value.eq_ignore_ascii_case("users") => Ok(Self::AllUsers),
            "all" => Err(GamError::usage(format!(
                "Error: expected \"all users\", got \"all {}\"",
                value
            ))),
            other => Err(GamError::usage(format!("Error: unknown entity {}", other))),
        }
    }

    pub fn is_entity(word: &str) -> bool {
        matches!(word.to_lowercase().as_str(), "user" | "group" | "ou" | "all")
    }
}

/// Provider-internal accounts that are not people.
pub fn is_system_account(email: &str) -> bool {
    email.starts_with(".@")
        || email.starts_with("gcc_websvc@")
        || email.starts_with("secure-data-connector-user@")
        || email.ends_with("@gtempaccount.com")
}

/// The listings a target expands through.
#[allow(async_fn_in_trait)]
pub trait Directory {
    fn primary_domain(&self) -> &str;

    /// `memberId` of every member of `group`, read from the group feed of `domain`.
    async fn group_members(&self, domain: &str, group: &str) -> GamResult<Vec<String>>;

    /// Addresses of the users placed in the OU.
    async fn ou_users(&self, path: &str) -> GamResult<Vec<String>>;

    /// Address of every user of the organization.
    async fn all_users(&self) -> GamResult<Vec<String>>;
}

impl Directory for Session {
    fn primary_domain(&self) -> &str {
        self.domain()
    }

    async fn group_members(&self, domain: &str, group: &str) -> GamResult<Vec<String>> {
        Ok(self
            .groups()
            .members(domain, group)
            .await?
            .iter()
            .map(|m| m.value("memberId").to_string())
            .collect())
    }

    async fn ou_users(&self, path: &str) -> GamResult<Vec<String>> {
        Ok(self
            .orgs()
            .org_unit_users(path)
            .await?
            .into_iter()
            .map(|u| u.email)
            .collect())
    }

    async fn all_users(&self) -> GamResult<Vec<String>> {
        Ok(self
            .orgs()
            .all_org_users()
            .await?
            .into_iter()
            .map(|u| u.email)
            .collect())
    }
}

/// The user names a command acts on.
///
/// Group members in the primary domain are reduced to their local part;
/// everyone else keeps the full address. Progress goes to stderr.
pub async fn resolve<D: Directory>(directory: &D, target: &Target) -> GamResult<Vec<String>> {
    match target {
        Target::User(user) => Ok(vec![user.clone()]),
        Target::Group(group) => {
            eprintln!(
                "Getting all members of {} (may take some time for large groups)...",
                group
            );
            let primary = directory.primary_domain();
            let members = directory
                .group_members(primary, &qualify(group, primary))
                .await?;
            eprintln!("done.");
            Ok(members
                .into_iter()
                .map(|m| match split_address(&m) {
                    (local, Some(d)) if d.eq_ignore_ascii_case(directory.primary_domain()) => {
                        local.to_string()
                    }
                    _ => m,
                })
                .collect())
        }
        Target::Ou(path) => {
            eprintln!(
                "Getting all users of {} Organizational Unit (May take some time for large OUs)...",
                path
            );
            let users = directory.ou_users(path).await?;
            eprintln!("done.");
            Ok(users)
        }
        Target::AllUsers => {
            eprintln!(
                "Getting all users in the Google Apps {} organization (may take some time on a large domain)...",
                directory.primary_domain()
            );
            let users: Vec<String> = directory
                .all_users()
                .await?
                .into_iter()
                .filter(|u| !is_system_account(u))
                .collect();
            eprintln!("done.");
            Ok(users)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_accounts_are_recognised() {
        assert!(is_system_account(".@example.com"));
        assert!(is_system_account("gcc_websvc@example.com"));
        assert!(is_system_account("secure-data-connector-user@example.com"));
        assert!(is_system_account("jsmith@gtempaccount.com"));
        assert!(!is_system_account("jsmith@example.com"));
    }

    #[test]
    fn all_requires_users() {
        assert_eq!(Target::parse("ALL", "Users").unwrap(), Target::AllUsers);
        assert!(Target::parse("all", "groups").is_err());
        assert_eq!(Target::parse("user", "JSmith").unwrap(), Target::User("jsmith".into()));
        assert_eq!(Target::parse("ou", "/Sales").unwrap(), Target::Ou("/Sales".into()));
        assert_eq!(Target::parse("team", "x").unwrap_err().exit_code(), 2);
    }
}
