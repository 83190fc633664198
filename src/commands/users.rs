//! `create|update|info|delete user`.

use anyhow::{Context as _, Result};
use rand::seq::SliceRandom;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::api::provisioning::UserEntry;
use crate::args::{on_off, Words};
use crate::command::Context;
use crate::error::GamError;
use crate::validation::{qualify, user_and_domain};

use super::unknown_argument;

/// Hex SHA-1 of a clear-text password.
pub fn sha1_hex(password: &str) -> String {
    hex::encode(Sha1::digest(password.as_bytes()))
}

fn hash_keyword(keyword: &str) -> Option<&'static str> {
    match keyword {
        "sha" | "sha1" | "sha-1" => Some("SHA-1"),
        "md5" => Some("MD5"),
        _ => None,
    }
}

/// Options of `create user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUser {
    pub user: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    /// Set when the password was given already hashed.
    pub hash_function: Option<&'static str>,
    pub suspended: bool,
    pub quota: Option<String>,
    pub change_password: bool,
}

impl CreateUser {
    pub fn parse(words: &mut Words) -> Result<Self, GamError> {
        let user = words.require("a user name")?;
        let (mut first, mut last, mut password) = (None, None, None);
        let mut hash_function = None;
        let mut suspended = false;
        let mut quota = None;
        let mut change_password = false;
        while let Some(keyword) = words.next_keyword() {
            match keyword.as_str() {
                "firstname" => first = Some(words.value_for("firstname")?),
                "lastname" => last = Some(words.value_for("lastname")?),
                "password" => password = Some(words.value_for("password")?),
                "suspended" => suspended = true,
                "quota" => quota = Some(words.value_for("quota")?),
                "changepassword" => change_password = true,
                other => match hash_keyword(other) {
                    Some(hash) => hash_function = Some(hash),
                    None => return Err(unknown_argument(other, "gam create user")),
                },
            }
        }
        match (first, last, password) {
            (Some(first_name), Some(last_name), Some(password)) => Ok(Self {
                user,
                first_name,
                last_name,
                password,
                hash_function,
                suspended,
                quota,
                change_password,
            }),
            _ => Err(GamError::usage(
                "Error: firstname, lastname and password are required to create a user",
            )),
        }
    }

    /// The entry sent to the provider; clear-text passwords are SHA-1 hashed.
    pub fn entry(&self, user_name: &str) -> UserEntry {
        let (password, hash) = match self.hash_function {
            Some(hash) => (self.password.clone(), hash),
            None => (sha1_hex(&self.password), "SHA-1"),
        };
        UserEntry {
            given_name: Some(self.first_name.clone()),
            family_name: Some(self.last_name.clone()),
            password: Some(password),
            hash_function: Some(hash.to_string()),
            suspended: Some(self.suspended),
            change_password: self.change_password.then_some(true),
            quota: self.quota.clone(),
            ..UserEntry::new(user_name)
        }
    }
}

pub async fn create(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let options = CreateUser::parse(words)?;
    println!("Creating account for {}", options.user);
    let (user_name, domain) = user_and_domain(&options.user, ctx.session.domain());
    match ctx
        .session
        .provisioning()
        .create_user(&domain, &options.entry(&user_name))
        .await
    {
        Ok(_) => Ok(()),
        Err(GamError::Api(err)) => Err(GamError::failed(format!("Error: {}", err), 22).into()),
        Err(err) => Err(err).context("creating user"),
    }
}

/// Options of `update user`; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUser {
    pub user: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub hash_function: Option<&'static str>,
    pub admin: Option<bool>,
    pub suspended: Option<bool>,
    pub ip_whitelisted: Option<bool>,
    pub change_password: Option<bool>,
    pub new_user_name: Option<String>,
}

impl UpdateUser {
    pub fn parse(words: &mut Words) -> Result<Self, GamError> {
        let mut options = Self {
            user: words.require("a user name")?,
            ..Self::default()
        };
        while let Some(keyword) = words.next_keyword() {
            match keyword.as_str() {
                "firstname" => options.first_name = Some(words.value_for("firstname")?),
                "lastname" => options.last_name = Some(words.value_for("lastname")?),
                "password" => options.password = Some(words.value_for("password")?),
                "username" => options.new_user_name = Some(words.value_for("username")?),
                "admin" => options.admin = Some(on_off(&words.value_for("admin")?, "admin")?),
                "suspended" => {
                    options.suspended = Some(on_off(&words.value_for("suspended")?, "suspended")?)
                }
                "ipwhitelisted" => {
                    options.ip_whitelisted =
                        Some(on_off(&words.value_for("ipwhitelisted")?, "ipwhitelisted")?)
                }
                "changepassword" => {
                    options.change_password =
                        Some(on_off(&words.value_for("changepassword")?, "changepassword")?)
                }
                other => match hash_keyword(other) {
                    Some(hash) => options.hash_function = Some(hash),
                    None => return Err(unknown_argument(other, "gam update user")),
                },
            }
        }
        Ok(options)
    }

    fn touches_account(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.password.is_some()
            || self.hash_function.is_some()
            || self.admin.is_some()
            || self.suspended.is_some()
            || self.ip_whitelisted.is_some()
            || self.change_password.is_some()
    }

    /// Applies the requested changes to a retrieved entry.
    pub fn apply(&self, user: &mut UserEntry) {
        if let Some(first) = &self.first_name {
            user.given_name = Some(first.clone());
        }
        if let Some(last) = &self.last_name {
            user.family_name = Some(last.clone());
        }
        match (&self.password, self.hash_function) {
            (Some(password), None) => {
                user.password = Some(sha1_hex(password));
                user.hash_function = Some("SHA-1".to_string());
            }
            (password, hash) => {
                if let Some(password) = password {
                    user.password = Some(password.clone());
                }
                if let Some(hash) = hash {
                    user.hash_function = Some(hash.to_string());
                }
            }
        }
        user.admin = self.admin.or(user.admin);
        user.suspended = self.suspended.or(user.suspended);
        user.ip_whitelisted = self.ip_whitelisted.or(user.ip_whitelisted);
        user.change_password = self.change_password.or(user.change_password);
    }
}

pub async fn update(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let options = UpdateUser::parse(words)?;
    let (user_name, domain) = user_and_domain(&options.user, ctx.session.domain());

    if options.touches_account() {
        let provisioning = ctx.session.provisioning();
        let mut user = match provisioning.retrieve_user(&domain, &user_name).await {
            Ok(user) => user,
            Err(GamError::Api(err)) if err.is_reason("EntityDoesNotExist") => {
                return Err(GamError::failed(
                    format!("ERROR: {} is not an existing user.", user_name),
                    1,
                )
                .into())
            }
            Err(GamError::Api(err)) => {
                return Err(GamError::failed(
                    format!("ERROR: {} Status Code: {}", err.reason, err.status),
                    1,
                )
                .into())
            }
            Err(err) => return Err(err).context("retrieving user"),
        };
        options.apply(&mut user);
        if let Err(err) = provisioning.update_user(&domain, &user_name, &user).await {
            let message = match err.api() {
                Some(api) if api.is_reason("EntityExists") => format!(
                    "ERROR: {} is an existing user, group or alias. Please delete the existing entity with this name before renaming {}",
                    user.user_name, user_name
                ),
                Some(api) if api.is_reason("UserDeletedRecently") => format!(
                    "ERROR: {} was a user account recently deleted. You'll need to wait 5 days before you can reuse this name.",
                    user.user_name
                ),
                Some(api) => format!("ERROR: {}", api.reason),
                None => return Err(err).context("updating user"),
            };
            return Err(GamError::failed(message, 1).into());
        }
    }

    if let Some(new_name) = &options.new_user_name {
        let primary = ctx.session.domain();
        let old_email = qualify(&options.user, primary);
        let new_email = qualify(new_name, primary);
        debug!("renaming {} to {}", old_email, new_email);
        ctx.session
            .multidomain()
            .rename_user(&old_email, &new_email)
            .await
            .with_context(|| format!("renaming {}", old_email))?;
    }
    Ok(())
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    }
}

pub async fn info(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let supplied = words.require("a user name")?;
    let (mut aliases, mut groups, mut org) = (true, true, true);
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "noaliases" => aliases = false,
            "nogroups" => groups = false,
            "noorg" => org = false,
            other => return Err(unknown_argument(other, "gam info user").into()),
        }
    }

    let (user_name, domain) = user_and_domain(&supplied, ctx.session.domain());
    let user = ctx
        .session
        .provisioning()
        .retrieve_user(&domain, &user_name)
        .await?;
    let email = format!("{}@{}", user.user_name, domain);
    println!("User: {}", email);
    println!("First Name: {}", user.given_name.as_deref().unwrap_or_default());
    println!("Last Name: {}", user.family_name.as_deref().unwrap_or_default());
    println!("Is an admin: {}", yes_no(user.admin));
    println!("Has agreed to terms: {}", yes_no(user.agreed_to_terms));
    println!("IP Whitelisted: {}", yes_no(user.ip_whitelisted));
    println!("Account Suspended: {}", yes_no(user.suspended));
    println!("Must Change Password: {}", yes_no(user.change_password));
    println!("Quota: {}", user.quota.as_deref().unwrap_or_default());

    if org {
        match ctx.session.orgs().org_of_user(&email).await {
            Ok(unit) => println!("Organization: {}", unit.org_unit_path),
            Err(err) => println!("{}", err),
        }
    }
    if aliases {
        println!("Email Aliases (Nicknames):");
        for alias in ctx.session.multidomain().aliases_of(&email).await? {
            println!("  {}", alias.alias);
        }
    }
    if groups {
        println!("Groups:");
        for group in ctx.session.groups().groups_of(&domain, &email).await? {
            let kind = if group.is_true("directMember") {
                "direct"
            } else {
                "indirect"
            };
            println!(
                "  {} <{}> ({} member)",
                group.value("groupName"),
                group.value("groupId"),
                kind
            );
        }
    }
    Ok(())
}

const RENAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Throwaway name so the original one can be reused at once:
/// up to 43 characters of the name, a timestamp and random padding, at most
/// 64 characters in all.
pub fn deleted_user_name(user_name: &str, timestamp: &str) -> String {
    let mut rng = rand::thread_rng();
    let random: String = RENAME_ALPHABET
        .choose_multiple(&mut rng, 25)
        .map(|b| *b as char)
        .collect();
    let prefix: String = user_name.chars().take(43).collect();
    format!("{}-{}-{}", prefix, timestamp, random)
        .chars()
        .take(64)
        .collect()
}

pub async fn delete(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let supplied = words.require("a user name")?;
    let rename = !words.eat("norename");
    let (user_name, domain) = user_and_domain(&supplied, ctx.session.domain());
    let provisioning = ctx.session.provisioning();
    println!("Deleting account for {}@{}", user_name, domain);

    let mut to_delete = user_name.clone();
    if rename {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        let renamed = deleted_user_name(&user_name, &timestamp);
        let mut user = provisioning.retrieve_user(&domain, &user_name).await?;
        user.user_name = renamed.clone();
        provisioning
            .update_user(&domain, &user_name, &user)
            .await
            .with_context(|| format!("renaming {} before deletion", user_name))?;
        println!("Renamed account to: {}@{}", renamed, domain);
        to_delete = renamed;
    }
    provisioning.delete_user(&domain, &to_delete).await?;
    println!("Deleted user {}@{}", to_delete, domain);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_text_password_is_sha1_hashed() {
        let mut words = Words::new([
            "jsmith", "firstname", "John", "lastname", "Smith", "password", "secret",
        ]);
        let options = CreateUser::parse(&mut words).unwrap();
        let entry = options.entry("jsmith");
        assert_eq!(
            entry.password.as_deref(),
            Some("e5e9fa1ba31ecd1ae84f75caaa474f3a663f05f4")
        );
        assert_eq!(entry.hash_function.as_deref(), Some("SHA-1"));
    }

    #[test]
    fn prehashed_password_is_sent_as_is() {
        let mut words = Words::new([
            "jsmith", "firstname", "J", "lastname", "S", "password", "abc123", "MD5", "quota", "2048",
        ]);
        let entry = CreateUser::parse(&mut words).unwrap().entry("jsmith");
        assert_eq!(entry.password.as_deref(), Some("abc123"));
        assert_eq!(entry.hash_function.as_deref(), Some("MD5"));
        assert_eq!(entry.quota.as_deref(), Some("2048"));
    }

    #[test]
    fn create_requires_names_and_password() {
        let mut words = Words::new(["jsmith", "firstname", "John", "password", "x"]);
        assert_eq!(CreateUser::parse(&mut words).unwrap_err().exit_code(), 2);
        let mut words = Words::new(["jsmith", "nickname", "jj"]);
        assert_eq!(CreateUser::parse(&mut words).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn update_toggles_are_strict() {
        let mut words = Words::new(["jsmith", "suspended", "yes"]);
        assert!(UpdateUser::parse(&mut words).is_err());

        let mut words = Words::new(["jsmith", "suspended", "ON", "admin", "off"]);
        let options = UpdateUser::parse(&mut words).unwrap();
        let mut user = UserEntry::new("jsmith");
        user.admin = Some(true);
        options.apply(&mut user);
        assert_eq!(user.suspended, Some(true));
        assert_eq!(user.admin, Some(false));
        assert!(user.password.is_none());
    }

    #[test]
    fn deleted_name_is_bounded() {
        let long = "a".repeat(60);
        let renamed = deleted_user_name(&long, "20261016120000");
        assert_eq!(renamed.len(), 64);
        assert!(renamed.starts_with(&format!("{}-20261016120000-", "a".repeat(43))));

        let short = deleted_user_name("jsmith", "20261016120000");
        assert_eq!(short.len(), "jsmith-20261016120000-".len() + 25);
    }
}
