//! `create|update|info|delete org`, with bulk user moves.
//!
//! The provider accepts at most [`MAX_USERS_PER_MOVE`] users per update and
//! rejects a whole batch when any address in it is unknown. A rejected batch
//! is checked user by user, the bad addresses are dropped and the rest is
//! sent again before moving on.

use anyhow::{Context as _, Result};
use std::path::Path;

use crate::api::orgs::{OrgUpdate, MAX_USERS_PER_MOVE};
use crate::api::Session;
use crate::args::Words;
use crate::command::Context;
use crate::error::{GamError, GamResult};
use crate::validation::{qualify, user_and_domain};

use super::unknown_argument;

/// Lists longer than this are first checked against the OU's current users.
const DEDUPE_THRESHOLD: usize = 50;

const NOT_AUTHORIZED_PREFIX: &str = "You are not authorized to perform operations on the domain ";

/// Why a user was dropped from a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    External,
    Missing,
}

/// The calls a bulk move is made of.
#[allow(async_fn_in_trait)]
pub trait OrgMover {
    async fn move_users(&self, path: &str, update: &OrgUpdate, users: &[String]) -> GamResult<()>;

    /// `Some` when `user` cannot be placed in an OU of this organization.
    async fn check_user(&self, user: &str) -> GamResult<Option<Rejection>>;

    /// Addresses of the users already in `path`.
    async fn ou_members(&self, path: &str) -> GamResult<Vec<String>>;
}

impl OrgMover for Session {
    async fn move_users(&self, path: &str, update: &OrgUpdate, users: &[String]) -> GamResult<()> {
        self.orgs().update_org(path, update, users).await
    }

    async fn check_user(&self, user: &str) -> GamResult<Option<Rejection>> {
        let (name, domain) = user_and_domain(user, self.domain());
        match self.provisioning().retrieve_user(&domain, &name).await {
            Ok(_) => Ok(None),
            Err(GamError::Api(err))
                if err.reason.starts_with(NOT_AUTHORIZED_PREFIX) || err.reason == "Invalid domain." =>
            {
                Ok(Some(Rejection::External))
            }
            Err(GamError::Api(err)) if err.is_reason("EntityDoesNotExist") => {
                Ok(Some(Rejection::Missing))
            }
            Err(GamError::Api(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn ou_members(&self, path: &str) -> GamResult<Vec<String>> {
        Ok(self
            .orgs()
            .org_unit_users(path)
            .await?
            .into_iter()
            .map(|u| u.email)
            .collect())
    }
}

fn names_invalid_users(err: &GamError) -> bool {
    err.api().is_some_and(|api| {
        api.is_reason("EntityDoesNotExist") && api.invalid_input == "orgUnitUsersToMove"
    })
}

/// Sends one batch; on a rejection naming the user list, drops the users
/// that cannot be moved and sends the remainder.
async fn send_batch<M: OrgMover>(
    mover: &M,
    path: &str,
    update: &OrgUpdate,
    batch: Vec<String>,
) -> GamResult<()> {
    let err = match mover.move_users(path, update, &batch).await {
        Ok(()) => return Ok(()),
        Err(err) if names_invalid_users(&err) => err,
        Err(err) => return Err(err),
    };
    tracing::debug!("batch rejected ({}), checking {} users", err, batch.len());

    let mut keep = Vec::with_capacity(batch.len());
    for user in batch {
        match mover.check_user(&user).await? {
            Some(Rejection::External) => println!("not adding external user {}", user),
            Some(Rejection::Missing) => println!("not adding non-existant user {}", user),
            None => keep.push(user),
        }
    }
    if keep.is_empty() && update.is_empty() {
        return Ok(());
    }
    mover.move_users(path, update, &keep).await
}

/// Moves `users` into `path` in batches of [`MAX_USERS_PER_MOVE`]; the last
/// batch carries the attribute changes.
pub async fn move_in_batches<M: OrgMover>(
    mover: &M,
    path: &str,
    users: Vec<String>,
    update: &OrgUpdate,
) -> GamResult<()> {
    let total = users.len();
    let mut remaining = users.into_iter().peekable();
    let mut start = 1;
    loop {
        let batch: Vec<String> = remaining.by_ref().take(MAX_USERS_PER_MOVE).collect();
        if remaining.peek().is_none() {
            if batch.is_empty() {
                if !update.is_empty() {
                    mover.move_users(path, update, &[]).await?;
                }
            } else {
                println!(
                    "Adding users {} to {} and making other updates to org {}",
                    start, total, path
                );
                send_batch(mover, path, update, batch).await?;
            }
            return Ok(());
        }
        println!(
            "Adding users {} to {} out of {} total to org {}",
            start,
            start + MAX_USERS_PER_MOVE - 1,
            total,
            path
        );
        send_batch(mover, path, &OrgUpdate::default(), batch).await?;
        start += MAX_USERS_PER_MOVE;
    }
}

/// Moves `users` into `path`. Long lists are first cut down to the users
/// not already in the OU.
pub async fn move_into_org<M: OrgMover>(
    mover: &M,
    path: &str,
    mut users: Vec<String>,
    update: &OrgUpdate,
) -> GamResult<()> {
    if users.len() > DEDUPE_THRESHOLD {
        println!("got {} users to be added", users.len());
        let already = mover.ou_members(path).await?;
        let before = users.len();
        users.retain(|u| !already.contains(u));
        let dropped = before - users.len();
        if dropped > 0 {
            println!(
                "{} users were already in org {} and won't be re-added",
                dropped, path
            );
        }
    }
    move_in_batches(mover, path, users, update).await
}

pub async fn create(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let name = words.require("an organization name")?;
    let mut description = String::new();
    let mut parent = "/".to_string();
    let mut block_inheritance = false;
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "description" => description = words.value_for("description")?,
            "parent" => parent = words.value_for("parent")?,
            "noinherit" => block_inheritance = true,
            other => return Err(unknown_argument(other, "gam create org").into()),
        }
    }
    ctx.session
        .orgs()
        .create_org(&name, &description, &parent, block_inheritance)
        .await?;
    Ok(())
}

/// Where the users to move come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSource {
    None,
    List(Vec<String>),
    File(String),
    Group(String),
    NotInGroup(String),
}

/// Options of `update org`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrg {
    pub name: String,
    pub source: UserSource,
    pub update: OrgUpdate,
}

impl UpdateOrg {
    pub fn parse(words: &mut Words) -> Result<Self, GamError> {
        let name = words.require("an organization name")?;
        let source = match words.peek_keyword().as_deref() {
            Some("add") => {
                words.next_word();
                let list = words.require("a space separated list of users")?;
                UserSource::List(list.split_whitespace().map(str::to_string).collect())
            }
            Some("fileadd" | "addfile") => {
                words.next_word();
                UserSource::File(words.require("a CSV file name")?)
            }
            Some("groupadd" | "addgroup") => {
                words.next_word();
                UserSource::Group(words.require("a group name")?)
            }
            Some("addnotingroup") => {
                words.next_word();
                UserSource::NotInGroup(words.require("a group name")?)
            }
            _ => UserSource::None,
        };
        let mut update = OrgUpdate::default();
        while let Some(keyword) = words.next_keyword() {
            match keyword.as_str() {
                "name" => update.new_name = Some(words.value_for("name")?),
                "description" => update.description = Some(words.value_for("description")?),
                "parent" => update.parent = Some(words.value_for("parent")?),
                "noinherit" => update.block_inheritance = Some(true),
                "inherit" => update.block_inheritance = Some(false),
                other => return Err(unknown_argument(other, "gam update org")),
            }
        }
        Ok(Self {
            name,
            source,
            update,
        })
    }
}

/// Last column of every row.
fn users_from_csv(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut users = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        if let Some(last) = record.iter().last().filter(|u| !u.is_empty()) {
            users.push(last.to_string());
        }
    }
    Ok(users)
}

async fn group_member_ids(ctx: &Context<'_>, group: &str) -> Result<Vec<String>> {
    let primary = ctx.session.domain();
    Ok(ctx
        .session
        .groups()
        .members(primary, &qualify(group, primary))
        .await?
        .iter()
        .map(|m| m.value("memberId").to_string())
        .collect())
}

pub async fn update(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let options = UpdateOrg::parse(words)?;
    let orgs = ctx.session.orgs();

    let users = match &options.source {
        UserSource::None => Vec::new(),
        UserSource::List(users) => users.clone(),
        UserSource::File(file) => users_from_csv(Path::new(file))?,
        UserSource::Group(group) => group_member_ids(ctx, group).await?,
        UserSource::NotInGroup(group) => {
            println!("Retrieving all users in Google Apps Organization (may take some time)");
            let all = orgs.all_org_users().await?;
            println!("Retrieved {} users", all.len());
            println!("Retrieving all members of {} group (may take some time)", group);
            let members = group_member_ids(ctx, group).await?;
            all.into_iter()
                .map(|u| u.email)
                .filter(|u| !members.contains(u))
                .collect()
        }
    };

    move_into_org(ctx.session, &options.name, users, &options.update)
        .await
        .with_context(|| format!("updating org {}", options.name))?;
    Ok(())
}

pub async fn info(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let name = words.require("an organization name")?;
    let orgs = ctx.session.orgs();
    let unit = orgs.retrieve_org(&name).await?;
    println!("Organization Unit: {}", unit.name);
    println!("Description: {}", unit.description);
    if unit.parent.is_empty() {
        println!("Parent Org: /");
    } else {
        println!("Parent Org: {}", unit.parent);
    }
    println!("Block Inheritance: {}", unit.block_inheritance);
    println!("Users: ");
    for user in orgs.org_unit_users(&name).await? {
        println!(" {}", user.email);
    }
    Ok(())
}

pub async fn delete(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let name = words.require("an organization name")?;
    match ctx.session.orgs().delete_org(&name).await {
        Ok(()) => Ok(()),
        Err(GamError::Api(err)) => {
            let message = if err.is_reason("EntityHasMembersCannotDelete") {
                "Not Deleted. You must remove all users from an organization unit before deleting it."
                    .to_string()
            } else if err.is_reason("EntityDoesNotExist") {
                "That Organization Unit does not exist.".to_string()
            } else {
                err.reason
            };
            Err(GamError::failed(message, 1).into())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::Mutex;

    /// Records every move; rejects batches containing a user in `reject`.
    struct FakeMover {
        calls: Mutex<Vec<(Vec<String>, OrgUpdate)>>,
        reject: Vec<&'static str>,
        members: Vec<String>,
        member_lookups: Mutex<usize>,
    }

    impl FakeMover {
        fn new(reject: Vec<&'static str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reject,
                members: Vec::new(),
                member_lookups: Mutex::new(0),
            }
        }

        fn with_members(mut self, members: Vec<String>) -> Self {
            self.members = members;
            self
        }

        fn calls(&self) -> Vec<(Vec<String>, OrgUpdate)> {
            self.calls.lock().unwrap().clone()
        }

        fn rejects(&self, user: &str) -> bool {
            self.reject.iter().any(|r| *r == user)
        }
    }

    impl OrgMover for FakeMover {
        async fn move_users(&self, _path: &str, update: &OrgUpdate, users: &[String]) -> GamResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((users.to_vec(), update.clone()));
            if users.iter().any(|u| self.rejects(u)) {
                let mut err = ApiError::new(400, "EntityDoesNotExist");
                err.invalid_input = "orgUnitUsersToMove".into();
                return Err(err.into());
            }
            Ok(())
        }

        async fn check_user(&self, user: &str) -> GamResult<Option<Rejection>> {
            Ok(match user {
                u if u.ends_with("@elsewhere.org") => Some(Rejection::External),
                u if self.rejects(u) => Some(Rejection::Missing),
                _ => None,
            })
        }

        async fn ou_members(&self, _path: &str) -> GamResult<Vec<String>> {
            *self.member_lookups.lock().unwrap() += 1;
            Ok(self.members.clone())
        }
    }

    fn users(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("user{}", i)).collect()
    }

    #[tokio::test]
    async fn batches_hold_at_most_twenty() {
        let mover = FakeMover::new(vec![]);
        let update = OrgUpdate {
            description: Some("Sales".into()),
            ..OrgUpdate::default()
        };
        move_in_batches(&mover, "/Sales", users(45), &update).await.unwrap();

        let calls = mover.calls();
        let sizes: Vec<usize> = calls.iter().map(|(u, _)| u.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert!(calls[0].1.is_empty());
        assert!(calls[1].1.is_empty());
        assert_eq!(calls[2].1, update);
    }

    #[tokio::test]
    async fn exact_multiple_sends_updates_with_last_batch() {
        let mover = FakeMover::new(vec![]);
        let update = OrgUpdate {
            block_inheritance: Some(true),
            ..OrgUpdate::default()
        };
        move_in_batches(&mover, "/Sales", users(40), &update).await.unwrap();
        let calls = mover.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0.len(), 20);
        assert_eq!(calls[1].1, update);
    }

    #[tokio::test]
    async fn rejected_batch_is_cleaned_and_resumed() {
        let mut list = users(25);
        list[3] = "ghost".into();
        list[7] = "someone@elsewhere.org".into();
        let mover = FakeMover::new(vec!["ghost", "someone@elsewhere.org"]);
        move_in_batches(&mover, "/Sales", list, &OrgUpdate::default())
            .await
            .unwrap();

        let calls = mover.calls();
        let sizes: Vec<usize> = calls.iter().map(|(u, _)| u.len()).collect();
        assert_eq!(sizes, vec![20, 18, 5]);
        assert!(!calls[1].0.iter().any(|u| u == "ghost"));
        assert_eq!(calls[2].0[0], "user21");
    }

    #[tokio::test]
    async fn other_errors_stop_the_move() {
        struct Failing;
        impl OrgMover for Failing {
            async fn move_users(&self, _: &str, _: &OrgUpdate, _: &[String]) -> GamResult<()> {
                Err(ApiError::new(403, "Forbidden").into())
            }
            async fn check_user(&self, _: &str) -> GamResult<Option<Rejection>> {
                Ok(None)
            }
            async fn ou_members(&self, _: &str) -> GamResult<Vec<String>> {
                Ok(Vec::new())
            }
        }
        let err = move_in_batches(&Failing, "/", users(3), &OrgUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.api().map(|e| e.reason.as_str()), Some("Forbidden"));
    }

    #[tokio::test]
    async fn long_lists_skip_users_already_in_the_org() {
        let current = vec!["user2".to_string(), "user30".to_string(), "user55".to_string()];
        let mover = FakeMover::new(vec![]).with_members(current.clone());
        move_into_org(&mover, "/Sales", users(55), &OrgUpdate::default())
            .await
            .unwrap();

        assert_eq!(*mover.member_lookups.lock().unwrap(), 1);
        let sent: Vec<String> = mover.calls().into_iter().flat_map(|(u, _)| u).collect();
        assert_eq!(sent.len(), 52);
        assert!(!sent.iter().any(|u| current.contains(u)));
        let sizes: Vec<usize> = mover.calls().iter().map(|(u, _)| u.len()).collect();
        assert_eq!(sizes, vec![20, 20, 12]);
    }

    #[tokio::test]
    async fn short_lists_are_sent_without_a_membership_lookup() {
        let mover = FakeMover::new(vec![]).with_members(vec!["user2".to_string()]);
        move_into_org(&mover, "/Sales", users(50), &OrgUpdate::default())
            .await
            .unwrap();

        assert_eq!(*mover.member_lookups.lock().unwrap(), 0);
        let sent: Vec<String> = mover.calls().into_iter().flat_map(|(u, _)| u).collect();
        assert_eq!(sent.len(), 50);
        assert!(sent.contains(&"user2".to_string()));
    }

    #[test]
    fn update_options_parse_source_then_attributes() {
        let mut words = Words::new(["/Sales", "add", "a b  c", "description", "East", "noinherit"]);
        let options = UpdateOrg::parse(&mut words).unwrap();
        assert_eq!(
            options.source,
            UserSource::List(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(options.update.description.as_deref(), Some("East"));
        assert_eq!(options.update.block_inheritance, Some(true));

        let mut words = Words::new(["/Sales", "colour", "red"]);
        assert_eq!(UpdateOrg::parse(&mut words).unwrap_err().exit_code(), 2);
    }
}
