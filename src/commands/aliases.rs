//! Aliases (`alias`/`nickname`) and the `multi` commands.

use anyhow::Result;

use crate::args::Words;
use crate::command::Context;
use crate::error::GamError;
use crate::validation::qualify;

/// `<alias> user <user>`, both qualified with the primary domain.
fn alias_and_user(ctx: &Context<'_>, words: &mut Words) -> Result<(String, String), GamError> {
    let alias = words.require("an alias")?;
    if words.require_keyword("user")? != "user" {
        return Err(GamError::usage("Error: expected user <user name> after the alias"));
    }
    let user = words.require("a user name")?;
    let domain = ctx.session.domain();
    Ok((qualify(&alias, domain), qualify(&user, domain)))
}

pub async fn create(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (alias, user) = alias_and_user(ctx, words)?;
    println!("Creating alias {} for user {}", alias, user);
    ctx.session.multidomain().create_alias(&user, &alias).await?;
    Ok(())
}

/// Points an existing alias at another user.
pub async fn update(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (alias, user) = alias_and_user(ctx, words)?;
    let multi = ctx.session.multidomain();
    multi.delete_alias(&alias).await?;
    multi.create_alias(&user, &alias).await?;
    Ok(())
}

pub async fn info(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let alias = qualify(&words.require("an alias")?, ctx.session.domain());
    let found = ctx.session.multidomain().retrieve_alias(&alias).await?;
    println!(" Alias Email: {}", found.alias);
    println!(" User Email: {}", found.user);
    Ok(())
}

pub async fn delete(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let alias = qualify(&words.require("an alias")?, ctx.session.domain());
    ctx.session.multidomain().delete_alias(&alias).await?;
    Ok(())
}

/// `multi move <old> <new>` and `multi alias create|info|delete`.
pub async fn multi(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let multi = ctx.session.multidomain();
    match words.require_keyword("move or alias")?.as_str() {
        "move" => {
            let old_email = words.require("the current address")?.to_lowercase();
            let new_email = words.require("the new address")?.to_lowercase();
            multi.rename_user(&old_email, &new_email).await?;
        }
        "alias" => {
            let action = words.require_keyword("create, info or delete")?;
            let alias = words.require("an alias address")?.to_lowercase();
            match action.as_str() {
                "create" => {
                    let user = words.require("a user address")?.to_lowercase();
                    println!("Creating alias {} for user {}", alias, user);
                    multi.create_alias(&user, &alias).await?;
                }
                "info" => {
                    let found = multi.retrieve_alias(&alias).await?;
                    println!();
                    println!(" Alias: {}", found.alias);
                    println!(" User: {}", found.user);
                }
                "delete" => multi.delete_alias(&alias).await?,
                other => {
                    return Err(GamError::usage(format!(
                        "Error: multi alias expects create, info or delete, got {}",
                        other
                    ))
                    .into())
                }
            }
        }
        other => {
            return Err(GamError::usage(format!(
                "Error: multi expects move or alias, got {}",
                other
            ))
            .into())
        }
    }
    Ok(())
}
