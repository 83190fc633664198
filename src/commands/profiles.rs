//! Profile sharing and photos for target users.

use anyhow::{Context as _, Result};

use crate::args::Words;
use crate::command::Context;
use crate::error::GamError;
use crate::validation::user_and_domain;

use super::{print_user_error, unknown_argument};

/// `profile share|shared|unshare|unshared`
pub async fn share(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let indexed = match words.require_keyword("share or unshare")?.as_str() {
        "share" | "shared" => true,
        "unshare" | "unshared" => false,
        other => {
            return Err(GamError::usage(format!(
                "Error: profile expects share or unshare, got {}",
                other
            ))
            .into())
        }
    };
    let profiles = ctx.session.profiles();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        let (name, domain) = user_and_domain(user, ctx.session.domain());
        println!(
            "Setting Profile Sharing to {} for {}@{} ({} of {})",
            indexed,
            name,
            domain,
            i + 1,
            count
        );
        if let Err(err) = profiles.set_indexed(&domain, &name, indexed).await {
            print_user_error(&name, &domain, err)?;
        }
    }
    Ok(())
}

pub async fn show(ctx: &Context<'_>, users: &[String]) -> Result<()> {
    let profiles = ctx.session.profiles();
    for user in users {
        let (name, domain) = user_and_domain(user, ctx.session.domain());
        match profiles.profile(&domain, &name).await {
            Ok(profile) => {
                println!("User: {}@{}", name, domain);
                println!(" Profile Shared: {}", profile.indexed.unwrap_or_default());
            }
            Err(err) => print_user_error(&name, &domain, err)?,
        }
    }
    Ok(())
}

/// `update photo <file> [nooverwrite]`
pub async fn update_photo(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let file = words.require("a JPEG file")?;
    let mut overwrite = true;
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "nooverwrite" => overwrite = false,
            other => return Err(unknown_argument(other, "gam <users> update photo").into()),
        }
    }
    let jpeg = std::fs::read(&file).with_context(|| format!("reading {}", file))?;

    let profiles = ctx.session.profiles();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        let (name, domain) = user_and_domain(user, ctx.session.domain());
        let profile = match profiles.profile(&domain, &name).await {
            Ok(profile) => profile,
            Err(err) => {
                print_user_error(&name, &domain, err)?;
                continue;
            }
        };
        if !overwrite && profile.has_photo() {
            println!("Not overwriting existing photo for {}@{}", name, domain);
            continue;
        }
        println!("Updating photo for {}@{} ({} of {})", name, domain, i + 1, count);
        if let Err(err) = profiles.update_photo(&profile, jpeg.clone()).await {
            print_user_error(&name, &domain, err)?;
        }
    }
    Ok(())
}

/// `get photo`, saved as `<user>-<domain>.jpg`.
pub async fn get_photo(ctx: &Context<'_>, users: &[String]) -> Result<()> {
    let profiles = ctx.session.profiles();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        let (name, domain) = user_and_domain(user, ctx.session.domain());
        let profile = match profiles.profile(&domain, &name).await {
            Ok(profile) => profile,
            Err(err) => {
                print_user_error(&name, &domain, err)?;
                continue;
            }
        };
        if !profile.has_photo() {
            println!("  No photo for {}@{}", name, domain);
            continue;
        }
        let file = format!("{}-{}.jpg", name, domain);
        println!(
            "Saving photo for {}@{} to {} ({} of {})",
            name,
            domain,
            file,
            i + 1,
            count
        );
        match profiles.photo(&profile).await {
            Ok(bytes) => std::fs::write(&file, bytes).with_context(|| format!("writing {}", file))?,
            Err(err) => print_user_error(&name, &domain, err)?,
        }
    }
    Ok(())
}

pub async fn delete_photo(ctx: &Context<'_>, users: &[String]) -> Result<()> {
    let profiles = ctx.session.profiles();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        let (name, domain) = user_and_domain(user, ctx.session.domain());
        let profile = match profiles.profile(&domain, &name).await {
            Ok(profile) => profile,
            Err(err) => {
                print_user_error(&name, &domain, err)?;
                continue;
            }
        };
        println!("Deleting photo for {}@{} ({} of {})", name, domain, i + 1, count);
        if let Err(err) = profiles.delete_photo(&profile).await {
            print_user_error(&name, &domain, err)?;
        }
    }
    Ok(())
}
