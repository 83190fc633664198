//! Mail settings of target users: IMAP/POP, send-as, labels, filters,
//! forwarding, signature, vacation, general options and delegation.
//!
//! Updates print "(i of n)" progress; reads print one block per user.

use std::time::Duration;

use anyhow::Result;
use rand::seq::SliceRandom;

use crate::api::emailsettings::{Filter, General, Vacation};
use crate::args::{on_off, Words};
use crate::command::Context;
use crate::error::GamError;
use crate::sanitize::expand_newlines;
use crate::validation::{split_address, user_and_domain};

use super::{has_agreed_to_terms, unknown_argument};

/// Which mail access is being enabled, for the terms-of-service warning.
#[derive(Debug, Clone, Copy)]
enum Access {
    Imap,
    Pop,
    Forwarding,
}

impl Access {
    fn label(self) -> &'static str {
        match self {
            Self::Imap => "IMAP",
            Self::Pop => "POP",
            Self::Forwarding => "Forwarding",
        }
    }
}

/// Warns when `user` has not accepted the mail terms yet.
async fn warn_terms(ctx: &Context<'_>, user: &str, access: Access) -> Result<()> {
    if !has_agreed_to_terms(ctx, user).await? {
        let label = access.label();
        println!(
            " Warning: {} has been enabled but {} has not logged into GMail to agree to the terms of service (captcha).  {} will not work until they do.",
            label, user, label
        );
    }
    Ok(())
}

fn mailbox(ctx: &Context<'_>, user: &str) -> (String, String) {
    user_and_domain(user, ctx.session.domain())
}

pub async fn imap(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let enable = on_off(&words.require("on or off")?, "imap")?;
    let confirm = !words.eat("noconfirm");
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!("Setting IMAP Access to {} for {} ({} of {})", enable, user, i + 1, count);
        if enable && confirm {
            warn_terms(ctx, user, Access::Imap).await?;
        }
        let (name, domain) = mailbox(ctx, user);
        settings.update_imap(&domain, &name, enable).await?;
    }
    Ok(())
}

/// `on|off [for allmail|newmail] [action keep|archive|delete] [noconfirm]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopOptions {
    pub enable: bool,
    pub enable_for: Option<&'static str>,
    pub action: Option<&'static str>,
    pub confirm: bool,
}

impl PopOptions {
    pub fn parse(words: &mut Words) -> Result<Self, GamError> {
        let mut options = Self {
            enable: on_off(&words.require("on or off")?, "pop")?,
            enable_for: None,
            action: None,
            confirm: true,
        };
        while let Some(keyword) = words.next_keyword() {
            match keyword.as_str() {
                "for" => {
                    options.enable_for = Some(match words.require_keyword("allmail or newmail")?.as_str() {
                        "allmail" => "ALL_MAIL",
                        "newmail" => "MAIL_FROM_NOW_ON",
                        other => return Err(unknown_argument(other, "gam <users> pop ... for")),
                    })
                }
                "action" => {
                    options.action = Some(mail_action(&words.require_keyword("keep, archive or delete")?)?)
                }
                "noconfirm" => options.confirm = false,
                other => return Err(unknown_argument(other, "gam <users> pop")),
            }
        }
        Ok(options)
    }
}

fn mail_action(word: &str) -> Result<&'static str, GamError> {
    match word {
        "keep" => Ok("KEEP"),
        "archive" => Ok("ARCHIVE"),
        "delete" => Ok("DELETE"),
        other => Err(unknown_argument(other, "mail action")),
    }
}

pub async fn pop(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let options = PopOptions::parse(words)?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!(
            "Setting POP Access to {} for {} ({} of {})",
            options.enable,
            user,
            i + 1,
            count
        );
        if options.enable && options.confirm {
            warn_terms(ctx, user, Access::Pop).await?;
        }
        let (name, domain) = mailbox(ctx, user);
        settings
            .update_pop(&domain, &name, options.enable, options.enable_for, options.action)
            .await?;
    }
    Ok(())
}

/// `sendas <address> <name> [default] [replyto <addr>]`
pub async fn send_as(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let mut address = words.require("a send-as address")?;
    let display_name = words.require("a send-as name")?;
    let mut make_default = false;
    let mut reply_to = None;
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "default" => make_default = true,
            "replyto" => reply_to = Some(words.value_for("replyto")?),
            other => return Err(unknown_argument(other, "gam <users> sendas").into()),
        }
    }
    if !address.contains('@') {
        address = format!("{}@{}", address, ctx.session.domain());
    }
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!("Allowing {} to send as {} ({} of {})", user, address, i + 1, count);
        let (name, domain) = mailbox(ctx, user);
        settings
            .create_send_as(
                &domain,
                &name,
                &display_name,
                &address,
                reply_to.as_deref(),
                make_default,
            )
            .await?;
    }
    Ok(())
}

pub async fn language(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let language = words.require("a language code")?.to_lowercase();
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!(
            "Setting the language for {} to {} ({} of {})",
            user,
            language,
            i + 1,
            count
        );
        let (name, domain) = mailbox(ctx, user);
        settings.update_language(&domain, &name, &language).await?;
    }
    Ok(())
}

/// Options of the general settings page that share one update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralOption {
    Utf,
    PageSize,
    Shortcuts,
    Arrows,
    Snippets,
}

impl GeneralOption {
    fn label(self) -> &'static str {
        match self {
            Self::Utf => "UTF-8",
            Self::PageSize => "Page Size",
            Self::Shortcuts => "Keyboard Short Cuts",
            Self::Arrows => "Personal Indicator Arrows",
            Self::Snippets => "Preview Snippets",
        }
    }

    /// Reads the option's value into a general settings update.
    pub fn parse(self, words: &mut Words) -> Result<(General, String), GamError> {
        let mut general = General::default();
        let shown = match self {
            Self::PageSize => {
                let size = words.require("25, 50 or 100")?;
                if !matches!(size.as_str(), "25" | "50" | "100") {
                    return Err(GamError::usage(format!(
                        "Error: page size must be 25, 50 or 100, got {}",
                        size
                    )));
                }
                general.page_size = Some(size.clone());
                size
            }
            _ => {
                let value = on_off(&words.require("on or off")?, self.label())?;
                match self {
                    Self::Utf => general.unicode = Some(value),
                    Self::Shortcuts => general.shortcuts = Some(value),
                    Self::Arrows => general.arrows = Some(value),
                    _ => general.snippets = Some(value),
                }
                value.to_string()
            }
        };
        Ok((general, shown))
    }
}

pub async fn general(
    ctx: &Context<'_>,
    users: &[String],
    words: &mut Words,
    option: GeneralOption,
) -> Result<()> {
    let (general, shown) = option.parse(words)?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!(
            "Setting {} to {} for {} ({} of {})",
            option.label(),
            shown,
            user,
            i + 1,
            count
        );
        let (name, domain) = mailbox(ctx, user);
        settings.update_general(&domain, &name, &general).await?;
    }
    Ok(())
}

pub async fn label(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let label = words.require("a label name")?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!("Creating label {} for {} ({} of {})", label, user, i + 1, count);
        let (name, domain) = mailbox(ctx, user);
        settings.create_label(&domain, &name, &label).await?;
    }
    Ok(())
}

/// Failures are reported per user and the loop goes on.
pub async fn delete_label(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let label = words.require("a label name")?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!("Deleting label {} for {} ({} of {})", label, user, i + 1, count);
        let (name, domain) = mailbox(ctx, user);
        if let Err(err) = settings.delete_label(&domain, &name, &label).await {
            super::print_remote_error(err)?;
        }
    }
    Ok(())
}

pub async fn show_labels(ctx: &Context<'_>, users: &[String]) -> Result<()> {
    let settings = ctx.session.email_settings();
    for user in users {
        println!("{} has the following labels:", user);
        let (name, domain) = mailbox(ctx, user);
        for label in settings.labels(&domain, &name).await? {
            println!(
                " {}  Unread:{}  Visibility:{}",
                label.value("label"),
                label.value("unreadCount"),
                label.value("visibility")
            );
        }
        println!();
    }
    Ok(())
}

/// Conditions first, then actions; at least one of each.
pub fn parse_filter(words: &mut Words) -> Result<Filter, GamError> {
    let mut filter = Filter::default();
    while let Some(keyword) = words.peek_keyword() {
        match keyword.as_str() {
            "from" | "to" | "subject" | "haswords" | "nowords" => {
                words.next_word();
                let value = Some(words.value_for(&keyword)?);
                match keyword.as_str() {
                    "from" => filter.from = value,
                    "to" => filter.to = value,
                    "subject" => filter.subject = value,
                    "haswords" => filter.has_words = value,
                    _ => filter.no_words = value,
                }
            }
            "musthaveattachment" => {
                words.next_word();
                filter.has_attachment = true;
            }
            _ => break,
        }
    }
    if !filter.has_condition() {
        return Err(GamError::usage("Error: a filter needs at least one condition"));
    }
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "label" => filter.label = Some(words.value_for("label")?),
            "markread" => filter.mark_read = true,
            "archive" => filter.archive = true,
            "star" => filter.star = true,
            "forward" => filter.forward_to = Some(words.value_for("forward")?),
            "trash" => filter.trash = true,
            "neverspam" => filter.never_spam = true,
            other => return Err(unknown_argument(other, "gam <users> filter")),
        }
    }
    if !filter.has_action() {
        return Err(GamError::usage("Error: a filter needs at least one action"));
    }
    Ok(filter)
}

pub async fn filter(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let filter = parse_filter(words)?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!("Creating filter for {} ({} of {})", user, i + 1, count);
        let (name, domain) = mailbox(ctx, user);
        settings.create_filter(&domain, &name, &filter).await?;
    }
    Ok(())
}

/// `forward on|off [keep|archive|delete] [<address>] [noconfirm]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOptions {
    pub enable: bool,
    pub action: Option<&'static str>,
    pub forward_to: Option<String>,
    pub confirm: bool,
}

impl ForwardOptions {
    pub fn parse(words: &mut Words) -> Result<Self, GamError> {
        let mut options = Self {
            enable: on_off(&words.require("on or off")?, "forward")?,
            action: None,
            forward_to: None,
            confirm: true,
        };
        while let Some(word) = words.next_word() {
            match word.to_lowercase().as_str() {
                "keep" | "archive" | "delete" => {
                    options.action = Some(mail_action(&word.to_lowercase())?)
                }
                "noconfirm" => options.confirm = false,
                _ if word.contains('@') => options.forward_to = Some(word),
                other => return Err(unknown_argument(other, "gam <users> forward")),
            }
        }
        if options.enable && (options.action.is_none() || options.forward_to.is_none()) {
            return Err(GamError::usage(
                "Error: forward on needs both an action (keep, archive or delete) and an address",
            ));
        }
        Ok(options)
    }
}

pub async fn forward(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let options = ForwardOptions::parse(words)?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    let state = if options.enable { "on" } else { "off" };
    for (i, user) in users.iter().enumerate() {
        println!(
            "Turning forward {} for {}, emails will be {} ({} of {})",
            state,
            user,
            options.action.unwrap_or("None"),
            i + 1,
            count
        );
        if options.enable && options.confirm {
            warn_terms(ctx, user, Access::Forwarding).await?;
        }
        let (name, domain) = mailbox(ctx, user);
        settings
            .update_forwarding(
                &domain,
                &name,
                options.enable,
                options.forward_to.as_deref(),
                options.action,
            )
            .await?;
    }
    Ok(())
}

pub async fn signature(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let signature = expand_newlines(&words.require("the signature text")?);
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!("Setting Signature for {} ({} of {})", user, i + 1, count);
        let (name, domain) = mailbox(ctx, user);
        settings.update_signature(&domain, &name, &signature).await?;
    }
    Ok(())
}

pub async fn web_clips(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let word = words.require("on or off")?;
    let enable = on_off(&word, "webclips")?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!(
            "Turning Web Clips {} for {} ({} of {})",
            word.to_lowercase(),
            user,
            i + 1,
            count
        );
        let (name, domain) = mailbox(ctx, user);
        settings.update_web_clips(&domain, &name, enable).await?;
    }
    Ok(())
}

/// `vacation on|off [subject <s>] [message <m>] [contactsonly] [domainonly]
/// [startdate <d>] [enddate <d>]`
pub fn parse_vacation(words: &mut Words) -> Result<Vacation, GamError> {
    let mut vacation = Vacation {
        enable: on_off(&words.require("on or off")?, "vacation")?,
        ..Vacation::default()
    };
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "subject" => vacation.subject = words.value_for("subject")?,
            "message" => vacation.message = expand_newlines(&words.value_for("message")?),
            "contactsonly" => vacation.contacts_only = true,
            "domainonly" => vacation.domain_only = true,
            "startdate" => vacation.start_date = Some(words.value_for("startdate")?),
            "enddate" => vacation.end_date = Some(words.value_for("enddate")?),
            other => return Err(unknown_argument(other, "gam <users> vacation")),
        }
    }
    Ok(vacation)
}

pub async fn vacation(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let vacation = parse_vacation(words)?;
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!("Setting Vacation for {} ({} of {})", user, i + 1, count);
        let (name, domain) = mailbox(ctx, user);
        settings.update_vacation(&domain, &name, &vacation).await?;
    }
    Ok(())
}

/// The `show` forms of the single-entry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown {
    SendAs,
    Signature,
    Forward,
    Pop,
    Imap,
    Vacation,
}

pub async fn show(ctx: &Context<'_>, users: &[String], what: Shown) -> Result<()> {
    let settings = ctx.session.email_settings();
    for user in users {
        let (name, domain) = mailbox(ctx, user);
        match what {
            Shown::SendAs => {
                println!("{} has the following send as aliases:", user);
                for entry in settings.send_as(&domain, &name).await? {
                    let reply_to = match entry.get("replyTo").filter(|r| !r.is_empty()) {
                        Some(reply_to) => format!(" Reply To:<{}>", reply_to),
                        None => String::new(),
                    };
                    let yes_no = |key: &str| if entry.is_true(key) { "yes" } else { "no" };
                    println!(
                        " \"{}\" <{}>{} Default:{} Verified:{}",
                        entry.value("name"),
                        entry.value("address"),
                        reply_to,
                        yes_no("isDefault"),
                        yes_no("verified")
                    );
                }
                println!();
            }
            Shown::Signature => {
                let entry = settings.signature(&domain, &name).await?;
                println!("User {}:  Signature: {}", name, entry.value("signature"));
            }
            Shown::Forward => {
                let entry = settings.forwarding(&domain, &name).await?;
                println!(
                    "User {}:  Forward To:{}  Enabled:{}  Action:{}",
                    name,
                    entry.value("forwardTo"),
                    entry.value("enable"),
                    entry.value("action")
                );
            }
            Shown::Pop => {
                let entry = settings.pop(&domain, &name).await?;
                println!(
                    "User {}  POP Enabled:{}  Action:{}",
                    name,
                    entry.value("enable"),
                    entry.value("action")
                );
            }
            Shown::Imap => {
                let entry = settings.imap(&domain, &name).await?;
                println!("User {}  IMAP Enabled:{}", name, entry.value("enable"));
            }
            Shown::Vacation => {
                let entry = settings.vacation(&domain, &name).await?;
                println!("User {}", name);
                println!(" Enabled: {}", entry.value("enable"));
                println!(" Contacts Only: {}", entry.value("contactsOnly"));
                println!(" Domain Only: {}", entry.value("domainOnly"));
                println!(" Subject: {}", entry.value("subject"));
                println!(" Message: {}", entry.value("message"));
                println!(" Start Date: {}", entry.value("startDate"));
                println!(" End Date: {}", entry.value("endDate"));
                println!();
            }
        }
    }
    Ok(())
}

const ALIAS_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Ten distinct random characters, used as a throwaway alias name.
fn temporary_alias_name() -> String {
    let mut rng = rand::thread_rng();
    ALIAS_ALPHABET
        .choose_multiple(&mut rng, 10)
        .map(|&b| b as char)
        .collect()
}

/// `delegate to <user>`.
///
/// A delegate in another domain is addressed through an alias in the
/// delegator's domain: an existing one if there is one, else a temporary
/// alias that is removed once the delegation exists.
pub async fn delegate(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    if words.next_keyword().as_deref() != Some("to") {
        return Err(GamError::usage_code("Error: expected delegate to <user>", 6).into());
    }
    let delegate = words.require("a delegate")?.to_lowercase();
    let (delegate_name, delegate_domain) = user_and_domain(&delegate, ctx.session.domain());
    let delegate_email = format!("{}@{}", delegate_name, delegate_domain);

    let settings = ctx.session.email_settings();
    let multi = ctx.session.multidomain();
    let count = users.len();
    for (i, delegator) in users.iter().enumerate() {
        let (delegator_name, delegator_domain) = user_and_domain(delegator, ctx.session.domain());
        let delegator_domain = delegator_domain.to_lowercase();
        println!(
            "Giving {} delegate access to {}@{} ({} of {})",
            delegate_email,
            delegator_name,
            delegator_domain,
            i + 1,
            count
        );

        let mut temporary = None;
        let address = if delegate_domain == delegator_domain {
            delegate_email.clone()
        } else {
            let existing = multi
                .aliases_of(&delegate_email)
                .await?
                .into_iter()
                .map(|a| a.alias)
                .find(|alias| {
                    split_address(alias)
                        .1
                        .is_some_and(|d| d.eq_ignore_ascii_case(&delegator_domain))
                });
            match existing {
                Some(alias) => {
                    println!("  Using existing alias {} for delegation", alias);
                    alias
                }
                None => {
                    let alias = format!("{}@{}", temporary_alias_name(), delegator_domain);
                    println!(
                        "  Giving {} temporary alias {} for delegation",
                        delegate_email, alias
                    );
                    multi.create_alias(&delegate_email, &alias).await?;
                    // The new alias is not usable for delegation right away.
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    temporary = Some(alias.clone());
                    alias
                }
            }
        };

        let created = settings
            .create_delegate(&delegator_domain, &delegator_name, &address)
            .await;
        if let Some(alias) = temporary {
            tokio::time::sleep(Duration::from_secs(10)).await;
            println!("  Deleting temporary alias...");
            multi.delete_alias(&alias).await?;
        }
        created?;
    }
    Ok(())
}

/// `show delegates [csv]`
pub async fn show_delegates(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let csv = words.eat("csv");
    let settings = ctx.session.email_settings();
    for user in users {
        let (name, domain) = mailbox(ctx, user);
        eprintln!("Getting delegates for {}@{}...", name, domain);
        let delegates = match settings.delegates(&domain, &name).await {
            Ok(delegates) => delegates,
            Err(GamError::Api(err)) => {
                eprintln!("{}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        for delegate in delegates {
            if csv {
                println!(
                    "{}@{},{},{}",
                    name,
                    domain,
                    delegate.value("address"),
                    delegate.value("status")
                );
            } else {
                println!("Delegator: {}", name);
                println!(" Delegate: {}", delegate.value("delegate"));
                println!(" Status: {}", delegate.value("status"));
                println!(" Delegate Email: {}", delegate.value("address"));
                println!(" Delegate ID: {}", delegate.value("delegationId"));
                println!();
            }
        }
    }
    Ok(())
}

/// `delete delegate <user>`; a bare name takes the first user's domain.
pub async fn delete_delegate(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let mut delegate = words.require("a delegate")?;
    if !delegate.contains('@') {
        let first = users.first().map(String::as_str).unwrap_or_default();
        let (_, domain) = mailbox(ctx, first);
        delegate = format!("{}@{}", delegate, domain);
    }
    let settings = ctx.session.email_settings();
    let count = users.len();
    for (i, user) in users.iter().enumerate() {
        println!(
            "Deleting {} delegate access to {} ({} of {})",
            delegate,
            user,
            i + 1,
            count
        );
        let (name, domain) = mailbox(ctx, user);
        settings.delete_delegate(&domain, &name, &delegate).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_needs_condition_and_action() {
        let mut words = Words::new(["from", "boss@example.com", "musthaveattachment", "label", "Boss", "star"]);
        let filter = parse_filter(&mut words).unwrap();
        assert_eq!(filter.from.as_deref(), Some("boss@example.com"));
        assert!(filter.has_attachment);
        assert_eq!(filter.label.as_deref(), Some("Boss"));
        assert!(filter.star);

        let mut words = Words::new(["label", "Boss"]);
        assert_eq!(parse_filter(&mut words).unwrap_err().exit_code(), 2);
        let mut words = Words::new(["subject", "hello"]);
        assert_eq!(parse_filter(&mut words).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn forwarding_on_requires_action_and_address() {
        let mut words = Words::new(["on", "archive", "jane@example.org", "noconfirm"]);
        let options = ForwardOptions::parse(&mut words).unwrap();
        assert_eq!(options.action, Some("ARCHIVE"));
        assert_eq!(options.forward_to.as_deref(), Some("jane@example.org"));
        assert!(!options.confirm);

        let mut words = Words::new(["on", "keep"]);
        assert!(ForwardOptions::parse(&mut words).is_err());
        let mut words = Words::new(["off"]);
        assert!(!ForwardOptions::parse(&mut words).unwrap().enable);
        let mut words = Words::new(["yes", "keep"]);
        assert!(ForwardOptions::parse(&mut words).is_err());
    }

    #[test]
    fn pop_maps_choices_to_provider_values() {
        let mut words = Words::new(["on", "for", "newmail", "action", "Delete"]);
        let options = PopOptions::parse(&mut words).unwrap();
        assert_eq!(options.enable_for, Some("MAIL_FROM_NOW_ON"));
        assert_eq!(options.action, Some("DELETE"));
        let mut words = Words::new(["true"]);
        assert!(PopOptions::parse(&mut words).is_err());
    }

    #[test]
    fn vacation_message_newlines_are_expanded() {
        let mut words = Words::new(["on", "subject", "Away", "message", "Back Monday\\nThanks", "domainonly"]);
        let vacation = parse_vacation(&mut words).unwrap();
        assert!(vacation.enable);
        assert_eq!(vacation.message, "Back Monday\nThanks");
        assert!(vacation.domain_only);
    }

    #[test]
    fn page_size_is_restricted() {
        let mut words = Words::new(["50"]);
        let (general, shown) = GeneralOption::PageSize.parse(&mut words).unwrap();
        assert_eq!(general.page_size.as_deref(), Some("50"));
        assert_eq!(shown, "50");
        let mut words = Words::new(["75"]);
        assert!(GeneralOption::PageSize.parse(&mut words).is_err());
        let mut words = Words::new(["off"]);
        let (general, _) = GeneralOption::Snippets.parse(&mut words).unwrap();
        assert_eq!(general.snippets, Some(false));
    }

    #[test]
    fn temporary_alias_has_ten_distinct_characters() {
        let alias = temporary_alias_name();
        assert_eq!(alias.len(), 10);
        let mut chars: Vec<char> = alias.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), 10);
    }
}
