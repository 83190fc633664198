//! Calendar sharing (`calendar <cal> ...`) and per-user calendar lists.

use anyhow::Result;

use crate::api::calendar::{CalendarOptions, Role, Scope};
use crate::args::{true_false_code, Words};
use crate::command::Context;
use crate::error::GamError;
use crate::validation::user_and_domain;

use super::{print_remote_error, unknown_argument};

fn parse_role(words: &mut Words) -> Result<Role, GamError> {
    let role = words.require_keyword("a role")?;
    Role::parse(&role).ok_or_else(|| {
        GamError::usage_code(
            format!(
                "Error: Role must be freebusy, read, editor or owner. Not {}",
                role
            ),
            33,
        )
    })
}

/// `calendar <cal> showacl|add|update|del|delete ...`
pub async fn acl(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let calendar = words.require("a calendar id")?;
    let api = ctx.session.calendar();
    match words.require_keyword("showacl, add, update or delete")?.as_str() {
        "showacl" => {
            let (title, rules) = api.acl(&calendar).await?;
            println!("{}", title);
            for rule in rules {
                println!("  Scope {} - {}", rule.scope_type, rule.scope_value);
                println!("  Role: {}", rule.role_title);
                println!();
            }
        }
        "add" => {
            let role = parse_role(words)?;
            let user = words.require("a user to share with")?;
            if let Err(err) = api.insert_acl(&calendar, &Scope::User(user), role).await {
                print_remote_error(err)?;
            }
        }
        "update" => {
            let role = parse_role(words)?;
            let who = words.require("user, domain or default")?;
            let scope = match who.to_lowercase().as_str() {
                "domain" => Scope::Domain(ctx.session.domain().to_string()),
                "default" => Scope::Default,
                _ => Scope::User(who),
            };
            if let Err(err) = api.update_acl(&calendar, &scope, role).await {
                print_remote_error(err)?;
            }
        }
        "del" | "delete" => {
            if words.next_keyword().as_deref() != Some("user") {
                return Err(GamError::usage_code("invalid syntax", 9).into());
            }
            let user = words.require("a user")?.to_lowercase();
            let (_, rules) = api.acl(&calendar).await?;
            let matching: Vec<_> = rules
                .iter()
                .filter(|r| r.scope_value.to_lowercase() == user)
                .collect();
            if matching.is_empty() {
                return Err(GamError::failed(
                    "Error: that object does not seem to have access to that calendar",
                    34,
                )
                .into());
            }
            for rule in matching {
                api.delete_acl(rule).await?;
            }
        }
        other => return Err(unknown_argument(other, "gam calendar").into()),
    }
    Ok(())
}

fn user_email(ctx: &Context<'_>, user: &str) -> String {
    let (name, domain) = user_and_domain(user, ctx.session.domain());
    format!("{}@{}", name, domain)
}

pub async fn show_calendars(ctx: &Context<'_>, users: &[String]) -> Result<()> {
    let api = ctx.session.calendar();
    for user in users {
        let (title, calendars) = api.calendars(&user_email(ctx, user)).await?;
        println!("{}", title);
        for calendar in calendars {
            println!("  Name: {}", calendar.title);
            println!("    ID: {}", calendar.short_id());
            println!("    Access Level: {}", calendar.access_level);
            println!("    Timezone: {}", calendar.timezone);
            println!("    Hidden: {}", calendar.hidden);
            println!("    Selected: {}", calendar.selected);
            println!("    Color: {}", calendar.color);
            println!();
        }
    }
    Ok(())
}

pub async fn show_settings(ctx: &Context<'_>, users: &[String]) -> Result<()> {
    let api = ctx.session.calendar();
    for user in users {
        let (title, settings) = match api.settings(&user_email(ctx, user)).await {
            Ok(found) => found,
            Err(GamError::Api(err)) => {
                return Err(GamError::failed(format!("Error: {} - {}", err.reason, err.body), 59).into())
            }
            Err(err) => return Err(err.into()),
        };
        println!("{}", title);
        for (name, value) in settings {
            println!(" {}: {}", name, value);
        }
    }
    Ok(())
}

/// `[selected true|false] [hidden true|false] [color <c>]`; bad booleans exit 4.
pub fn parse_options(words: &mut Words, command: &str) -> Result<CalendarOptions, GamError> {
    let mut options = CalendarOptions::default();
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "selected" => {
                options.selected = Some(true_false_code(&words.value_for("selected")?, "selected", 4)?)
            }
            "hidden" => {
                options.hidden = Some(true_false_code(&words.value_for("hidden")?, "hidden", 4)?)
            }
            "color" => options.color = Some(words.value_for("color")?),
            other => return Err(unknown_argument(other, command)),
        }
    }
    Ok(options)
}

pub async fn add_calendar(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let calendar = words.require("a calendar id")?;
    let options = parse_options(words, "gam <users> add calendar")?;
    let api = ctx.session.calendar();
    for user in users {
        if let Err(err) = api
            .insert_calendar(&user_email(ctx, user), &calendar, &options)
            .await
        {
            print_remote_error(err)?;
        }
    }
    Ok(())
}

pub async fn update_calendar(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let calendar = words.require("a calendar id")?;
    let options = parse_options(words, "gam <users> update calendar")?;
    let api = ctx.session.calendar();
    for user in users {
        let current = match api.calendar(&user_email(ctx, user), &calendar).await {
            Ok(current) => current,
            Err(err) => {
                print_remote_error(err)?;
                continue;
            }
        };
        if let Err(err) = api.update_calendar(&current, &options).await {
            print_remote_error(err)?;
        }
    }
    Ok(())
}

pub async fn delete_calendar(ctx: &Context<'_>, users: &[String], words: &mut Words) -> Result<()> {
    let calendar = words.require("a calendar id")?;
    let api = ctx.session.calendar();
    for user in users {
        let current = match api.calendar(&user_email(ctx, user), &calendar).await {
            Ok(current) => current,
            Err(err) => {
                print_remote_error(err)?;
                continue;
            }
        };
        if let Err(err) = api.delete_calendar(&current).await {
            print_remote_error(err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_options_need_true_or_false() {
        let mut words = Words::new(["selected", "TRUE", "color", "#5A6986"]);
        let options = parse_options(&mut words, "gam add calendar").unwrap();
        assert_eq!(options.selected, Some(true));
        assert_eq!(options.hidden, None);
        assert_eq!(options.color.as_deref(), Some("#5A6986"));

        let mut words = Words::new(["hidden", "on"]);
        assert_eq!(
            parse_options(&mut words, "gam add calendar").unwrap_err().exit_code(),
            4
        );
    }

    #[test]
    fn unknown_role_exits_33() {
        let mut words = Words::new(["writer"]);
        assert_eq!(parse_role(&mut words).unwrap_err().exit_code(), 33);
        let mut words = Words::new(["FreeBusy"]);
        assert_eq!(parse_role(&mut words).unwrap(), Role::FreeBusy);
    }
}
