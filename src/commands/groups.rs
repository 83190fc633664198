//! `create|update|info|delete group`, including the group settings API.

use anyhow::{Context as _, Result};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::api::groups::{EmailPermission, GroupInfo};
use crate::api::groupsettings::SettingsMap;
use crate::args::Words;
use crate::command::Context;
use crate::error::GamError;
use crate::validation::qualify;

use super::unknown_argument;

fn permission(value: &str) -> Result<EmailPermission, GamError> {
    EmailPermission::parse(value).ok_or_else(|| {
        GamError::usage(format!(
            "Error: permission must be owner, member, domain or anyone. Got {}",
            value
        ))
    })
}

/// `(group address, feed domain)` for a group name as typed. Group feeds
/// live under the primary domain, whatever domain the group address has.
fn group_address(group: &str, primary: &str) -> (String, String) {
    (qualify(group, primary), primary.to_string())
}

pub async fn create(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let group = words.require("a group name")?;
    let (mut name, mut description, mut perm) = (None, None, None);
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "name" => name = Some(words.value_for("name")?),
            "description" => description = Some(words.value_for("description")?),
            "permission" => perm = Some(permission(&words.value_for("permission")?)?),
            other => return Err(unknown_argument(other, "gam create group").into()),
        }
    }
    let (Some(name), Some(description), Some(perm)) = (name, description, perm) else {
        return Err(GamError::usage(
            "Error: name, description and permission are required to create a group",
        )
        .into());
    };
    let (address, domain) = group_address(&group, ctx.session.domain());
    let info = GroupInfo {
        id: address,
        name,
        description,
        permission: perm.as_str().to_string(),
    };
    ctx.session.groups().create_group(&domain, &info).await?;
    Ok(())
}

/// How a group setting value is checked and encoded.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Boolean,
    Text,
    /// Upper-cased and checked against the allowed values.
    Choice(&'static [&'static str]),
    /// A byte count with an optional `M`, `K` or `B` suffix.
    Bytes,
}

const WHO_CAN_VIEW: &[&str] = &[
    "ALL_IN_DOMAIN_CAN_VIEW",
    "ALL_MANAGERS_CAN_VIEW",
    "ALL_MEMBERS_CAN_VIEW",
    "ANYONE_CAN_VIEW",
];

/// Command-line key, API key and value kind of every group setting.
const SETTINGS: &[(&str, &str, Kind)] = &[
    ("allow_external_members", "allowExternalMembers", Kind::Boolean),
    ("allow_google_communication", "allowGoogleCommunication", Kind::Boolean),
    ("allow_web_posting", "allowWebPosting", Kind::Boolean),
    ("archive_only", "archiveOnly", Kind::Boolean),
    ("custom_reply_to", "customReplyTo", Kind::Text),
    ("default_message_deny_notification_text", "defaultMessageDenyNotificationText", Kind::Text),
    ("description", "description", Kind::Text),
    ("is_archived", "isArchived", Kind::Boolean),
    ("max_message_bytes", "maxMessageBytes", Kind::Bytes),
    ("members_can_post_as_the_group", "membersCanPostAsTheGroup", Kind::Boolean),
    ("message_display_font", "messageDisplayFont", Kind::Choice(&["DEFAULT_FONT", "FIXED_WIDTH_FONT"])),
    (
        "message_moderation_level",
        "messageModerationLevel",
        Kind::Choice(&[
            "MODERATE_ALL_MESSAGES",
            "MODERATE_NEW_MEMBERS",
            "MODERATE_NONE",
            "MODERATE_NON_MEMBERS",
        ]),
    ),
    ("name", "name", Kind::Text),
    ("primary_language", "primaryLanguage", Kind::Text),
    (
        "reply_to",
        "replyTo",
        Kind::Choice(&[
            "REPLY_TO_CUSTOM",
            "REPLY_TO_IGNORE",
            "REPLY_TO_LIST",
            "REPLY_TO_MANAGERS",
            "REPLY_TO_OWNER",
            "REPLY_TO_SENDER",
        ]),
    ),
    ("send_message_deny_notification", "sendMessageDenyNotification", Kind::Boolean),
    ("show_in_group_directory", "showInGroupDirectory", Kind::Boolean),
    ("show_in_groups_directory", "showInGroupDirectory", Kind::Boolean),
    ("who_can_invite", "whoCanInvite", Kind::Choice(&["ALL_MANAGERS_CAN_INVITE", "ALL_MEMBERS_CAN_INVITE"])),
    (
        "who_can_join",
        "whoCanJoin",
        Kind::Choice(&[
            "ALL_IN_DOMAIN_CAN_JOIN",
            "ANYONE_CAN_JOIN",
            "CAN_REQUEST_TO_JOIN",
            "INVITED_CAN_JOIN",
        ]),
    ),
    (
        "who_can_post_message",
        "whoCanPostMessage",
        Kind::Choice(&[
            "ALL_IN_DOMAIN_CAN_POST",
            "ALL_MANAGERS_CAN_POST",
            "ALL_MEMBERS_CAN_POST",
            "ANYONE_CAN_POST",
            "NONE_CAN_POST",
        ]),
    ),
    ("who_can_view_group", "whoCanViewGroup", Kind::Choice(WHO_CAN_VIEW)),
    ("who_can_view_membership", "whoCanViewMembership", Kind::Choice(WHO_CAN_VIEW)),
];

/// `25M`, `512K`, `100B` or a plain number of bytes.
pub fn parse_bytes(value: &str) -> Option<u64> {
    let upper = value.trim().to_uppercase();
    let (digits, scale) = match upper.chars().last()? {
        'M' => (&upper[..upper.len() - 1], 1024 * 1024),
        'K' => (&upper[..upper.len() - 1], 1024),
        'B' => (&upper[..upper.len() - 1], 1),
        _ => (upper.as_str(), 1),
    };
    digits.parse::<u64>().ok()?.checked_mul(scale)
}

/// Validates `key value` pairs into the JSON sent to the settings API.
///
/// A bad value exits 9, an unknown key 10.
pub fn parse_settings(words: &mut Words) -> Result<SettingsMap, GamError> {
    let mut changes = SettingsMap::new();
    while let Some(key) = words.next_keyword() {
        let Some((_, api_key, kind)) = SETTINGS.iter().find(|(k, _, _)| *k == key) else {
            return Err(GamError::usage_code(
                format!("Error: {} is not a valid setting for groups", key),
                10,
            ));
        };
        let raw = words.value_for(&key)?;
        let value = match kind {
            Kind::Text => Value::String(raw),
            Kind::Boolean => match raw.to_lowercase().as_str() {
                v @ ("true" | "false") => Value::String(v.to_string()),
                _ => {
                    return Err(GamError::usage_code(
                        format!("Error: Value for {} must be true or false. Got {}", key, raw),
                        9,
                    ))
                }
            },
            Kind::Choice(allowed) => {
                let upper = raw.to_uppercase();
                if !allowed.contains(&upper.as_str()) {
                    let choices: Vec<String> = allowed.iter().map(|a| a.to_lowercase()).collect();
                    return Err(GamError::usage_code(
                        format!(
                            "Error: Value for {} must be {}. Got {}",
                            key,
                            choices.join(", "),
                            raw
                        ),
                        9,
                    ));
                }
                Value::String(upper)
            }
            Kind::Bytes => match parse_bytes(&raw) {
                Some(n) => Value::from(n),
                None => {
                    return Err(GamError::usage_code(
                        format!(
                            "Error: max_message_bytes must be a number ending with M (megabytes), K (kilobytes) or nothing (bytes). Got {}",
                            raw
                        ),
                        9,
                    ))
                }
            },
        };
        changes.insert(api_key.to_string(), value);
    }
    Ok(changes)
}

pub async fn update(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let group = words.require("a group name")?;
    let (address, domain) = group_address(&group, ctx.session.domain());
    let primary = ctx.session.domain();
    let groups = ctx.session.groups();

    match words.peek_keyword().as_deref() {
        Some("add") => {
            words.next_word();
            let role = words.require_keyword("owner or member")?;
            let email = qualify(&words.require("a user")?, primary);
            match role.as_str() {
                "member" => {
                    groups.add_member(&domain, &address, &email).await?;
                    match groups.remove_owner(&domain, &address, &email).await {
                        Ok(()) => {}
                        Err(GamError::Api(err)) => {
                            debug!("{} was not an owner of {}: {}", email, address, err.reason)
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                "owner" => {
                    groups.add_member(&domain, &address, &email).await?;
                    groups.add_owner(&domain, &address, &email).await?;
                }
                other => {
                    return Err(GamError::usage(format!(
                        "Error: expected owner or member, got {}",
                        other
                    ))
                    .into())
                }
            }
        }
        Some("remove") => {
            words.next_word();
            let email = qualify(&words.require("a user")?, primary);
            groups.remove_member(&domain, &address, &email).await?;
        }
        Some("settings") => {
            words.next_word();
            let changes = parse_settings(words)?;
            if changes.is_empty() {
                return Err(GamError::usage("Error: no group settings given").into());
            }
            ctx.session
                .group_settings()
                .update(&address, &changes)
                .await
                .with_context(|| format!("updating settings of {}", address))?;
        }
        _ => {
            let mut info = groups.retrieve_group(&domain, &address).await?;
            while let Some(keyword) = words.next_keyword() {
                match keyword.as_str() {
                    "name" => info.name = words.value_for("name")?,
                    "description" => info.description = words.value_for("description")?,
                    "permission" => {
                        info.permission = permission(&words.value_for("permission")?)?
                            .as_str()
                            .to_string()
                    }
                    other => return Err(unknown_argument(other, "gam update group").into()),
                }
            }
            if info.id.is_empty() {
                info.id = address;
            }
            groups.update_group(&domain, &info).await?;
        }
    }
    Ok(())
}

/// `whoCanJoin` -> `who_can_join`.
pub fn snake_case(key: &str) -> String {
    match Regex::new(r"([A-Z])") {
        Ok(upper) => upper.replace_all(key, "_$1").to_lowercase(),
        Err(_) => key.to_lowercase(),
    }
}

fn setting_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub async fn info(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let group = words.require("a group name")?;
    let (address, domain) = group_address(&group, ctx.session.domain());

    if words.eat("settings") {
        let settings = match ctx.session.group_settings().retrieve(&address).await {
            Ok(settings) => settings,
            Err(err) => return Err(GamError::failed(err.to_string(), 8).into()),
        };
        println!();
        println!("Group Settings:");
        for (key, value) in &settings {
            println!(" {}: {}", snake_case(key), setting_text(value));
        }
        return Ok(());
    }

    let groups = ctx.session.groups();
    let info = groups.retrieve_group(&domain, &address).await?;
    println!("Group Name: {}", info.name);
    if info.permission.is_empty() {
        println!("Email Permission: Unknown");
    } else {
        println!("Email Permission: {}", info.permission);
    }
    println!("Group ID: {}", info.id);
    println!("Description: {}", info.description);

    let owners: Vec<String> = groups
        .owners(&domain, &address)
        .await?
        .iter()
        .map(|o| o.value("email").to_string())
        .collect();
    for owner in &owners {
        println!("Owner: {}", owner);
    }
    for member in groups.members(&domain, &address).await? {
        let id = member.value("memberId");
        if !owners.iter().any(|o| o == id) {
            println!("Member: {}", id);
        }
    }
    Ok(())
}

pub async fn delete(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let group = words.require("a group name")?;
    let (address, domain) = group_address(&group, ctx.session.domain());
    println!("Deleting group {}", group);
    ctx.session.groups().delete_group(&domain, &address).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_suffixes() {
        assert_eq!(parse_bytes("25M"), Some(25 * 1024 * 1024));
        assert_eq!(parse_bytes("512k"), Some(512 * 1024));
        assert_eq!(parse_bytes("100B"), Some(100));
        assert_eq!(parse_bytes("4096"), Some(4096));
        assert_eq!(parse_bytes("lots"), None);
    }

    #[test]
    fn oversized_byte_counts_are_rejected() {
        assert_eq!(parse_bytes("18446744073709551615M"), None);
        assert_eq!(parse_bytes("18446744073709551615"), Some(u64::MAX));

        let mut words = Words::new(["max_message_bytes", "18446744073709551615K"]);
        assert_eq!(parse_settings(&mut words).unwrap_err().exit_code(), 9);
    }

    #[test]
    fn group_feeds_use_the_primary_domain() {
        assert_eq!(
            group_address("staff@other.org", "example.com"),
            ("staff@other.org".to_string(), "example.com".to_string())
        );
        assert_eq!(
            group_address("staff", "example.com"),
            ("staff@example.com".to_string(), "example.com".to_string())
        );
    }

    #[test]
    fn settings_are_validated() {
        let mut words = Words::new([
            "who_can_join", "invited_can_join", "allow_web_posting", "FALSE", "max_message_bytes", "5M",
        ]);
        let changes = parse_settings(&mut words).unwrap();
        assert_eq!(changes["whoCanJoin"], "INVITED_CAN_JOIN");
        assert_eq!(changes["allowWebPosting"], "false");
        assert_eq!(changes["maxMessageBytes"], 5 * 1024 * 1024);

        let mut bad_value = Words::new(["archive_only", "yes"]);
        assert_eq!(parse_settings(&mut bad_value).unwrap_err().exit_code(), 9);

        let mut bad_key = Words::new(["colour", "blue"]);
        assert_eq!(parse_settings(&mut bad_key).unwrap_err().exit_code(), 10);
    }

    #[test]
    fn keys_render_in_snake_case() {
        assert_eq!(snake_case("whoCanViewMembership"), "who_can_view_membership");
        assert_eq!(snake_case("email"), "email");
    }
}
