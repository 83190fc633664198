//! The command grammar: `gam <verb> <noun> ...` and
//! `gam <user|group|ou|all> <target> <command> ...`.
//!
//! Parsing only picks the handler; the handler reads its own keywords from
//! the remaining words.

use anyhow::Result;
use tracing::debug;

use crate::api::Session;
use crate::args::Words;
use crate::commands::email::{GeneralOption, Shown};
use crate::commands::{self, unknown_argument};
use crate::config::Config;
use crate::error::{GamError, GamResult};
use crate::targets::{self, Target};

/// What every handler gets to work with.
pub struct Context<'a> {
    pub session: &'a Session,
    pub config: &'a Config,
}

/// Object families of the `create|update|info|delete` verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Noun {
    User,
    Group,
    Alias,
    Org,
    Resource,
    Domain,
}

impl Noun {
    fn parse(word: &str, verb: &str) -> GamResult<Self> {
        match word {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            "alias" | "nickname" => Ok(Self::Alias),
            "org" => Ok(Self::Org),
            "resource" => Ok(Self::Resource),
            "domain" => Ok(Self::Domain),
            other => Err(unknown_argument(other, &format!("gam {}", verb))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Update,
    Info,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Users,
    Groups,
    Aliases,
    Orgs,
    Resources,
    Postini,
}

/// A per-user command of the entity form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Print,
    Show(ShowWhat),
    DeleteDelegate,
    DeleteCalendar,
    DeleteLabel,
    DeletePhoto,
    AddCalendar,
    UpdateCalendar,
    UpdatePhoto,
    GetPhoto,
    Profile,
    Imap,
    Pop,
    SendAs,
    Language,
    General(GeneralOption),
    Label,
    Filter,
    Forward,
    Signature,
    Vacation,
    WebClips,
    Delegate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowWhat {
    Labels,
    Profile,
    Calendars,
    CalSettings,
    Delegates,
    Mail(Shown),
}

impl Action {
    fn parse(words: &mut Words) -> GamResult<Self> {
        let command = words.require_keyword("a command")?;
        let action = match command.as_str() {
            "print" => Self::Print,
            "show" => Self::Show(match words.require_keyword("what to show")?.as_str() {
                "labels" | "label" => ShowWhat::Labels,
                "profile" => ShowWhat::Profile,
                "calendars" => ShowWhat::Calendars,
                "calsettings" => ShowWhat::CalSettings,
                "delegates" | "delegate" => ShowWhat::Delegates,
                "sendas" => ShowWhat::Mail(Shown::SendAs),
                "sig" | "signature" => ShowWhat::Mail(Shown::Signature),
                "forward" | "forwarding" => ShowWhat::Mail(Shown::Forward),
                "pop" | "pop3" => ShowWhat::Mail(Shown::Pop),
                "imap" | "imap4" => ShowWhat::Mail(Shown::Imap),
                "vacation" => ShowWhat::Mail(Shown::Vacation),
                other => return Err(unknown_argument(other, "gam <users> show")),
            }),
            "delete" => match words.require_keyword("what to delete")?.as_str() {
                "delegate" | "delegates" => Self::DeleteDelegate,
                "calendar" => Self::DeleteCalendar,
                "label" => Self::DeleteLabel,
                "photo" => Self::DeletePhoto,
                other => return Err(unknown_argument(other, "gam <users> delete")),
            },
            "add" => match words.require_keyword("calendar")?.as_str() {
                "calendar" => Self::AddCalendar,
                other => return Err(unknown_argument(other, "gam <users> add")),
            },
            "update" => match words.require_keyword("calendar or photo")?.as_str() {
                "calendar" => Self::UpdateCalendar,
                "photo" => Self::UpdatePhoto,
                other => return Err(unknown_argument(other, "gam <users> update")),
            },
            "get" => match words.require_keyword("photo")?.as_str() {
                "photo" => Self::GetPhoto,
                other => return Err(unknown_argument(other, "gam <users> get")),
            },
            "profile" => Self::Profile,
            "imap" | "imap4" => Self::Imap,
            "pop" | "pop3" => Self::Pop,
            "sendas" => Self::SendAs,
            "language" => Self::Language,
            "utf" | "utf8" | "utf-8" | "unicode" => Self::General(GeneralOption::Utf),
            "pagesize" => Self::General(GeneralOption::PageSize),
            "shortcuts" => Self::General(GeneralOption::Shortcuts),
            "arrows" => Self::General(GeneralOption::Arrows),
            "snippets" => Self::General(GeneralOption::Snippets),
            "label" => Self::Label,
            "filter" => Self::Filter,
            "forward" | "forwarding" => Self::Forward,
            "signature" | "sig" => Self::Signature,
            "vacation" => Self::Vacation,
            "webclips" => Self::WebClips,
            "delegate" | "delegates" => Self::Delegate,
            other => return Err(unknown_argument(other, "gam <users>")),
        };
        Ok(action)
    }
}

/// A parsed command line.
#[derive(Debug, Clone)]
pub enum Command {
    Version,
    OAuthRequest,
    Object { verb: Verb, noun: Noun, words: Words },
    Print { listing: Listing, words: Words },
    Audit(Words),
    Multi(Words),
    Calendar(Words),
    Report(Words),
    Entity { target: Target, action: Action, words: Words },
}

impl Command {
    /// Whether the command talks to the provider.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Self::Version | Self::OAuthRequest)
    }
}

pub fn parse(mut words: Words) -> GamResult<Command> {
    let first = words.require_keyword("a command")?;
    let command = match first.as_str() {
        "version" => Command::Version,
        "oauth" => match words.require_keyword("request")?.as_str() {
            "request" => Command::OAuthRequest,
            other => return Err(unknown_argument(other, "gam oauth")),
        },
        "create" | "update" | "info" | "delete" => {
            let verb = match first.as_str() {
                "create" => Verb::Create,
                "update" => Verb::Update,
                "info" => Verb::Info,
                _ => Verb::Delete,
            };
            let noun = Noun::parse(&words.require_keyword("an object type")?, &first)?;
            let allowed = match noun {
                Noun::Domain => matches!(verb, Verb::Update | Verb::Info),
                _ => true,
            };
            if !allowed {
                return Err(unknown_argument("domain", &format!("gam {}", first)));
            }
            Command::Object { verb, noun, words }
        }
        "print" => {
            let listing = match words.require_keyword("what to print")?.as_str() {
                "users" => Listing::Users,
                "groups" => Listing::Groups,
                "aliases" | "nicknames" => Listing::Aliases,
                "orgs" | "ous" => Listing::Orgs,
                "resources" => Listing::Resources,
                "postini" => Listing::Postini,
                other => return Err(unknown_argument(other, "gam print")),
            };
            Command::Print { listing, words }
        }
        "audit" => Command::Audit(words),
        "multi" => Command::Multi(words),
        "calendar" => Command::Calendar(words),
        "report" => Command::Report(words),
        entity if Target::is_entity(entity) => {
            let value = words.require("a target")?;
            let target = Target::parse(entity, &value)?;
            let action = Action::parse(&mut words)?;
            Command::Entity {
                target,
                action,
                words,
            }
        }
        other => {
            return Err(GamError::usage(format!(
                "Error: {} is not a valid command, see gam --help",
                other
            )))
        }
    };
    Ok(command)
}

/// Runs a command that needs the provider.
pub async fn run(ctx: &Context<'_>, command: Command) -> Result<()> {
    debug!("running {:?}", command);
    match command {
        Command::Version => {
            commands::version::run();
            Ok(())
        }
        Command::OAuthRequest => commands::oauth::request(ctx.config).await.map(|_| ()),
        Command::Object {
            verb,
            noun,
            mut words,
        } => run_object(ctx, verb, noun, &mut words).await,
        Command::Print { listing, mut words } => {
            let words = &mut words;
            match listing {
                Listing::Users => commands::print::users(ctx, words).await,
                Listing::Groups => commands::print::groups(ctx, words).await,
                Listing::Aliases => commands::print::aliases(ctx, words).await,
                Listing::Orgs => commands::print::orgs(ctx, words).await,
                Listing::Resources => commands::print::resources(ctx, words).await,
                Listing::Postini => commands::print::postini(ctx, words).await,
            }
        }
        Command::Audit(mut words) => commands::audit::run(ctx, &mut words).await,
        Command::Multi(mut words) => commands::aliases::multi(ctx, &mut words).await,
        Command::Calendar(mut words) => commands::calendar::acl(ctx, &mut words).await,
        Command::Report(mut words) => commands::report::run(ctx, &mut words).await,
        Command::Entity {
            target,
            action,
            mut words,
        } => {
            let users = targets::resolve(ctx.session, &target).await?;
            run_entity(ctx, action, &users, &mut words).await
        }
    }
}

async fn run_object(ctx: &Context<'_>, verb: Verb, noun: Noun, words: &mut Words) -> Result<()> {
    use commands::{aliases, domain, groups, orgs, resources, users};
    match (verb, noun) {
        (Verb::Create, Noun::User) => users::create(ctx, words).await,
        (Verb::Update, Noun::User) => users::update(ctx, words).await,
        (Verb::Info, Noun::User) => users::info(ctx, words).await,
        (Verb::Delete, Noun::User) => users::delete(ctx, words).await,
        (Verb::Create, Noun::Group) => groups::create(ctx, words).await,
        (Verb::Update, Noun::Group) => groups::update(ctx, words).await,
        (Verb::Info, Noun::Group) => groups::info(ctx, words).await,
        (Verb::Delete, Noun::Group) => groups::delete(ctx, words).await,
        (Verb::Create, Noun::Alias) => aliases::create(ctx, words).await,
        (Verb::Update, Noun::Alias) => aliases::update(ctx, words).await,
        (Verb::Info, Noun::Alias) => aliases::info(ctx, words).await,
        (Verb::Delete, Noun::Alias) => aliases::delete(ctx, words).await,
        (Verb::Create, Noun::Org) => orgs::create(ctx, words).await,
        (Verb::Update, Noun::Org) => orgs::update(ctx, words).await,
        (Verb::Info, Noun::Org) => orgs::info(ctx, words).await,
        (Verb::Delete, Noun::Org) => orgs::delete(ctx, words).await,
        (Verb::Create, Noun::Resource) => resources::create(ctx, words).await,
        (Verb::Update, Noun::Resource) => resources::update(ctx, words).await,
        (Verb::Info, Noun::Resource) => resources::info(ctx, words).await,
        (Verb::Delete, Noun::Resource) => resources::delete(ctx, words).await,
        (Verb::Update, Noun::Domain) => domain::update(ctx, words).await,
        (Verb::Info, Noun::Domain) => domain::info(ctx, words).await,
        (_, Noun::Domain) => Err(unknown_argument("domain", "gam").into()),
    }
}

async fn run_entity(ctx: &Context<'_>, action: Action, users: &[String], words: &mut Words) -> Result<()> {
    use commands::{calendar, email, profiles};
    match action {
        Action::Print => {
            for user in users {
                println!("{}", user);
            }
            Ok(())
        }
        Action::Show(what) => match what {
            ShowWhat::Labels => email::show_labels(ctx, users).await,
            ShowWhat::Profile => profiles::show(ctx, users).await,
            ShowWhat::Calendars => calendar::show_calendars(ctx, users).await,
            ShowWhat::CalSettings => calendar::show_settings(ctx, users).await,
            ShowWhat::Delegates => email::show_delegates(ctx, users, words).await,
            ShowWhat::Mail(shown) => email::show(ctx, users, shown).await,
        },
        Action::DeleteDelegate => email::delete_delegate(ctx, users, words).await,
        Action::DeleteCalendar => calendar::delete_calendar(ctx, users, words).await,
        Action::DeleteLabel => email::delete_label(ctx, users, words).await,
        Action::DeletePhoto => profiles::delete_photo(ctx, users).await,
        Action::AddCalendar => calendar::add_calendar(ctx, users, words).await,
        Action::UpdateCalendar => calendar::update_calendar(ctx, users, words).await,
        Action::UpdatePhoto => profiles::update_photo(ctx, users, words).await,
        Action::GetPhoto => profiles::get_photo(ctx, users).await,
        Action::Profile => profiles::share(ctx, users, words).await,
        Action::Imap => email::imap(ctx, users, words).await,
        Action::Pop => email::pop(ctx, users, words).await,
        Action::SendAs => email::send_as(ctx, users, words).await,
        Action::Language => email::language(ctx, users, words).await,
        Action::General(option) => email::general(ctx, users, words, option).await,
        Action::Label => email::label(ctx, users, words).await,
        Action::Filter => email::filter(ctx, users, words).await,
        Action::Forward => email::forward(ctx, users, words).await,
        Action::Signature => email::signature(ctx, users, words).await,
        Action::Vacation => email::vacation(ctx, users, words).await,
        Action::WebClips => email::web_clips(ctx, users, words).await,
        Action::Delegate => email::delegate(ctx, users, words).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_line(line: &str) -> GamResult<Command> {
        parse(Words::new(line.split_whitespace()))
    }

    #[test]
    fn verbs_pick_object_handlers() {
        match parse_line("create nickname jdoe user jsmith").unwrap() {
            Command::Object { verb, noun, words } => {
                assert_eq!(verb, Verb::Create);
                assert_eq!(noun, Noun::Alias);
                assert_eq!(words.peek(), Some("jdoe"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_line("INFO Domain").unwrap(),
            Command::Object { verb: Verb::Info, noun: Noun::Domain, .. }
        ));
        assert_eq!(parse_line("create domain x").unwrap_err().exit_code(), 2);
        assert_eq!(parse_line("frobnicate").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn entity_commands_parse_target_and_action() {
        match parse_line("group staff show sig").unwrap() {
            Command::Entity { target, action, .. } => {
                assert_eq!(target, Target::Group("staff".to_string()));
                assert_eq!(action, Action::Show(ShowWhat::Mail(Shown::Signature)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_line("all users pagesize 50").unwrap(),
            Command::Entity { target: Target::AllUsers, action: Action::General(GeneralOption::PageSize), .. }
        ));
        assert!(matches!(
            parse_line("ou /Sales delete photo").unwrap(),
            Command::Entity { target: Target::Ou(_), action: Action::DeletePhoto, .. }
        ));
        assert!(parse_line("user jsmith teleport").is_err());
    }

    #[test]
    fn only_provider_commands_need_a_session() {
        assert!(!parse_line("version").unwrap().needs_session());
        assert!(!parse_line("oauth request").unwrap().needs_session());
        assert!(parse_line("report accounts").unwrap().needs_session());
        assert!(parse_line("print users").unwrap().needs_session());
    }
}
