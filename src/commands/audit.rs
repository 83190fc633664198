//! `audit monitor|activity|export|uploadkey|admin`.

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{Duration, Local};

use crate::api::adminaudit::AuditQuery;
use crate::api::audit::{ExportRequest, Monitor};
use crate::args::Words;
use crate::command::Context;
use crate::error::GamError;
use crate::validation::user_and_domain;
use crate::xml::Properties;

use super::unknown_argument;

pub async fn run(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    match words.require_keyword("monitor, activity, export, uploadkey or admin")?.as_str() {
        "monitor" => match words.require_keyword("create, list or delete")?.as_str() {
            "create" => create_monitor(ctx, words).await,
            "list" => list_monitors(ctx, words).await,
            "delete" => delete_monitor(ctx, words).await,
            other => Err(unknown_argument(other, "gam audit monitor").into()),
        },
        "activity" => match words.require_keyword("request, status, download or delete")?.as_str() {
            "request" => request_activity(ctx, words).await,
            "status" => activity_status(ctx, words).await,
            "download" => download(ctx, words, RequestKind::Activity).await,
            "delete" => delete_request(ctx, words, RequestKind::Activity).await,
            other => Err(unknown_argument(other, "gam audit activity").into()),
        },
        "export" => match words.require_keyword("request, status, download or delete")?.as_str() {
            "request" => request_export(ctx, words).await,
            "status" => export_status(ctx, words).await,
            "download" => download(ctx, words, RequestKind::Export).await,
            "delete" => delete_request(ctx, words, RequestKind::Export).await,
            other => Err(unknown_argument(other, "gam audit export").into()),
        },
        "uploadkey" => upload_key(ctx).await,
        "admin" => admin(ctx, words).await,
        other => Err(unknown_argument(other, "gam audit").into()),
    }
}

/// Lowercased `(local part, domain)` of a user argument.
fn audited_user(ctx: &Context<'_>, words: &mut Words) -> Result<(String, String), GamError> {
    let user = words.require("a user")?.to_lowercase();
    Ok(user_and_domain(&user, ctx.session.domain()))
}

/// Default monitor end: thirty days from now, local time.
pub fn default_end_date() -> String {
    (Local::now() + Duration::days(30))
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// `<destination> [begin] [end] [flags]` after the source user.
pub fn parse_monitor(words: &mut Words) -> Result<Monitor, GamError> {
    let mut monitor = Monitor {
        destination: words.require("a destination user")?.to_lowercase(),
        begin_date: None,
        end_date: default_end_date(),
        incoming_headers_only: false,
        outgoing_headers_only: false,
        drafts: true,
        drafts_headers_only: false,
        chats: true,
        chats_headers_only: false,
    };
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "end" => monitor.end_date = words.value_for("end")?,
            "begin" => monitor.begin_date = Some(words.value_for("begin")?),
            "incoming_headers" => monitor.incoming_headers_only = true,
            "outgoing_headers" => monitor.outgoing_headers_only = true,
            "nochats" => monitor.chats = false,
            "nodrafts" => monitor.drafts = false,
            "chat_headers" => monitor.chats_headers_only = true,
            "draft_headers" => monitor.drafts_headers_only = true,
            other => return Err(unknown_argument(other, "gam audit monitor create")),
        }
    }
    Ok(monitor)
}

async fn create_monitor(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (user, domain) = audited_user(ctx, words)?;
    let monitor = parse_monitor(words)?;
    ctx.session
        .audit()
        .create_monitor(&domain, &user, &monitor)
        .await?;
    Ok(())
}

async fn list_monitors(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (user, domain) = audited_user(ctx, words)?;
    let monitors = ctx.session.audit().monitors(&domain, &user).await?;
    println!("{}@{} has the following monitors:", user, domain);
    println!();
    for monitor in monitors {
        println!(" Destination: {}", monitor.value("destUserName"));
        match monitor.get("beginDate") {
            Some(begin) => println!("  Begin: {}", begin),
            None => println!("  Begin: immediately"),
        }
        println!("  End: {}", monitor.value("endDate"));
        println!("  Monitor Incoming: {}", monitor.value("incomingEmailMonitorLevel"));
        println!("  Monitor Outgoing: {}", monitor.value("outgoingEmailMonitorLevel"));
        println!("  Monitor Chats: {}", monitor.value("chatMonitorLevel"));
        println!("  Monitor Drafts: {}", monitor.value("draftMonitorLevel"));
        println!();
    }
    Ok(())
}

async fn delete_monitor(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (user, domain) = audited_user(ctx, words)?;
    let destination = words.require("a destination user")?.to_lowercase();
    ctx.session
        .audit()
        .delete_monitor(&domain, &user, &destination)
        .await?;
    Ok(())
}

fn print_request(request: &Properties, indent: &str) {
    println!("{}Request ID: {}", indent, request.value("requestId"));
    println!("  User: {}", request.value("userEmailAddress"));
    println!("  Status: {}", request.value("status"));
    println!("  Request Date: {}", request.value("requestDate"));
    println!("  Requested By: {}", request.value("adminEmailAddress"));
}

fn print_files(request: &Properties) {
    if let Some(count) = request.get("numberOfFiles") {
        println!("  Number Of Files: {}", count);
        let count: usize = count.parse().unwrap_or(0);
        for i in 0..count {
            println!("  Url{}: {}", i, request.value(&format!("fileUrl{}", i)));
        }
    }
}

fn print_export_details(request: &Properties) {
    println!("  Requested Parts: {}", request.value("packageContent"));
    match request.get("searchQuery") {
        Some(query) => println!("  Request Filter: {}", query),
        None => println!("  Request Filter: None"),
    }
    println!("  Include Deleted: {}", request.value("includeDeleted"));
}

async fn request_activity(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (user, domain) = audited_user(ctx, words)?;
    let result = ctx.session.audit().request_activity(&domain, &user).await?;
    println!("Request successfully submitted:");
    println!(" Request ID: {}", result.value("requestId"));
    println!(" User: {}", result.value("userEmailAddress"));
    println!(" Status: {}", result.value("status"));
    println!(" Request Date: {}", result.value("requestDate"));
    println!(" Requested By: {}", result.value("adminEmailAddress"));
    Ok(())
}

/// One request when a user and id are given, otherwise all of them.
async fn activity_status(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let audit = ctx.session.audit();
    if words.is_empty() {
        println!("Current Activity Requests:");
        println!();
        for request in audit.all_activity_requests(ctx.session.domain()).await? {
            print_request(&request, " ");
            println!();
        }
        return Ok(());
    }
    let (user, domain) = audited_user(ctx, words)?;
    let id = words.require("a request id")?.to_lowercase();
    let request = audit.activity_status(&domain, &user, &id).await?;
    println!();
    print_request(&request, "  ");
    print_files(&request);
    println!();
    Ok(())
}

async fn request_export(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (user, domain) = audited_user(ctx, words)?;
    let mut request = ExportRequest::default();
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "begin" => request.begin_date = Some(words.value_for("begin")?),
            "end" => request.end_date = Some(words.value_for("end")?),
            "search" => request.search_query = Some(words.value_for("search")?),
            "headersonly" => request.headers_only = true,
            "includedeleted" => request.include_deleted = true,
            other => return Err(unknown_argument(other, "gam audit export request").into()),
        }
    }
    let result = ctx
        .session
        .audit()
        .request_export(&domain, &user, &request)
        .await?;
    println!("Export request successfully submitted:");
    println!(" Request ID: {}", result.value("requestId"));
    println!(" User: {}", result.value("userEmailAddress"));
    println!(" Status: {}", result.value("status"));
    println!(" Request Date: {}", result.value("requestDate"));
    println!(" Requested By: {}", result.value("adminEmailAddress"));
    println!(" Include Deleted: {}", result.value("includeDeleted"));
    println!(" Requested Parts: {}", result.value("packageContent"));
    println!(
        " Begin: {}",
        result.get("beginDate").unwrap_or("account creation date")
    );
    println!(" End: {}", result.get("endDate").unwrap_or("export request date"));
    Ok(())
}

async fn export_status(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let audit = ctx.session.audit();
    if words.is_empty() {
        println!("Current Export Requests:");
        println!();
        for request in audit.all_export_requests(ctx.session.domain()).await? {
            print_request(&request, " ");
            print_export_details(&request);
            if let Some(count) = request.get("numberOfFiles") {
                println!("  Number Of Files: {}", count);
            }
            println!();
        }
        return Ok(());
    }
    let (user, domain) = audited_user(ctx, words)?;
    let id = words.require("a request id")?.to_lowercase();
    let request = audit.export_status(&domain, &user, &id).await?;
    println!();
    print_request(&request, "  ");
    print_export_details(&request);
    print_files(&request);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Activity,
    Export,
}

impl RequestKind {
    fn file_name(self, user: &str, id: &str, index: usize) -> String {
        match self {
            Self::Activity => format!("activity-{}-{}-{}.txt.gpg", user, id, index),
            Self::Export => format!("export-{}-{}-{}.mbox.gpg", user, id, index),
        }
    }
}

/// File URLs of a completed request; exit 4 otherwise.
pub fn completed_files(request: &Properties) -> Result<Vec<String>, GamError> {
    let status = request.value("status");
    if status != "COMPLETED" {
        return Err(GamError::failed(
            format!(
                "Request needs to be completed before downloading, current status is: {}",
                status
            ),
            4,
        ));
    }
    let count = request.get("numberOfFiles").ok_or_else(|| {
        GamError::failed(
            "ERROR: Request completed but no files were returned, try requesting again",
            4,
        )
    })?;
    let count: usize = count.parse().unwrap_or(0);
    if count < 1 {
        return Err(GamError::failed(
            "ERROR: Request completed but no results were returned, try requesting again",
            4,
        ));
    }
    Ok((0..count)
        .map(|i| request.value(&format!("fileUrl{}", i)).to_string())
        .collect())
}

async fn download(ctx: &Context<'_>, words: &mut Words, kind: RequestKind) -> Result<()> {
    let (user, domain) = audited_user(ctx, words)?;
    let id = words.require("a request id")?.to_lowercase();
    let audit = ctx.session.audit();
    let request = match kind {
        RequestKind::Activity => audit.activity_status(&domain, &user, &id).await?,
        RequestKind::Export => audit.export_status(&domain, &user, &id).await?,
    };
    let urls = completed_files(&request)?;
    let total = urls.len();
    for (index, url) in urls.iter().enumerate() {
        let file_name = kind.file_name(&user, &id, index);
        // Partial files from an earlier run must be removed by hand.
        if kind == RequestKind::Export && Path::new(&file_name).is_file() {
            continue;
        }
        println!("Downloading {} ({} of {})", file_name, index + 1, total);
        let bytes = audit.download(url).await?;
        std::fs::write(&file_name, bytes).with_context(|| format!("writing {}", file_name))?;
    }
    Ok(())
}

async fn delete_request(ctx: &Context<'_>, words: &mut Words, kind: RequestKind) -> Result<()> {
    let (user, domain) = audited_user(ctx, words)?;
    let id = words.require("a request id")?.to_lowercase();
    let audit = ctx.session.audit();
    match kind {
        RequestKind::Activity => audit.delete_activity_request(&domain, &user, &id).await?,
        RequestKind::Export => audit.delete_export_request(&domain, &user, &id).await?,
    }
    Ok(())
}

/// Reads an armored PGP public key from stdin.
async fn upload_key(ctx: &Context<'_>) -> Result<()> {
    let mut key = String::new();
    std::io::stdin()
        .read_to_string(&mut key)
        .context("reading the PGP key from stdin")?;
    ctx.session
        .audit()
        .upload_key(ctx.session.domain(), &key)
        .await?;
    Ok(())
}

/// `audit admin [admin <email>] [event <name>] [start_date <d>] [end_date <d>]`
pub fn parse_admin_query(words: &mut Words) -> Result<AuditQuery, GamError> {
    let mut query = AuditQuery::default();
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "admin" => query.actor_email = Some(words.value_for("admin")?),
            "event" => query.event_name = Some(words.value_for("event")?),
            "start_date" => query.start_time = Some(words.value_for("start_date")?),
            "end_date" => query.end_time = Some(words.value_for("end_date")?),
            other => {
                return Err(GamError::usage(format!(
                    "Error: unknown argument {} for \"gam audit admin\"",
                    other
                )))
            }
        }
    }
    Ok(query)
}

async fn admin(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let query = parse_admin_query(words)?;
    let customer_id = ctx.session.orgs().customer_id().await?;
    let events = ctx
        .session
        .admin_audit()
        .retrieve_audit(&customer_id, &query)
        .await?;
    println!("{}", events);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn only_completed_requests_download() {
        let pending = request(&[("status", "PENDING")]);
        assert_eq!(completed_files(&pending).unwrap_err().exit_code(), 4);

        let empty = request(&[("status", "COMPLETED"), ("numberOfFiles", "0")]);
        assert_eq!(completed_files(&empty).unwrap_err().exit_code(), 4);

        let done = request(&[
            ("status", "COMPLETED"),
            ("numberOfFiles", "2"),
            ("fileUrl0", "https://a/0"),
            ("fileUrl1", "https://a/1"),
        ]);
        assert_eq!(
            completed_files(&done).unwrap(),
            vec!["https://a/0".to_string(), "https://a/1".to_string()]
        );
    }

    #[test]
    fn monitor_defaults_and_flags() {
        let mut words = Words::new(["Boss", "nochats", "draft_headers", "begin", "2012-01-01 00:00"]);
        let monitor = parse_monitor(&mut words).unwrap();
        assert_eq!(monitor.destination, "boss");
        assert!(!monitor.chats);
        assert!(monitor.drafts && monitor.drafts_headers_only);
        assert_eq!(monitor.begin_date.as_deref(), Some("2012-01-01 00:00"));
        assert_eq!(monitor.end_date.len(), "2012-01-31 00:00".len());
    }

    #[test]
    fn admin_query_rejects_unknown_filters() {
        let mut words = Words::new(["admin", "root@example.com", "event", "CHANGE_PASSWORD"]);
        let query = parse_admin_query(&mut words).unwrap();
        assert_eq!(query.actor_email.as_deref(), Some("root@example.com"));
        let mut words = Words::new(["actor", "x"]);
        assert_eq!(parse_admin_query(&mut words).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn result_files_are_named_per_kind() {
        assert_eq!(
            RequestKind::Activity.file_name("jsmith", "42", 0),
            "activity-jsmith-42-0.txt.gpg"
        );
        assert_eq!(
            RequestKind::Export.file_name("jsmith", "42", 1),
            "export-jsmith-42-1.mbox.gpg"
        );
    }
}
