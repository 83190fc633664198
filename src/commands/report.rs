//! `gam report <name> [date]`

use anyhow::Result;

use crate::api::reporting::REPORT_NAMES;
use crate::args::Words;
use crate::command::Context;
use crate::error::GamError;

pub fn parse_report(words: &mut Words) -> Result<(String, Option<String>), GamError> {
    let name = words.require_keyword("a report name")?;
    if !REPORT_NAMES.contains(&name.as_str()) {
        return Err(GamError::usage(format!(
            "Error: report must be one of {}, got {}",
            REPORT_NAMES.join(", "),
            name
        )));
    }
    Ok((name, words.next_word()))
}

pub async fn run(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let (name, date) = parse_report(words)?;
    let csv = ctx
        .session
        .reporting()
        .retrieve_report(&name, date.as_deref())
        .await?;
    print!("{}", csv);
    Ok(())
}
