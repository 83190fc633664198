//! Command-line interface for gam
//!
//! Global options are parsed with clap; everything after them is the
//! keyword-driven command grammar (`gam create user jsmith firstname John ...`)
//! which is handed to [`crate::command::parse`] as raw words.
//!
//! # Configuration sources
//!
//! - `--oauth-file` / `OAUTHFILE`: credential file, relative to the executable
//! - `--debug` / `GAM_DEBUG`, or a `debug.gam` file next to the executable
//! - `--timeout-ms`: per-request HTTP timeout

use clap::Parser;
use std::path::PathBuf;

/// Main command-line interface structure for gam
///
/// # Examples
///
/// ```
/// use gam::cli::Cli;
/// use clap::Parser;
///
/// let cli = Cli::parse_from(["gam", "info", "domain"]);
/// assert_eq!(cli.words, vec!["info", "domain"]);
/// assert_eq!(cli.timeout_ms, 30000);
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "gam",
    about = "Retrieve or set hosted domain, user, group and alias settings",
    after_help = "Examples:\n  gam info domain\n  gam create user jsmith firstname John lastname Smith password secretpass\n  gam update user jsmith suspended on\n  gam update group announcements add member jsmith",
    version
)]
pub struct Cli {
    /// Credential file, relative to the executable's directory unless absolute
    #[arg(long, env = "OAUTHFILE", default_value = "oauth.txt")]
    pub oauth_file: PathBuf,

    /// Request timeout in milliseconds for HTTP operations
    #[arg(short = 't', long, default_value = "30000")]
    pub timeout_ms: u64,

    /// Log every request at debug level
    #[arg(long, env = "GAM_DEBUG")]
    pub debug: bool,

    /// Command words, e.g. `update user jsmith suspended on`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}
