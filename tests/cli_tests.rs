use anyhow::Result;
use clap::Parser;
use gam::cli::Cli;
use gam::config::Config;
use std::path::PathBuf;

#[test]
fn test_command_words_are_passed_through() -> Result<()> {
    let cli = Cli::try_parse_from([
        "gam", "update", "user", "jsmith", "firstname", "John", "password", "secret",
    ])?;
    assert_eq!(
        cli.words,
        vec!["update", "user", "jsmith", "firstname", "John", "password", "secret"]
    );
    assert_eq!(cli.oauth_file, PathBuf::from("oauth.txt"));
    assert_eq!(cli.timeout_ms, 30000);
    Ok(())
}

#[test]
fn test_global_options_precede_words() -> Result<()> {
    let cli = Cli::try_parse_from([
        "gam",
        "--oauth-file",
        "/etc/gam/other.txt",
        "--timeout-ms",
        "5000",
        "--debug",
        "info",
        "domain",
    ])?;
    assert_eq!(cli.words, vec!["info", "domain"]);
    assert!(cli.debug);

    let config = Config::from_cli(&cli);
    assert_eq!(config.oauth_file, PathBuf::from("/etc/gam/other.txt"));
    assert_eq!(config.timeout.as_millis(), 5000);
    assert!(config.debug);
    Ok(())
}

#[test]
fn test_relative_oauth_file_resolves_next_to_executable() -> Result<()> {
    let cli = Cli::try_parse_from(["gam", "--oauth-file", "alt.txt", "version"])?;
    let config = Config::from_cli(&cli);
    assert_eq!(config.oauth_file, config.gam_dir.join("alt.txt"));
    Ok(())
}
