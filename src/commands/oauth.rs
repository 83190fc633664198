//! `gam oauth request`: the interactive three-legged authorization.
//!
//! Also run from `main` when no usable credential record exists.

use std::io::IsTerminal;

use anyhow::{Context as _, Result};
use dialoguer::{Confirm, Input, MultiSelect};
use tracing::debug;

use crate::config::Config;
use crate::credentials::{self, CredentialRecord};
use crate::error::GamError;
use crate::http::Transport;
use crate::oauth::{KeyPair, TokenEndpoints, DEFAULT_DISPLAY_NAME, SCOPES};
use crate::validation::validate_domain;

fn require_terminal() -> Result<(), GamError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(GamError::Credentials(
            "no usable credentials and stdin is not a terminal; run `gam oauth request` interactively".to_string(),
        ))
    }
}

fn prompt_domain() -> Result<String> {
    let domain: String = Input::new()
        .with_prompt("Enter your Primary Google Apps Domain (e.g. example.com)")
        .validate_with(|input: &String| validate_domain(input.trim()))
        .interact_text()
        .context("reading the domain")?;
    Ok(domain.trim().to_lowercase())
}

/// Blank client id means the anonymous consumer.
fn prompt_consumer() -> Result<KeyPair> {
    let key: String = Input::new()
        .with_prompt("Enter your Client ID (press Enter for anonymous)")
        .allow_empty(true)
        .interact_text()
        .context("reading the client id")?;
    if key.trim().is_empty() {
        return Ok(KeyPair::anonymous());
    }
    let secret: String = Input::new()
        .with_prompt("Enter your Client Secret")
        .interact_text()
        .context("reading the client secret")?;
    Ok(KeyPair::new(key.trim(), secret.trim()))
}

/// Indices of [`SCOPES`] to request, all of them by default.
fn prompt_scopes() -> Result<Vec<usize>> {
    let labels: Vec<&str> = SCOPES.iter().map(|s| s.label).collect();
    let defaults = vec![true; SCOPES.len()];
    loop {
        let chosen = MultiSelect::new()
            .with_prompt("Select the capabilities this token may use (space toggles, a toggles all)")
            .items(&labels)
            .defaults(&defaults)
            .interact()
            .context("reading the scope selection")?;
        if !chosen.is_empty() {
            return Ok(chosen);
        }
        eprintln!("You must select at least one capability.");
    }
}

fn prompt_display_name() -> Result<String> {
    let name: String = Input::new()
        .with_prompt("Token display name")
        .default(DEFAULT_DISPLAY_NAME.to_string())
        .interact_text()
        .context("reading the display name")?;
    Ok(name)
}

/// Runs the whole flow and saves the record to the configured file.
pub async fn request(config: &Config) -> Result<CredentialRecord> {
    require_terminal()?;
    let domain = prompt_domain()?;
    let consumer = prompt_consumer()?;
    let scopes: Vec<&str> = prompt_scopes()?
        .into_iter()
        .map(|i| SCOPES[i].url)
        .collect();
    let display_name = prompt_display_name()?;

    let transport = Transport::new(config.timeout)?;
    let endpoints = TokenEndpoints::new(&config.endpoints.www, transport.client().clone());
    let request_token = endpoints
        .request_token(&consumer, &scopes, &display_name)
        .await?;

    let url = endpoints.authorize_url(&request_token, &domain);
    if open::that(&url).is_err() {
        debug!("could not launch a browser for {}", url);
    }
    println!();
    println!("You should now see a web page asking you to grant {} access.", display_name);
    println!("If the page did not open, go to:");
    println!();
    println!("{}", url);
    println!();
    Confirm::new()
        .with_prompt("Have you granted access?")
        .default(true)
        .interact()
        .context("waiting for authorization")?;
    let verifier: String = Input::new()
        .with_prompt("Verification code (press Enter if none was shown)")
        .allow_empty(true)
        .interact_text()
        .context("reading the verification code")?;
    let verifier = Some(verifier.trim()).filter(|v| !v.is_empty());

    let access = endpoints
        .access_token(&consumer, &request_token, verifier)
        .await?;
    let mut record = CredentialRecord::new(&domain, &consumer, &access);
    record.scopes = scopes.iter().map(|s| s.to_string()).collect();
    record.display_name = display_name;
    credentials::save(&config.oauth_file, &record)
        .with_context(|| format!("saving {}", config.oauth_file.display()))?;
    println!("Authorization saved to {}", config.oauth_file.display());
    Ok(record)
}
