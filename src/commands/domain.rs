//! `info domain` and `update domain`.

use anyhow::{Context as _, Result};

use crate::api::adminsettings::{EmailRoute, SsoSettings};
use crate::args::{true_false_code, Words};
use crate::command::Context;
use crate::error::GamError;

/// `info domain [logo <file>]`; the admin settings family paces itself.
pub async fn info(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let admin = ctx.session.admin_settings();
    if words.eat("logo") {
        let target = words.require("a file name for the logo")?;
        let image = admin.logo().await?;
        std::fs::write(&target, image).map_err(|_| {
            GamError::failed(format!("Error: can't open file {} for writing", target), 11)
        })?;
        return Ok(());
    }

    println!("Google Apps Domain: {}", admin.domain());
    println!("Default Language: {}", admin.default_language().await?);
    println!("Organization Name: {}", admin.organization_name().await?);
    println!("Maximum Users: {}", admin.maximum_users().await?);
    println!("Current Users: {}", admin.current_users().await?);
    println!("Domain is Verified: {}", admin.is_verified().await?);
    println!("Support PIN: {}", admin.support_pin().await?);
    println!("Domain Edition: {}", admin.edition().await?);
    println!("Customer PIN: {}", admin.customer_pin().await?);
    println!("Domain Creation Time: {}", admin.creation_time().await?);
    println!("Domain Country Code: {}", admin.country_code().await?);
    println!("Admin Secondary Email: {}", admin.admin_secondary_email().await?);

    let cname = admin.cname_verification().await?;
    println!("CNAME Verification Record Name: {}", cname.value("recordName"));
    println!("CNAME Verification Verified: {}", cname.value("verified"));
    println!("CNAME Verification Method: {}", cname.value("verificationMethod"));

    let mx = admin.mx_verification().await?;
    println!("MX Verification Verified: {}", mx.value("verified"));
    println!("MX Verification Method: {}", mx.value("verificationMethod"));

    let sso = admin.sso_settings().await?;
    println!("SSO Enabled: {}", sso.value("enableSSO"));
    println!("SSO Signon Page: {}", sso.value("samlSignonUri"));
    println!("SSO Logout Page: {}", sso.value("samlLogoutUri"));
    println!("SSO Password Page: {}", sso.value("changePasswordUri"));
    println!("SSO Whitelist IPs: {}", sso.value("ssoWhitelist"));
    println!(
        "SSO Use Domain Specific Issuer: {}",
        sso.value("useDomainSpecificIssuer")
    );

    // No key uploaded yet is reported as an error by the provider.
    match admin.sso_key().await {
        Ok(key) => {
            for (name, label) in [
                ("algorithm", "SSO Key Algorithm"),
                ("format", "SSO Key Format"),
                ("modulus", "SSO Key Modulus"),
                ("exponent", "SSO Key Exponent"),
                ("yValue", "SSO Key yValue"),
                ("signingKey", "Full SSO Key"),
            ] {
                if let Some(value) = key.get(name) {
                    println!("{}: {}", label, value);
                }
            }
        }
        Err(GamError::Api(err)) => tracing::debug!("no SSO key: {}", err),
        Err(err) => return Err(err.into()),
    }

    println!("User Migration Enabled: {}", admin.user_migration_enabled().await?);
    let gateway = admin.outbound_gateway().await?;
    println!("Outbound Gateway Smart Host: {}", gateway.value("smartHost"));
    match gateway.get("smtpMode") {
        Some(mode) => println!("Outbound Gateway SMTP Mode: {}", mode),
        None => println!("Not Set"),
    }
    Ok(())
}

fn read_file(path: &str) -> Result<Vec<u8>, GamError> {
    std::fs::read(path).map_err(|_| GamError::failed(format!("Error: can't open file {}", path), 11))
}

fn setting_bool(value: &str, setting: &str) -> Result<bool, GamError> {
    true_false_code(value, setting, 9)
}

/// Options of `update domain sso_settings`.
pub fn parse_sso(words: &mut Words) -> Result<SsoSettings, GamError> {
    let mut sso = SsoSettings::default();
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "enabled" => sso.enabled = Some(setting_bool(&words.value_for("enabled")?, "enabled")?),
            "sign_on_uri" => sso.sign_on_uri = Some(words.value_for("sign_on_uri")?),
            "sign_out_uri" => sso.sign_out_uri = Some(words.value_for("sign_out_uri")?),
            "password_uri" => sso.password_uri = Some(words.value_for("password_uri")?),
            "whitelist" => sso.whitelist = Some(words.value_for("whitelist")?),
            "use_domain_specific_issuer" => {
                let value = words.value_for("use_domain_specific_issuer")?;
                sso.use_domain_specific_issuer =
                    Some(setting_bool(&value, "use_domain_specific_issuer")?)
            }
            other => {
                return Err(GamError::usage_code(
                    format!(
                        "Error: unknown option for \"gam update domain sso_settings...\": {}",
                        other
                    ),
                    9,
                ))
            }
        }
    }
    Ok(sso)
}

/// Options of `update domain email_route`.
pub fn parse_email_route(words: &mut Words) -> Result<EmailRoute, GamError> {
    let mut route = EmailRoute::default();
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "destination" => route.destination = Some(words.value_for("destination")?),
            "rewrite_to" => {
                route.rewrite_to = Some(setting_bool(&words.value_for("rewrite_to")?, "rewrite_to")?)
            }
            "enabled" => route.enabled = Some(setting_bool(&words.value_for("enabled")?, "enabled")?),
            "bounce_notifications" => {
                let value = words.value_for("bounce_notifications")?;
                route.bounce_notifications = Some(setting_bool(&value, "bounce_notifications")?)
            }
            "account_handling" => {
                let value = words.value_for("account_handling")?;
                let handling = match value.to_lowercase().as_str() {
                    "all_accounts" => "allAccounts",
                    "provisioned_accounts" => "provisionedAccounts",
                    "unknown_accounts" => "unknownAccounts",
                    _ => {
                        return Err(GamError::usage_code(
                            format!(
                                "Error: value for account_handling must be all_accounts, provisioned_accounts or unknown_accounts. Got {}",
                                value
                            ),
                            9,
                        ))
                    }
                };
                route.account_handling = Some(handling.to_string());
            }
            _ => {
                return Err(GamError::usage_code(
                    "Error: invalid setting for \"gam update domain email_route...\"",
                    10,
                ))
            }
        }
    }
    Ok(route)
}

pub async fn update(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let admin = ctx.session.admin_settings();
    match words.require_keyword("a domain setting")?.as_str() {
        "language" => {
            let language = words.require("a language code")?;
            admin.update_default_language(&language).await?;
        }
        "name" => {
            let name = words.require("an organization name")?;
            admin.update_organization_name(&name).await?;
        }
        "admin_secondary_email" => {
            let email = words.require("an email address")?;
            if !email.contains('@') {
                return Err(GamError::failed(
                    format!("Error: {} is not a valid email address.", email),
                    11,
                )
                .into());
            }
            admin.update_admin_secondary_email(&email).await?;
        }
        "logo" => {
            let file = words.require("a logo file")?;
            admin.update_logo(&read_file(&file)?).await?;
        }
        "cname_verify" => {
            let result = admin.verify_cname().await?;
            println!("Record Name: {}", result.value("recordName"));
            println!("Verification Method: {}", result.value("verificationMethod"));
            println!("Verified: {}", result.value("verified"));
        }
        "mx_verify" => {
            let result = admin.verify_mx().await?;
            println!("Verification Method: {}", result.value("verificationMethod"));
            println!("Verified: {}", result.value("verified"));
        }
        "sso_settings" => {
            let sso = parse_sso(words)?;
            admin.update_sso_settings(&sso).await?;
        }
        "sso_key" => {
            let file = words.require("a key file")?;
            admin.update_sso_key(&read_file(&file)?).await?;
        }
        "user_migrations" => {
            let value = words.require("true or false")?;
            admin
                .update_user_migration(setting_bool(&value, "user_migrations")?)
                .await?;
        }
        "outbound_gateway" => {
            let gateway = words.require("a smart host")?;
            if !words.eat("mode") {
                return Err(GamError::usage("Error: expected mode smtp|smtp_tls after the smart host").into());
            }
            let mode = words.require("smtp or smtp_tls")?.to_uppercase();
            admin
                .update_outbound_gateway(&gateway, &mode)
                .await
                .context("updating outbound gateway")?;
        }
        "email_route" => {
            let route = parse_email_route(words)?;
            admin.add_email_route(&route).await?;
        }
        other => {
            return Err(GamError::usage(format!(
                "Error: {} is not a valid \"gam update domain\" command",
                other
            ))
            .into())
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sso_booleans_are_strict() {
        let mut words = Words::new(["enabled", "TRUE", "whitelist", "10.0.0.0/8"]);
        let sso = parse_sso(&mut words).unwrap();
        assert_eq!(sso.enabled, Some(true));
        assert_eq!(sso.whitelist.as_deref(), Some("10.0.0.0/8"));

        let mut words = Words::new(["enabled", "on"]);
        assert_eq!(parse_sso(&mut words).unwrap_err().exit_code(), 9);

        let mut words = Words::new(["colour", "red"]);
        assert_eq!(parse_sso(&mut words).unwrap_err().exit_code(), 9);
    }

    #[test]
    fn email_route_maps_account_handling() {
        let mut words = Words::new([
            "destination",
            "smtp.example.com",
            "account_handling",
            "Unknown_Accounts",
            "bounce_notifications",
            "false",
        ]);
        let route = parse_email_route(&mut words).unwrap();
        assert_eq!(route.account_handling.as_deref(), Some("unknownAccounts"));
        assert_eq!(route.bounce_notifications, Some(false));

        let mut words = Words::new(["account_handling", "some"]);
        assert_eq!(parse_email_route(&mut words).unwrap_err().exit_code(), 9);
        let mut words = Words::new(["priority", "1"]);
        assert_eq!(parse_email_route(&mut words).unwrap_err().exit_code(), 10);
    }
}
