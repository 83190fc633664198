//! Domain-wide admin settings: `/a/feeds/domain/2.0/{domain}/{section}/{setting}`.
//!
//! Each setting is its own entry, so reading the whole domain profile is a
//! dozen calls; the session paces this family at one call per second.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{GamError, GamResult};
use crate::http::Transport;
use crate::xml::{bool_str, property_entry, Properties};

/// Single sign-on settings; `None` is left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsoSettings {
    pub enabled: Option<bool>,
    pub sign_on_uri: Option<String>,
    pub sign_out_uri: Option<String>,
    pub password_uri: Option<String>,
    pub whitelist: Option<String>,
    pub use_domain_specific_issuer: Option<bool>,
}

/// An inbound email route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailRoute {
    pub destination: Option<String>,
    pub rewrite_to: Option<bool>,
    pub enabled: Option<bool>,
    pub bounce_notifications: Option<bool>,
    /// `allAccounts`, `provisionedAccounts` or `unknownAccounts`
    pub account_handling: Option<String>,
}

pub struct AdminSettings<'a> {
    transport: &'a Transport,
    base: &'a str,
    domain: &'a str,
}

impl<'a> AdminSettings<'a> {
    pub fn new(transport: &'a Transport, base: &'a str, domain: &'a str) -> Self {
        Self {
            transport,
            base,
            domain,
        }
    }

    fn url(&self, setting: &str) -> String {
        format!("{}/a/feeds/domain/2.0/{}/{}", self.base, self.domain, setting)
    }

    /// Reads one setting entry.
    pub async fn get(&self, setting: &str) -> GamResult<Properties> {
        Ok(self
            .transport
            .get_xml(&self.url(setting))
            .await?
            .into_entry()?
            .properties())
    }

    async fn value(&self, setting: &str, property: &str) -> GamResult<String> {
        Ok(self.get(setting).await?.value(property).to_string())
    }

    async fn put<'p, I>(&self, setting: &str, props: I) -> GamResult<Properties>
    where
        I: IntoIterator<Item = (&'p str, Option<&'p str>)>,
    {
        let doc = self
            .transport
            .put_xml(&self.url(setting), property_entry(props))
            .await?;
        Ok(doc.entries.first().map(|e| e.properties()).unwrap_or_default())
    }

    pub fn domain(&self) -> &str {
        self.domain
    }

    pub async fn default_language(&self) -> GamResult<String> {
        self.value("general/defaultLanguage", "defaultLanguage").await
    }

    pub async fn organization_name(&self) -> GamResult<String> {
        self.value("general/organizationName", "organizationName").await
    }

    pub async fn maximum_users(&self) -> GamResult<String> {
        self.value("general/maximumNumberOfUsers", "maximumNumberOfUsers").await
    }

    pub async fn current_users(&self) -> GamResult<String> {
        self.value("general/currentNumberOfUsers", "currentNumberOfUsers").await
    }

    pub async fn is_verified(&self) -> GamResult<String> {
        self.value("accountInformation/isVerified", "isVerified").await
    }

    pub async fn support_pin(&self) -> GamResult<String> {
        self.value("accountInformation/supportPIN", "supportPIN").await
    }

    pub async fn edition(&self) -> GamResult<String> {
        self.value("accountInformation/edition", "edition").await
    }

    pub async fn customer_pin(&self) -> GamResult<String> {
        self.value("accountInformation/customerPIN", "customerPIN").await
    }

    pub async fn creation_time(&self) -> GamResult<String> {
        self.value("accountInformation/creationTime", "creationTime").await
    }

    pub async fn country_code(&self) -> GamResult<String> {
        self.value("accountInformation/countryCode", "countryCode").await
    }

    pub async fn admin_secondary_email(&self) -> GamResult<String> {
        self.value("accountInformation/adminSecondaryEmail", "adminSecondaryEmail")
            .await
    }

    pub async fn cname_verification(&self) -> GamResult<Properties> {
        self.get("verification/cname").await
    }

    pub async fn mx_verification(&self) -> GamResult<Properties> {
        self.get("verification/mx").await
    }

    pub async fn sso_settings(&self) -> GamResult<Properties> {
        self.get("sso/general").await
    }

    pub async fn sso_key(&self) -> GamResult<Properties> {
        self.get("sso/signingkey").await
    }

    pub async fn user_migration_enabled(&self) -> GamResult<String> {
        self.value("email/migration", "enableUserMigration").await
    }

    pub async fn outbound_gateway(&self) -> GamResult<Properties> {
        self.get("email/gateway").await
    }

    /// The custom logo image bytes.
    pub async fn logo(&self) -> GamResult<Vec<u8>> {
        let encoded = self.value("appearance/customLogo", "logoImage").await?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| GamError::Xml(format!("logo is not valid base64: {}", e)))
    }

    pub async fn update_default_language(&self, language: &str) -> GamResult<()> {
        self.put("general/defaultLanguage", [("defaultLanguage", Some(language))])
            .await?;
        Ok(())
    }

    pub async fn update_organization_name(&self, name: &str) -> GamResult<()> {
        self.put("general/organizationName", [("organizationName", Some(name))])
            .await?;
        Ok(())
    }

    pub async fn update_admin_secondary_email(&self, email: &str) -> GamResult<()> {
        self.put(
            "accountInformation/adminSecondaryEmail",
            [("adminSecondaryEmail", Some(email))],
        )
        .await?;
        Ok(())
    }

    pub async fn update_logo(&self, image: &[u8]) -> GamResult<()> {
        let encoded = STANDARD.encode(image);
        self.put("appearance/customLogo", [("logoImage", Some(encoded.as_str()))])
            .await?;
        Ok(())
    }

    /// Asks the provider to check the CNAME record now.
    pub async fn verify_cname(&self) -> GamResult<Properties> {
        self.put("verification/cname", [("verified", Some("true"))]).await
    }

    pub async fn verify_mx(&self) -> GamResult<Properties> {
        self.put("verification/mx", [("verified", Some("true"))]).await
    }

    pub async fn update_sso_settings(&self, sso: &SsoSettings) -> GamResult<()> {
        self.put(
            "sso/general",
            [
                ("enableSSO", sso.enabled.map(bool_str)),
                ("samlSignonUri", sso.sign_on_uri.as_deref()),
                ("samlLogoutUri", sso.sign_out_uri.as_deref()),
                ("changePasswordUri", sso.password_uri.as_deref()),
                ("ssoWhitelist", sso.whitelist.as_deref()),
                ("useDomainSpecificIssuer", sso.use_domain_specific_issuer.map(bool_str)),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn update_sso_key(&self, key: &[u8]) -> GamResult<()> {
        let encoded = STANDARD.encode(key);
        self.put("sso/signingkey", [("signingKey", Some(encoded.as_str()))])
            .await?;
        Ok(())
    }

    pub async fn update_user_migration(&self, enabled: bool) -> GamResult<()> {
        self.put("email/migration", [("enableUserMigration", Some(bool_str(enabled)))])
            .await?;
        Ok(())
    }

    pub async fn update_outbound_gateway(&self, smart_host: &str, mode: &str) -> GamResult<()> {
        self.put(
            "email/gateway",
            [("smartHost", Some(smart_host)), ("smtpMode", Some(mode))],
        )
        .await?;
        Ok(())
    }

    pub async fn add_email_route(&self, route: &EmailRoute) -> GamResult<()> {
        let body = property_entry([
            ("routeDestination", route.destination.as_deref()),
            ("routeRewriteTo", route.rewrite_to.map(bool_str)),
            ("routeEnabled", route.enabled.map(bool_str)),
            ("bounceNotifications", route.bounce_notifications.map(bool_str)),
            ("accountHandling", route.account_handling.as_deref()),
        ]);
        self.transport.post_xml(&self.url("emailrouting"), body).await?;
        Ok(())
    }
}
