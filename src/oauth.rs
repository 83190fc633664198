//! OAuth 1.0 with HMAC-SHA1 signatures.
//!
//! Every API call is signed with the consumer and access token held in the
//! credential record. The three-legged token exchange (request token,
//! operator authorization, access token) lives here too; the interactive
//! prompts that drive it are in `commands::oauth`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::error::{ApiError, GamError, GamResult};

type HmacSha1 = Hmac<Sha1>;

/// A key/secret pair, used for both the consumer and the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub key: String,
    pub secret: String,
}

impl KeyPair {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", "anonymous")
    }
}

/// One grantable capability of the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub label: &'static str,
    pub url: &'static str,
}

/// Capabilities offered in the authorization menu, in menu order.
pub const SCOPES: [Scope; 13] = [
    Scope { label: "Group Provisioning", url: "https://apps-apis.google.com/a/feeds/groups/" },
    Scope { label: "Email Alias Provisioning", url: "https://apps-apis.google.com/a/feeds/alias/" },
    Scope { label: "Organizational Unit Provisioning", url: "https://apps-apis.google.com/a/feeds/policies/" },
    Scope { label: "User Provisioning", url: "https://apps-apis.google.com/a/feeds/user/" },
    Scope { label: "User Email Settings", url: "https://apps-apis.google.com/a/feeds/emailsettings/2.0/" },
    Scope { label: "Calendar Resources", url: "https://apps-apis.google.com/a/feeds/calendar/resource/" },
    Scope { label: "Audit Monitors, Activity and Mailbox Exports", url: "https://apps-apis.google.com/a/feeds/compliance/audit/" },
    Scope { label: "Admin Settings", url: "https://apps-apis.google.com/a/feeds/domain/" },
    Scope { label: "Admin Auditing", url: "https://www.googleapis.com/auth/apps/reporting/audit.readonly" },
    Scope { label: "Group Settings API", url: "https://www.googleapis.com/auth/apps.groups.settings" },
    Scope { label: "Profiles API (Hide / Unhide from contact sharing)", url: "https://www.google.com/m8/feeds" },
    Scope { label: "Calendar Data API", url: "https://www.google.com/calendar/feeds/" },
    Scope { label: "Reporting API", url: "https://www.google.com/hosted/services/v1.0/reports/ReportingData" },
];

pub const DEFAULT_DISPLAY_NAME: &str = "Google Apps Manager";

/// Percent-encodes per RFC 3986 (unreserved characters kept).
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// Splits a URL into its base (no query) and decoded query parameters.
fn split_url(url: &str) -> (String, Vec<(String, String)>) {
    let (base, query) = match url.split_once('?') {
        Some((b, q)) => (b, q),
        None => (url, ""),
    };
    let params = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(p), String::new()),
        })
        .collect();
    (normalize_base(base), params)
}

/// Lowercases scheme and host and drops default ports.
fn normalize_base(base: &str) -> String {
    let Some((scheme, rest)) = base.split_once("://") else {
        return base.to_string();
    };
    let scheme = scheme.to_lowercase();
    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let mut authority = authority.to_lowercase();
    let default_port = if scheme == "https" { ":443" } else { ":80" };
    if authority.ends_with(default_port) {
        authority.truncate(authority.len() - default_port.len());
    }
    format!("{}://{}{}", scheme, authority, path)
}

/// The signature base string for a request.
///
/// `oauth_params` are the protocol parameters (without `oauth_signature`);
/// query parameters of `url` are folded in.
pub fn signature_base_string(method: &str, url: &str, oauth_params: &[(String, String)]) -> String {
    let (base, mut params) = split_url(url);
    params.extend(oauth_params.iter().cloned());
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(&base),
        encode(&normalized)
    )
}

/// HMAC-SHA1 of the base string, base64 encoded.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> GamResult<String> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| GamError::Credentials(e.to_string()))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Per-request values that must differ between requests.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub timestamp: u64,
    pub nonce: String,
}

impl Nonce {
    pub fn fresh() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            timestamp,
            nonce: uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}

/// Builds the `Authorization` header value for a signed request.
///
/// `extra` carries additional protocol parameters such as `oauth_callback`
/// or `oauth_verifier`.
pub fn authorization_header(
    method: &str,
    url: &str,
    consumer: &KeyPair,
    token: Option<&KeyPair>,
    extra: &[(&str, &str)],
    nonce: &Nonce,
) -> GamResult<String> {
    let mut params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), consumer.key.clone()),
        ("oauth_nonce".into(), nonce.nonce.clone()),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), nonce.timestamp.to_string()),
        ("oauth_version".into(), "1.0".into()),
    ];
    if let Some(token) = token {
        params.push(("oauth_token".into(), token.key.clone()));
    }
    params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let base = signature_base_string(method, url, &params);
    let signature = sign(
        &base,
        &consumer.secret,
        token.map(|t| t.secret.as_str()).unwrap_or(""),
    )?;
    params.push(("oauth_signature".into(), signature));

    let fields = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {}", fields))
}

/// Parses a form-encoded token response.
pub fn parse_token_response(body: &str) -> Option<KeyPair> {
    let (_, params) = split_url(&format!("?{}", body.trim()));
    let get = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    Some(KeyPair::new(get("oauth_token")?, get("oauth_token_secret")?))
}

/// The provider's token endpoints.
#[derive(Debug, Clone)]
pub struct TokenEndpoints {
    base: String,
    client: reqwest::Client,
}

impl TokenEndpoints {
    pub fn new(base: &str, client: reqwest::Client) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn fetch(
        &self,
        url: &str,
        consumer: &KeyPair,
        token: Option<&KeyPair>,
        extra: &[(&str, &str)],
    ) -> GamResult<KeyPair> {
        let header = authorization_header("GET", url, consumer, token, extra, &Nonce::fresh())?;
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .header("Authorization", header)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_body(status.as_u16(), &body).into());
        }
        parse_token_response(&body)
            .ok_or_else(|| GamError::Credentials(format!("unexpected token response: {}", body)))
    }

    /// Step one: an unauthorized request token for `scopes`.
    ///
    /// A rejected timestamp exits 5 (the clock is wrong), any other failure 6.
    pub async fn request_token(
        &self,
        consumer: &KeyPair,
        scopes: &[&str],
        display_name: &str,
    ) -> GamResult<KeyPair> {
        let url = format!(
            "{}/accounts/OAuthGetRequestToken?scope={}&xoauth_displayname={}",
            self.base,
            encode(&scopes.join(" ")),
            encode(display_name)
        );
        self.fetch(&url, consumer, None, &[("oauth_callback", "oob")])
            .await
            .map_err(|e| {
                let text = e.to_string();
                if text.contains("Timestamp") || text.contains("timestamp") {
                    GamError::Auth {
                        message: "In order to use OAuth, your system time needs to be correct.\nPlease fix your time and try again.".to_string(),
                        code: 5,
                    }
                } else {
                    GamError::Auth {
                        message: format!("Error: {}", text),
                        code: 6,
                    }
                }
            })
    }

    /// Page where the operator grants access, restricted to `domain`.
    pub fn authorize_url(&self, request_token: &KeyPair, domain: &str) -> String {
        format!(
            "{}/accounts/OAuthAuthorizeToken?oauth_token={}&hd={}",
            self.base,
            encode(&request_token.key),
            encode(domain)
        )
    }

    /// Step three: exchanges the authorized request token. Failure exits 4.
    pub async fn access_token(
        &self,
        consumer: &KeyPair,
        request_token: &KeyPair,
        verifier: Option<&str>,
    ) -> GamResult<KeyPair> {
        let url = format!("{}/accounts/OAuthGetAccessToken", self.base);
        let extra: Vec<(&str, &str)> = verifier.map(|v| vec![("oauth_verifier", v)]).unwrap_or_default();
        self.fetch(&url, consumer, Some(request_token), &extra)
            .await
            .map_err(|_| GamError::Auth {
                message: "Failed to upgrade the token. Did you grant GAM access in your browser?".to_string(),
                code: 4,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_params() -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".into(), "dpf43f3p2l4k3l03".into()),
            ("oauth_token".into(), "nnch734d00sl2jdk".into()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), "1191242096".into()),
            ("oauth_nonce".into(), "kllo9940pd9333jh".into()),
            ("oauth_version".into(), "1.0".into()),
        ]
    }

    #[test]
    fn base_string_matches_published_example() {
        let base = signature_base_string(
            "GET",
            "http://photos.example.net/photos?file=vacation.jpg&size=original",
            &vector_params(),
        );
        assert_eq!(
            base,
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096%26oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal"
        );
        assert_eq!(
            sign(&base, "kd94hf93k423kf44", "pfkkdhi9sl3r4s00").unwrap(),
            "tR3+Ty81lMeYAr/Fid0kMTYa/WM="
        );
    }

    #[test]
    fn header_carries_signature_for_fixed_nonce() {
        let nonce = Nonce {
            timestamp: 1191242096,
            nonce: "kllo9940pd9333jh".into(),
        };
        let header = authorization_header(
            "GET",
            "http://photos.example.net/photos?file=vacation.jpg&size=original",
            &KeyPair::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44"),
            Some(&KeyPair::new("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00")),
            &[],
            &nonce,
        )
        .unwrap();
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature=\"tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D\""));
    }

    #[test]
    fn default_port_and_case_are_normalized() {
        assert_eq!(
            normalize_base("HTTPS://Apps-APIs.google.com:443/a/feeds"),
            "https://apps-apis.google.com/a/feeds"
        );
        assert_eq!(normalize_base("http://127.0.0.1:8080/x"), "http://127.0.0.1:8080/x");
    }

    #[test]
    fn token_response_is_form_decoded() {
        let token = parse_token_response("oauth_token=ab%2Fc&oauth_token_secret=s3cr3t").unwrap();
        assert_eq!(token, KeyPair::new("ab/c", "s3cr3t"));
        assert!(parse_token_response("oauth_token=only").is_none());
    }
}
