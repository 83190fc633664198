//! The persisted credential record.
//!
//! One JSON document per file:
//!
//! ```json
//! {"version":1,"domain":"example.com","consumer_key":"anonymous",
//!  "consumer_secret":"anonymous","token":"..","token_secret":"..",
//!  "scopes":["https://apps-apis.google.com/a/feeds/user/"],
//!  "display_name":"Google Apps Manager"}
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{GamError, GamResult};
use crate::oauth::KeyPair;

pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub version: u32,
    /// Primary domain of the organization
    pub domain: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub display_name: String,
}

impl CredentialRecord {
    pub fn new(domain: impl Into<String>, consumer: &KeyPair, token: &KeyPair) -> Self {
        Self {
            version: RECORD_VERSION,
            domain: domain.into(),
            consumer_key: consumer.key.clone(),
            consumer_secret: consumer.secret.clone(),
            token: token.key.clone(),
            token_secret: token.secret.clone(),
            scopes: Vec::new(),
            display_name: String::new(),
        }
    }

    pub fn consumer(&self) -> KeyPair {
        KeyPair::new(&self.consumer_key, &self.consumer_secret)
    }

    pub fn access_token(&self) -> KeyPair {
        KeyPair::new(&self.token, &self.token_secret)
    }
}

/// Reads the record at `path`.
///
/// Returns `Ok(None)` when the file does not exist. A file in any other
/// layout, including the old "domain line + serialized token" format, is an
/// error so the caller can offer to authorize again.
pub fn load(path: &Path) -> GamResult<Option<CredentialRecord>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(GamError::Credentials(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };
    let record: CredentialRecord = serde_json::from_str(&content).map_err(|e| {
        GamError::Credentials(format!(
            "{} is not a valid credential file ({}); it may have been written by an older version",
            path.display(),
            e
        ))
    })?;
    if record.version != RECORD_VERSION {
        return Err(GamError::Credentials(format!(
            "{} has unsupported version {}",
            path.display(),
            record.version
        )));
    }
    debug!("loaded credentials for {} from {}", record.domain, path.display());
    Ok(Some(record))
}

/// Writes the record, readable by the owner only.
pub fn save(path: &Path, record: &CredentialRecord) -> GamResult<()> {
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    debug!("saved credentials to {}", path.display());
    Ok(())
}
