//! Error types shared by the transport, the API clients and the handlers.
//!
//! Library code returns [`GamError`]; handlers wrap it in `anyhow` with
//! context and `main` walks the chain to find the process exit code.

use thiserror::Error;

/// Detailed error reported by the provider for a failed call.
///
/// The provisioning family encodes failures as
/// `<AppsForYourDomainErrors><error errorCode=".." invalidInput=".." reason=".."/>`,
/// the JSON families as `{"error": {"message": ..}}`. Anything else keeps the
/// raw body as the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub reason: String,
    pub invalid_input: String,
    pub error_code: String,
    pub body: String,
}

impl ApiError {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            invalid_input: String::new(),
            error_code: String::new(),
            body: String::new(),
        }
    }

    /// Builds an error from a failed response body.
    pub fn from_body(status: u16, body: &str) -> Self {
        if let Some(mut err) = crate::xml::parse_error_body(body) {
            err.status = status;
            err.body = body.to_string();
            return err;
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(message) = value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
            {
                return Self {
                    status,
                    reason: message.to_string(),
                    invalid_input: String::new(),
                    error_code: value
                        .pointer("/error/code")
                        .map(|c| c.to_string())
                        .unwrap_or_default(),
                    body: body.to_string(),
                };
            }
        }
        let reason = body.trim();
        Self {
            status,
            reason: if reason.is_empty() {
                format!("HTTP {}", status)
            } else {
                reason.to_string()
            },
            invalid_input: String::new(),
            error_code: String::new(),
            body: body.to_string(),
        }
    }

    pub fn is_reason(&self, reason: &str) -> bool {
        self.reason == reason
    }

    /// True for the transient conditions the transport retries.
    pub fn is_transient(&self) -> bool {
        self.status == 429 || self.status >= 500 || self.reason == "ServerBusy"
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.invalid_input.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{} - {}", self.reason, self.invalid_input)
        }
    }
}

#[derive(Debug, Error)]
pub enum GamError {
    #[error("{message}")]
    Usage { message: String, code: i32 },

    #[error("Error: {0}")]
    Api(ApiError),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed XML from provider: {0}")]
    Xml(String),

    #[error("credentials: {0}")]
    Credentials(String),

    #[error("{message}")]
    Auth { message: String, code: i32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Failed { message: String, code: i32 },
}

impl GamError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            code: 2,
        }
    }

    pub fn usage_code(message: impl Into<String>, code: i32) -> Self {
        Self::Usage {
            message: message.into(),
            code,
        }
    }

    pub fn failed(message: impl Into<String>, code: i32) -> Self {
        Self::Failed {
            message: message.into(),
            code,
        }
    }

    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { code, .. } | Self::Auth { code, .. } | Self::Failed { code, .. } => *code,
            _ => 1,
        }
    }
}

impl From<ApiError> for GamError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<quick_xml::Error> for GamError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

pub type GamResult<T> = std::result::Result<T, GamError>;

/// Finds the provider error anywhere in an `anyhow` chain.
pub fn api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.chain()
        .filter_map(|e| e.downcast_ref::<GamError>())
        .find_map(GamError::api)
}

/// Exit status for an error chain; the first [`GamError`] wins.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .filter_map(|e| e.downcast_ref::<GamError>())
        .map(GamError::exit_code)
        .next()
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_error_body_is_decoded() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<AppsForYourDomainErrors>
  <error errorCode="1301" invalidInput="jdoe" reason="EntityDoesNotExist" />
</AppsForYourDomainErrors>"#;
        let err = ApiError::from_body(400, body);
        assert_eq!(err.reason, "EntityDoesNotExist");
        assert_eq!(err.invalid_input, "jdoe");
        assert_eq!(err.error_code, "1301");
        assert_eq!(err.to_string(), "EntityDoesNotExist - jdoe");
    }

    #[test]
    fn json_error_body_uses_message() {
        let err = ApiError::from_body(403, r#"{"error":{"code":403,"message":"Forbidden"}}"#);
        assert_eq!(err.reason, "Forbidden");
        assert_eq!(err.error_code, "403");
    }

    #[test]
    fn plain_body_becomes_reason() {
        let err = ApiError::from_body(401, "Token invalid - Invalid token: Timestamp");
        assert_eq!(err.reason, "Token invalid - Invalid token: Timestamp");
        assert!(!err.is_transient());
        assert!(ApiError::new(503, "x").is_transient());
        assert!(ApiError::new(400, "ServerBusy").is_transient());
    }

    #[test]
    fn exit_code_comes_from_first_gam_error() {
        let err = anyhow::Error::new(GamError::failed("bad", 22)).context("while creating user");
        assert_eq!(exit_code(&err), 22);
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }
}
