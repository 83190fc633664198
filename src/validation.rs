//! Name, address and domain checks.

use regex::Regex;
use std::sync::OnceLock;

/// Provides domain name validation functionality
#[derive(Debug, Default)]
pub struct DomainValidator;

impl DomainValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates a domain name for format and syntax
    ///
    /// This function checks that the domain:
    /// - Contains at least one dot (.)
    /// - Has a TLD of at least 2 characters
    /// - Does not exceed 253 characters
    /// - Consists of letters, digits, hyphens and dots
    /// - Has no empty label and no label over 63 characters
    /// - Has no label starting or ending with a hyphen
    pub fn validate_domain_format(&self, domain: &str) -> bool {
        if domain.is_empty() || domain.len() > 253 || !domain.contains('.') {
            return false;
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.last().map_or(true, |tld| tld.len() < 2) {
            return false;
        }

        labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        })
    }
}

/// Validates a domain name and returns an error message if invalid
pub fn validate_domain(domain: &str) -> Result<(), String> {
    if !DomainValidator::new().validate_domain_format(domain) {
        return Err(format!("Invalid domain format: {}", domain));
    }
    Ok(())
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+'\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").ok())
        .as_ref()
}

/// Loose syntactic check for a full email address.
pub fn is_email(address: &str) -> bool {
    email_pattern().is_some_and(|p| p.is_match(address))
}

/// Splits `user@domain`; the domain is `None` for a bare name.
///
/// # Examples
///
/// ```
/// use gam::validation::split_address;
///
/// assert_eq!(split_address("jsmith@example.org"), ("jsmith", Some("example.org")));
/// assert_eq!(split_address("jsmith"), ("jsmith", None));
/// ```
pub fn split_address(address: &str) -> (&str, Option<&str>) {
    match address.find('@') {
        Some(at) if at > 0 => (&address[..at], Some(&address[at + 1..])),
        _ => (address, None),
    }
}

/// Local part and domain, defaulting to `domain` for a bare name.
pub fn user_and_domain(address: &str, domain: &str) -> (String, String) {
    let (user, user_domain) = split_address(address);
    (
        user.to_string(),
        user_domain.unwrap_or(domain).to_string(),
    )
}

/// Appends `@domain` to a bare name.
pub fn qualify(address: &str, domain: &str) -> String {
    match split_address(address) {
        (_, Some(_)) => address.to_string(),
        (user, None) => format!("{}@{}", user, domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_only_touches_bare_names() {
        assert_eq!(qualify("jsmith", "example.com"), "jsmith@example.com");
        assert_eq!(qualify("jsmith@other.org", "example.com"), "jsmith@other.org");
        assert_eq!(
            user_and_domain("sales@other.org", "example.com"),
            ("sales".to_string(), "other.org".to_string())
        );
    }

    #[test]
    fn email_check() {
        assert!(is_email("admin@example.com"));
        assert!(is_email("o'brien@sub.example.co.uk"));
        assert!(!is_email("admin"));
        assert!(!is_email("admin@localhost"));
    }
}
