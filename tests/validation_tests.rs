use gam::validation::{is_email, qualify, split_address, user_and_domain, validate_domain, DomainValidator};

#[test]
fn test_valid_domain_formats() {
    let validator = DomainValidator::new();
    assert!(validator.validate_domain_format("example.com"));
    assert!(validator.validate_domain_format("mail.example.com"));
    assert!(validator.validate_domain_format("sub-domain.example.co.uk"));
    assert!(validator.validate_domain_format("123.example.com"));
}

#[test]
fn test_invalid_domain_formats() {
    let validator = DomainValidator::new();
    assert!(!validator.validate_domain_format(""));
    assert!(!validator.validate_domain_format(&"x".repeat(254)));
    assert!(!validator.validate_domain_format("example"));
    assert!(!validator.validate_domain_format("example."));
    assert!(!validator.validate_domain_format(".example.com"));
    assert!(!validator.validate_domain_format("sub..example.com"));
    assert!(!validator.validate_domain_format("-example.com"));
    assert!(!validator.validate_domain_format("exam!ple.com"));
    assert!(!validator.validate_domain_format("example.c"));
    assert!(!validator.validate_domain_format(&("x".repeat(64) + ".com")));
}

#[test]
fn test_validate_domain_message() {
    assert!(validate_domain("example.com").is_ok());
    let err = validate_domain("invalid..domain").unwrap_err();
    assert!(err.contains("Invalid domain format"));
}

#[test]
fn test_addresses_default_to_primary_domain() {
    assert_eq!(split_address("@example.com"), ("@example.com", None));
    assert_eq!(
        user_and_domain("jsmith", "example.com"),
        ("jsmith".to_string(), "example.com".to_string())
    );
    assert_eq!(qualify("sales", "example.com"), "sales@example.com");
    assert!(is_email("admin.secondary@example.org"));
    assert!(!is_email("admin secondary@example.org"));
}
