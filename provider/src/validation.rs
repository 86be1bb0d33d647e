// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Field validators shared by the provider configuration and resource models.

use validator::ValidationError;

use crate::constants::{MAX_SAFE_NAME_LENGTH, SAFE_NAME_FORBIDDEN_CHARS};

/// Validates AWS region format (e.g., "us-east-1", "eu-west-2")
/// Pattern: two lowercase letters, hyphen, lowercase letters, hyphen, digits
pub fn validate_aws_region(region: &str) -> Result<(), ValidationError> {
    if is_aws_region(region) {
        return Ok(());
    }
    Err(ValidationError::new("invalid_aws_region")
        .with_message(format!("{region:?} is not an AWS region code such as \"us-east-1\"").into()))
}

fn is_aws_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return false;
    };
    if parts.len() < 3 {
        return false;
    }

    if first.len() != 2 || !first.chars().all(|c| c.is_ascii_lowercase()) {
        return false;
    }

    let middle = parts.iter().skip(1).take(parts.len() - 2);
    for part in middle {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_lowercase()) {
            return false;
        }
    }

    !last.is_empty() && last.chars().all(|c| c.is_ascii_digit())
}

/// AWS account IDs are exactly 12 digits.
pub fn validate_aws_account_id(account_id: &str) -> Result<(), ValidationError> {
    if account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("invalid_aws_account_id"));
    }
    Ok(())
}

/// Tenant IDs and Privilege Cloud subdomains end up as a DNS label.
pub fn validate_dns_label(label: &str) -> Result<(), ValidationError> {
    let valid = !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err(ValidationError::new("invalid_dns_label"));
    }
    Ok(())
}

pub fn validate_safe_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || name.chars().count() as u64 > MAX_SAFE_NAME_LENGTH {
        return Err(ValidationError::new("invalid_safe_name_length"));
    }
    if name.contains(SAFE_NAME_FORBIDDEN_CHARS) {
        return Err(ValidationError::new("invalid_safe_name_characters"));
    }
    Ok(())
}

pub fn validate_https_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "https" && url.host_str().is_some() => Ok(()),
        _ => Err(ValidationError::new("invalid_https_url")),
    }
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    match value.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::new("invalid_email")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_region() {
        assert!(validate_aws_region("us-east-1").is_ok());
        assert!(validate_aws_region("ap-southeast-2").is_ok());
        assert!(validate_aws_region("us-gov-west-1").is_ok());
        assert!(validate_aws_region("useast1").is_err());
        assert!(validate_aws_region("US-east-1").is_err());
        assert!(validate_aws_region("us-east-").is_err());
        assert!(validate_aws_region("").is_err());
    }

    #[test]
    fn test_aws_region_error_names_value() {
        let err = validate_aws_region("Virginia").unwrap_err();
        assert_eq!(err.code, "invalid_aws_region");
        assert!(err.to_string().contains("\"Virginia\" is not an AWS region code"));
    }

    #[test]
    fn test_aws_account_id() {
        assert!(validate_aws_account_id("123456789012").is_ok());
        assert!(validate_aws_account_id("12345678901").is_err());
        assert!(validate_aws_account_id("12345678901a").is_err());
    }

    #[test]
    fn test_dns_label() {
        assert!(validate_dns_label("abc1234").is_ok());
        assert!(validate_dns_label("my-company").is_ok());
        assert!(validate_dns_label("-bad").is_err());
        assert!(validate_dns_label("bad domain").is_err());
        assert!(validate_dns_label("a.b").is_err());
        assert!(validate_dns_label("").is_err());
    }

    #[test]
    fn test_safe_name() {
        assert!(validate_safe_name("TF_SAFE").is_ok());
        assert!(validate_safe_name("My Safe").is_ok());
        assert!(validate_safe_name("a/b").is_err());
        assert!(validate_safe_name("what?").is_err());
        assert!(validate_safe_name("   ").is_err());
        assert!(validate_safe_name(&"x".repeat(29)).is_err());
        assert!(validate_safe_name(&"x".repeat(28)).is_ok());
    }

    #[test]
    fn test_https_url() {
        assert!(validate_https_url("https://myvault.vault.azure.net/").is_ok());
        assert!(validate_https_url("http://myvault.vault.azure.net/").is_err());
        assert!(validate_https_url("not a url").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("sync@project.iam.gserviceaccount.com").is_ok());
        assert!(validate_email("sync").is_err());
        assert!(validate_email("@project.com").is_err());
    }
}
