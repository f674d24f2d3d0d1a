use lettre::Address;

use crate::error::{DloError, Result};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Trim a required free-text field, rejecting it when nothing is left.
pub fn required(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DloError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Trim and check an email address without changing its case.
pub fn email_address(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Address>()
        .map_err(|e| DloError::InvalidEmail {
            address: trimmed.to_string(),
            reason: e.to_string(),
        })?;
    Ok(trimmed.to_string())
}

/// Account emails are unique case-insensitively, so they are stored lowercased.
pub fn account_email(raw: &str) -> Result<String> {
    email_address(&raw.to_lowercase())
}

pub fn password(pw: &str) -> Result<()> {
    if pw.chars().count() < MIN_PASSWORD_LEN {
        return Err(DloError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_email_is_trimmed_and_lowercased() {
        assert_eq!(account_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    }

    #[test]
    fn recipient_keeps_case() {
        assert_eq!(email_address("Bob@Example.com").unwrap(), "Bob@Example.com");
    }

    #[test]
    fn malformed_email_rejected() {
        for bad in ["", "no-at-sign", "a@", "@b.com"] {
            let err = email_address(bad).unwrap_err();
            assert_eq!(err.code(), "INVALID_EMAIL", "{bad:?}");
        }
    }

    #[test]
    fn password_length() {
        assert!(password("12345").is_err());
        assert!(password("123456").is_ok());
    }

    #[test]
    fn required_field() {
        assert_eq!(required("title", "  hi ").unwrap(), "hi");
        match required("title", "   ") {
            Err(DloError::MissingField { field }) => assert_eq!(field, "title"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
