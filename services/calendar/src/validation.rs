//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{ApiError, ApiResult};

/// Minimum number of characters of a plain password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate email
pub fn validate_email(email: &str) -> ApiResult<()> {
    if email.is_empty() {
        return Err(ApiError::InvalidData("Email is required".to_string()));
    }

    if email.len() > 254 {
        return Err(ApiError::InvalidEmailFormat);
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ApiError::InvalidEmailFormat);
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::PasswordTooShort);
    }

    Ok(())
}

/// Require a non-blank string field
pub fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidData(format!("{field} is required")));
    }

    Ok(())
}

/// Event durations are whole minutes, at least one
pub fn validate_duration(duration: i32) -> ApiResult<()> {
    if duration < 1 {
        return Err(ApiError::InvalidDuration);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("j@x.io").is_ok());
        assert!(validate_email("first.last+tag@example.co.uk").is_ok());

        assert!(matches!(validate_email(""), Err(ApiError::InvalidData(_))));
        assert_eq!(validate_email("no-at-sign"), Err(ApiError::InvalidEmailFormat));
        assert_eq!(validate_email("j@x"), Err(ApiError::InvalidEmailFormat));
        assert_eq!(
            validate_email(&format!("{}@x.io", "a".repeat(260))),
            Err(ApiError::InvalidEmailFormat)
        );
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("123456").is_ok());
        assert_eq!(validate_password("12345"), Err(ApiError::PasswordTooShort));
        assert_eq!(validate_password(""), Err(ApiError::PasswordTooShort));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("title", "Work").is_ok());
        assert_eq!(
            require_non_empty("title", "   "),
            Err(ApiError::InvalidData("title is required".to_string()))
        );
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(1).is_ok());
        assert!(validate_duration(90).is_ok());
        assert_eq!(validate_duration(0), Err(ApiError::InvalidDuration));
        assert_eq!(validate_duration(-15), Err(ApiError::InvalidDuration));
    }
}
