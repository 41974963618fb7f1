//! Field validation for the values otpgate accepts from users.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("code must be exactly {expected} digits, got {actual}")]
    CodeLength { expected: usize, actual: usize },
    #[error("code must contain digits only")]
    NonDigit,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Returns the trimmed address when it looks like an email.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    if is_valid_email(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidEmail(trimmed.to_string()))
    }
}

/// Validates a code typed in one piece (CLI input): exactly `length` ASCII digits.
pub fn validate_code(code: &str, length: usize) -> Result<String, ValidationError> {
    let trimmed = code.trim();
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::NonDigit);
    }
    let actual = trimmed.chars().count();
    if actual != length {
        return Err(ValidationError::CodeLength { expected: length, actual });
    }
    Ok(trimmed.to_string())
}

/// Extracts the ASCII digits of `text` in order, keeping at most `limit`.
pub fn extract_digits(text: &str, limit: usize) -> Vec<char> {
    text.chars().filter(char::is_ascii_digit).take(limit).collect()
}
