//! Reusable value validators.
//!
//! A [`Validator`] inspects an already-cleaned [`Value`] and either accepts
//! it or reports a [`ValidationError`]. Fields run their validators only
//! after type cleaning succeeded.
//!
//! The license-number rule lives here as a plain function,
//! [`validate_license_number`], so that storage-free callers (the admin,
//! tests) can apply it without building a form.

use std::fmt;

use taxi_core::ValidationError;

use crate::value::Value;

/// The exact length of a driver's license number.
pub const LICENSE_NUMBER_LENGTH: usize = 8;

/// Number of leading uppercase letters in a license number.
const LICENSE_PREFIX_LEN: usize = 3;

/// A validator applied to a cleaned field value.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the value.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Returns a short name used in logs and debugging output.
    fn name(&self) -> &str;
}

/// Checks the license-number format: exactly 8 characters, the first 3
/// uppercase ASCII letters, the last 5 ASCII digits.
///
/// Rules are checked in that order and the first failure is reported.
pub fn validate_license_number(license_number: &str) -> Result<(), ValidationError> {
    let chars: Vec<char> = license_number.chars().collect();
    if chars.len() != LICENSE_NUMBER_LENGTH {
        return Err(ValidationError::new(
            "License number must consist of exactly 8 characters.",
            "license_length",
        )
        .with_param("length", chars.len().to_string()));
    }
    if !chars[..LICENSE_PREFIX_LEN].iter().all(char::is_ascii_uppercase) {
        return Err(ValidationError::new(
            "First 3 characters must be uppercase letters.",
            "license_prefix",
        ));
    }
    if !chars[LICENSE_PREFIX_LEN..].iter().all(char::is_ascii_digit) {
        return Err(ValidationError::new(
            "Last 5 characters must be digits.",
            "license_digits",
        ));
    }
    Ok(())
}

/// Field validator wrapping [`validate_license_number`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LicenseNumberValidator;

impl Validator for LicenseNumberValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        validate_license_number(value.as_str().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "LicenseNumberValidator"
    }
}

/// Usernames may contain letters, digits, and `@ . + - _`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameValidator;

impl Validator for UsernameValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let username = value.as_str().unwrap_or_default();
        let ok = username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
        if ok {
            Ok(())
        } else {
            Err(ValidationError::new(
                "Enter a valid username. This value may contain only letters, numbers, \
                 and @/./+/-/_ characters.",
                "invalid",
            ))
        }
    }

    fn name(&self) -> &str {
        "UsernameValidator"
    }
}
