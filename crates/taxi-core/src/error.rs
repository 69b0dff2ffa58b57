//! Core error types for taxi-service.
//!
//! This module provides the error enum [`TaxiError`] covering HTTP errors,
//! storage errors, validation errors, configuration and template errors.
//! Every variant maps to an HTTP status code so the web layer can render it
//! directly.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// Validation errors can be either simple (a single message) or compound
/// (containing per-field error lists).
///
/// # Examples
///
/// ```
/// use taxi_core::error::ValidationError;
///
/// // Simple validation error
/// let err = ValidationError::new("This field is required.", "required");
///
/// // Field-level validation errors
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert(
///     "license_number".to_string(),
///     vec![ValidationError::new("Last 5 characters must be digits.", "invalid")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// assert_eq!(err.messages_for("license_number").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the type of validation failure (e.g. "required", "invalid").
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Builds a compound error from plain per-field message lists, as
    /// produced by form validation.
    pub fn from_messages(messages: &HashMap<String, Vec<String>>) -> Self {
        let field_errors = messages
            .iter()
            .map(|(field, msgs)| {
                let errors = msgs.iter().map(|m| Self::new(m.clone(), "invalid")).collect();
                (field.clone(), errors)
            })
            .collect();
        Self::with_field_errors(field_errors)
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns the messages recorded against a single field.
    pub fn messages_for(&self, field: &str) -> Vec<String> {
        self.field_errors
            .get(field)
            .map(|errors| errors.iter().map(|e| e.message.clone()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<_> = self.field_errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let mut first = true;
            for (field, errors) in fields {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for taxi-service.
///
/// Each variant maps to an appropriate HTTP status code via
/// [`TaxiError::status_code`].
#[derive(Error, Debug)]
pub enum TaxiError {
    // ── HTTP errors ──────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 401 Unauthorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 403 Forbidden / Permission Denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 405 Method Not Allowed.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Storage errors ───────────────────────────────────────────────

    /// A lookup expected exactly one row but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database integrity constraint other than uniqueness was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// A `UNIQUE` constraint was violated on the named column.
    #[error("Unique constraint violated on {field}: {message}")]
    UniqueViolation {
        /// The column (and form field) that collided.
        field: String,
        /// A user-facing message.
        message: String,
    },

    /// An operational database error (cannot open the file, etc.).
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Templates ────────────────────────────────────────────────────

    /// A template failed to parse or render.
    #[error("Template error: {0}")]
    TemplateError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TaxiError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `ValidationError` -> 400
    /// - `Unauthorized` -> 401
    /// - `PermissionDenied` -> 403
    /// - `NotFound`, `DoesNotExist` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - `UniqueViolation` -> 409
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) | Self::DoesNotExist(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::UniqueViolation { .. } => 409,
            Self::InternalServerError(_)
            | Self::DatabaseError(_)
            | Self::IntegrityError(_)
            | Self::OperationalError(_)
            | Self::ConfigurationError(_)
            | Self::TemplateError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` for errors caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// A convenience type alias for `Result<T, TaxiError>`.
pub type TaxiResult<T> = Result<T, TaxiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("This field is required.", "required");
        assert_eq!(err.to_string(), "This field is required.");
    }

    #[test]
    fn test_validation_error_display_field_errors() {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "license_number".to_string(),
            vec![ValidationError::new("Bad license.", "invalid")],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert!(err.to_string().contains("license_number: Bad license."));
    }

    #[test]
    fn test_validation_error_from_messages() {
        let mut messages = HashMap::new();
        messages.insert(
            "drivers".to_string(),
            vec!["This field is required.".to_string()],
        );
        let err = ValidationError::from_messages(&messages);
        assert_eq!(err.messages_for("drivers"), vec!["This field is required."]);
        assert!(err.messages_for("model").is_empty());
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Too long.", "max_length").with_param("max", "255");
        assert_eq!(err.params.get("max").unwrap(), "255");
    }

    #[test]
    fn test_taxi_error_status_codes() {
        assert_eq!(TaxiError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(TaxiError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(TaxiError::PermissionDenied("x".into()).status_code(), 403);
        assert_eq!(TaxiError::NotFound("x".into()).status_code(), 404);
        assert_eq!(TaxiError::MethodNotAllowed("x".into()).status_code(), 405);
        assert_eq!(TaxiError::InternalServerError("x".into()).status_code(), 500);
        assert_eq!(TaxiError::DoesNotExist("x".into()).status_code(), 404);
        assert_eq!(TaxiError::DatabaseError("x".into()).status_code(), 500);
        assert_eq!(TaxiError::IntegrityError("x".into()).status_code(), 500);
        assert_eq!(
            TaxiError::UniqueViolation {
                field: "username".into(),
                message: "taken".into()
            }
            .status_code(),
            409
        );
        assert_eq!(
            TaxiError::ValidationError(ValidationError::new("x", "y")).status_code(),
            400
        );
        assert_eq!(TaxiError::TemplateError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_client_error_classification() {
        assert!(TaxiError::NotFound("car".into()).is_client_error());
        assert!(!TaxiError::DatabaseError("locked".into()).is_client_error());
    }

    #[test]
    fn test_taxi_error_display() {
        let err = TaxiError::NotFound("car 7".into());
        assert_eq!(err.to_string(), "Not found: car 7");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: TaxiError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }
}
