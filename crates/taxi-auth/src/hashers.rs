//! Password hashing and validation.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings
//! (`$argon2id$v=19$...`). Hashing and verification are CPU-bound, so both
//! run on the blocking thread pool.
//!
//! # Validators
//!
//! - [`MinimumLengthValidator`] - at least 8 characters
//! - [`CommonPasswordValidator`] - not a well-known password
//! - [`NumericPasswordValidator`] - not entirely digits
//! - [`UserAttributeSimilarityValidator`] - not too close to the username or name

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use taxi_core::{TaxiError, TaxiResult};

/// Prefix marking a password that can never match.
const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// Hashes a password with Argon2id.
pub async fn make_password(password: &str) -> TaxiResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| TaxiError::InternalServerError(format!("Argon2 hash error: {e}")))
    })
    .await
    .map_err(|e| TaxiError::InternalServerError(format!("Task join error: {e}")))?
}

/// Checks a password against a stored hash. Unusable or malformed hashes
/// never match.
pub async fn check_password(password: &str, hash: &str) -> TaxiResult<bool> {
    if !is_password_usable(hash) {
        return Ok(false);
    }
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&hash) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| TaxiError::InternalServerError(format!("Task join error: {e}")))
}

/// Returns `true` unless the hash is empty or marked unusable.
pub fn is_password_usable(hash: &str) -> bool {
    !hash.is_empty() && !hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// A hash that no password matches, for accounts without a password.
pub fn unusable_password() -> String {
    format!("{UNUSABLE_PASSWORD_PREFIX}{}", crate::sessions::generate_key(40))
}

// ── Password validators ─────────────────────────────────────────────

/// Checks one password rule.
pub trait PasswordValidator: Send + Sync {
    /// Validates `password`; `attributes` are the account's username and
    /// names, for validators that compare against them.
    fn validate(&self, password: &str, attributes: &[&str]) -> Result<(), String>;

    /// Describes the rule for help text.
    fn help_text(&self) -> String;
}

/// Requires a minimum number of characters.
#[derive(Debug, Clone)]
pub struct MinimumLengthValidator {
    /// The minimum length in characters.
    pub min_length: usize,
}

impl Default for MinimumLengthValidator {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordValidator for MinimumLengthValidator {
    fn validate(&self, password: &str, _attributes: &[&str]) -> Result<(), String> {
        if password.chars().count() < self.min_length {
            Err(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ))
        } else {
            Ok(())
        }
    }

    fn help_text(&self) -> String {
        format!(
            "Your password must contain at least {} characters.",
            self.min_length
        )
    }
}

/// Rejects passwords from a list of commonly used ones (case-insensitive).
#[derive(Debug, Clone)]
pub struct CommonPasswordValidator {
    common: Vec<&'static str>,
}

impl Default for CommonPasswordValidator {
    fn default() -> Self {
        Self {
            common: vec![
                "password", "password1", "12345678", "123456789", "1234567890", "qwerty123",
                "qwertyuiop", "iloveyou", "sunshine", "football", "baseball", "princess",
                "superman", "trustno1", "whatever", "starwars", "letmein1", "welcome1",
                "passw0rd", "michelle", "computer", "corvette", "mercedes", "1q2w3e4r",
                "zaq12wsx", "abcd1234", "changeme", "internet", "dragon12", "monkey12",
            ],
        }
    }
}

impl PasswordValidator for CommonPasswordValidator {
    fn validate(&self, password: &str, _attributes: &[&str]) -> Result<(), String> {
        let lower = password.to_lowercase();
        if self.common.iter().any(|p| *p == lower) {
            Err("This password is too common.".to_string())
        } else {
            Ok(())
        }
    }

    fn help_text(&self) -> String {
        "Your password can't be a commonly used password.".to_string()
    }
}

/// Rejects passwords made only of digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericPasswordValidator;

impl PasswordValidator for NumericPasswordValidator {
    fn validate(&self, password: &str, _attributes: &[&str]) -> Result<(), String> {
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            Err("This password is entirely numeric.".to_string())
        } else {
            Ok(())
        }
    }

    fn help_text(&self) -> String {
        "Your password can't be entirely numeric.".to_string()
    }
}

/// Rejects passwords too similar to one of the account attributes.
#[derive(Debug, Clone)]
pub struct UserAttributeSimilarityValidator {
    /// Similarity ratio at or above which a password is rejected.
    pub max_similarity: f64,
}

impl Default for UserAttributeSimilarityValidator {
    fn default() -> Self {
        Self {
            max_similarity: 0.7,
        }
    }
}

impl PasswordValidator for UserAttributeSimilarityValidator {
    fn validate(&self, password: &str, attributes: &[&str]) -> Result<(), String> {
        let password = password.to_lowercase();
        let too_similar = attributes
            .iter()
            .filter(|a| !a.is_empty())
            .any(|a| similarity(&password, &a.to_lowercase()) >= self.max_similarity);
        if too_similar {
            Err("The password is too similar to your personal information.".to_string())
        } else {
            Ok(())
        }
    }

    fn help_text(&self) -> String {
        "Your password can't be too similar to your other personal information.".to_string()
    }
}

/// Similarity ratio in `0.0..=1.0`: twice the longest common subsequence
/// over the combined length.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = (2 * prev[b.len()]) as f64 / (a.len() + b.len()) as f64;
    ratio
}

/// The validators applied to new passwords.
pub fn default_validators() -> Vec<Box<dyn PasswordValidator>> {
    vec![
        Box::new(UserAttributeSimilarityValidator::default()),
        Box::new(MinimumLengthValidator::default()),
        Box::new(CommonPasswordValidator::default()),
        Box::new(NumericPasswordValidator),
    ]
}

/// Runs every default validator and collects all failures.
pub fn validate_password(password: &str, attributes: &[&str]) -> Result<(), Vec<String>> {
    let errors: Vec<String> = default_validators()
        .iter()
        .filter_map(|v| v.validate(password, attributes).err())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_check() {
        let hash = make_password("poiuytre123456").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(check_password("poiuytre123456", &hash).await.unwrap());
        assert!(!check_password("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = make_password("same").await.unwrap();
        let b = make_password("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_unusable_and_malformed_hashes_never_match() {
        assert!(!check_password("", "").await.unwrap());
        assert!(!check_password("x", &unusable_password()).await.unwrap());
        assert!(!check_password("password", "password").await.unwrap());
        assert!(!is_password_usable("!abc"));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("poiuytre123456", &["new_user"]).is_ok());
    }

    #[test]
    fn test_validate_password_collects_all_errors() {
        let errors = validate_password("1234567", &[]).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "This password is too short. It must contain at least 8 characters.",
                "This password is entirely numeric.",
            ]
        );
        let errors = validate_password("Password", &[]).unwrap_err();
        assert_eq!(errors, vec!["This password is too common."]);
    }

    #[test]
    fn test_similarity_to_username() {
        let errors = validate_password("johnsmith1", &["johnsmith"]).unwrap_err();
        assert_eq!(
            errors,
            vec!["The password is too similar to your personal information."]
        );
        assert!(validate_password("x7#kQ29!vb", &["johnsmith", ""]).is_ok());
    }

    #[test]
    fn test_help_texts() {
        assert!(default_validators()
            .iter()
            .all(|v| v.help_text().starts_with("Your password")));
    }
}
