//! Settings for taxi-service.
//!
//! [`Settings`] holds every configurable value with sensible defaults. It is
//! serializable so that [`settings_loader`](crate::settings_loader) can merge a
//! partial TOML file over the defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// SQLite database configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Path to the database file, or `:memory:` for a transient database.
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("taxi.sqlite3"),
        }
    }
}

impl DatabaseSettings {
    /// Returns `true` if this configuration points at an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use taxi_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.debug);
/// assert_eq!(settings.paginate_by, 5);
/// assert_eq!(settings.login_url, "/accounts/login/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The secret key. Must be set in production.
    pub secret_key: String,
    /// Hostnames that this application can serve.
    pub allowed_hosts: Vec<String>,
    /// Address the development server binds to.
    pub bind_address: String,

    // ── Database ─────────────────────────────────────────────────────

    /// Database configuration.
    pub database: DatabaseSettings,

    // ── Auth & sessions ──────────────────────────────────────────────

    /// The name of the session cookie.
    pub session_cookie_name: String,
    /// The session cookie max age in seconds.
    pub session_cookie_age: u64,
    /// Where anonymous users are sent when a page requires login.
    pub login_url: String,
    /// Where users land after logging in without a `next` parameter.
    pub login_redirect_url: String,

    // ── Views ────────────────────────────────────────────────────────

    /// Number of objects per page on list views.
    pub paginate_by: usize,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter (e.g. "info", "debug", "taxi_db=debug,info").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            secret_key: String::new(),
            allowed_hosts: vec!["127.0.0.1".to_string(), "localhost".to_string()],
            bind_address: "127.0.0.1:8000".to_string(),
            database: DatabaseSettings::default(),
            session_cookie_name: "sessionid".to_string(),
            session_cookie_age: 1_209_600, // 2 weeks
            login_url: "/accounts/login/".to_string(),
            login_redirect_url: "/".to_string(),
            paginate_by: 5,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Settings suited to tests: debug on, in-memory database.
    pub fn for_testing() -> Self {
        Self {
            debug: true,
            secret_key: "test-secret-key".to_string(),
            database: DatabaseSettings {
                path: PathBuf::from(":memory:"),
            },
            log_level: "warn".to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(!s.debug);
        assert_eq!(s.session_cookie_name, "sessionid");
        assert_eq!(s.session_cookie_age, 1_209_600);
        assert_eq!(s.login_redirect_url, "/");
        assert_eq!(s.database.path, PathBuf::from("taxi.sqlite3"));
        assert!(!s.database.is_memory());
    }

    #[test]
    fn test_testing_settings_use_memory_database() {
        let s = Settings::for_testing();
        assert!(s.debug);
        assert!(s.database.is_memory());
        assert_eq!(s.paginate_by, 5);
    }

    #[test]
    fn test_settings_serialize_roundtrip() {
        let s = Settings::default();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["bind_address"], "127.0.0.1:8000");
        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back.database, s.database);
    }
}
