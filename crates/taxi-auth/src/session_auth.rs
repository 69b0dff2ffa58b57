//! Recording the logged-in driver in a session.
//!
//! ## Session keys
//!
//! - `_auth_user_id` - the driver's primary key
//! - `_auth_user_hash` - an HMAC of the driver's full password hash, keyed
//!   by the secret key; when the password changes, sessions holding the old
//!   value no longer resolve to a user

use serde_json::json;
use taxi_core::{TaxiError, TaxiResult};
use taxi_db::{Driver, TaxiStore};
use taxi_http::cookies::{sign_cookie_value, verify_signed_cookie};

use crate::sessions::SessionData;

/// Session key for the driver id.
pub const SESSION_USER_KEY: &str = "_auth_user_id";
/// Session key for the password hash fingerprint.
pub const SESSION_HASH_KEY: &str = "_auth_user_hash";

const SESSION_HASH_SALT: &str = "taxi.auth.session_auth_hash";

/// Fingerprint of a password hash stored in the session.
pub fn session_auth_hash(password_hash: &str, secret_key: &str) -> TaxiResult<String> {
    let signed = sign_cookie_value(password_hash, secret_key, SESSION_HASH_SALT)
        .map_err(|e| TaxiError::ConfigurationError(format!("Cannot sign session hash: {e}")))?;
    Ok(signed
        .rsplit_once(':')
        .map(|(_, mac)| mac.to_string())
        .unwrap_or_default())
}

fn hash_matches(password_hash: &str, fingerprint: &str, secret_key: &str) -> bool {
    verify_signed_cookie(
        &format!("{password_hash}:{fingerprint}"),
        secret_key,
        SESSION_HASH_SALT,
    )
    .is_ok()
}

/// Records `driver` as the session's user, cycling the session key.
pub fn login(session: &mut SessionData, driver: &Driver, secret_key: &str) -> TaxiResult<()> {
    let fingerprint = session_auth_hash(&driver.password, secret_key)?;
    session.cycle_key();
    session.set(SESSION_USER_KEY, json!(driver.id));
    session.set(SESSION_HASH_KEY, json!(fingerprint));
    Ok(())
}

/// The driver id recorded in the session, if any.
pub fn session_user_id(session: &SessionData) -> Option<i64> {
    session.get(SESSION_USER_KEY).and_then(serde_json::Value::as_i64)
}

/// Resolves the session's driver.
///
/// Returns `None` when no one is logged in, the driver is gone or
/// inactive, or the password changed since login.
pub async fn get_user(
    store: &TaxiStore,
    session: &SessionData,
    secret_key: &str,
) -> TaxiResult<Option<Driver>> {
    let Some(id) = session_user_id(session) else {
        return Ok(None);
    };
    let driver = match store.get_driver(id).await {
        Ok(driver) => driver,
        Err(TaxiError::DoesNotExist(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let stored_hash = session
        .get(SESSION_HASH_KEY)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    if !hash_matches(&driver.password, stored_hash, secret_key) {
        tracing::debug!(driver_id = id, "Session hash no longer matches password");
        return Ok(None);
    }
    if !driver.is_active {
        return Ok(None);
    }
    Ok(Some(driver))
}
