//! Axum extractors for session-backed authentication.
//!
//! - [`Session`] - the request's session, or a fresh unsaved one
//! - [`CurrentUser`] - the logged-in driver; anonymous requests are
//!   redirected to `login_url?next=<path>`
//! - [`StaffUser`] - a logged-in staff driver; others get `403 Forbidden`
//!
//! Handlers get these through any router state implementing [`AuthState`].
//!
//! The session cookie carries `key:signature`, signed with the settings'
//! secret key, so forged keys are rejected before any lookup.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use taxi_core::{Settings, TaxiError, TaxiResult};
use taxi_db::{Driver, TaxiStore};
use taxi_http::cookies::{parse_cookie_header, sign_cookie_value, verify_signed_cookie};
use taxi_http::{redirect_to_login_url, Cookie, SameSite};

use crate::session_auth;
use crate::sessions::{SessionBackend, SessionData};

/// Salt mixed into the session cookie signature.
const SESSION_COOKIE_SALT: &str = "taxi.sessions";

/// Upper bound on session lifetime, ten years.
const MAX_SESSION_AGE: i64 = 10 * 365 * 24 * 60 * 60;

/// What the auth extractors need from the router state.
pub trait AuthState: Send + Sync + 'static {
    /// The data store.
    fn store(&self) -> &TaxiStore;
    /// Where sessions are kept.
    fn sessions(&self) -> &dyn SessionBackend;
    /// Application settings.
    fn settings(&self) -> &Settings;
}

impl<T: AuthState> AuthState for Arc<T> {
    fn store(&self) -> &TaxiStore {
        (**self).store()
    }

    fn sessions(&self) -> &dyn SessionBackend {
        (**self).sessions()
    }

    fn settings(&self) -> &Settings {
        (**self).settings()
    }
}

/// Session lifetime in seconds from the settings.
pub fn session_lifetime(settings: &Settings) -> i64 {
    i64::try_from(settings.session_cookie_age)
        .unwrap_or(MAX_SESSION_AGE)
        .min(MAX_SESSION_AGE)
}

/// Builds the signed session cookie for `session`.
pub fn session_cookie(settings: &Settings, session: &SessionData) -> TaxiResult<Cookie> {
    let value = sign_cookie_value(&session.session_key, &settings.secret_key, SESSION_COOKIE_SALT)
        .map_err(|e| TaxiError::ConfigurationError(format!("Cannot sign session cookie: {e}")))?;
    Ok(Cookie::new(&settings.session_cookie_name, value)
        .max_age(settings.session_cookie_age)
        .httponly(true)
        .samesite(SameSite::Lax))
}

/// The session key carried by the request's cookie, if it is validly signed.
pub fn session_key_from_headers(settings: &Settings, headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    let cookies = parse_cookie_header(raw);
    let signed = cookies.get(&settings.session_cookie_name)?;
    match verify_signed_cookie(signed, &settings.secret_key, SESSION_COOKIE_SALT) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session cookie");
            None
        }
    }
}

/// Loads the request's session, if it has a live one.
pub async fn load_session<S: AuthState>(
    state: &S,
    headers: &HeaderMap,
) -> TaxiResult<Option<SessionData>> {
    match session_key_from_headers(state.settings(), headers) {
        Some(key) => state.sessions().load(&key).await,
        None => Ok(None),
    }
}

/// Logs `driver` in: records them in `session` under a new key, saves it,
/// drops the pre-login key, and returns the cookie to set.
pub async fn start_session<S: AuthState>(
    state: &S,
    mut session: SessionData,
    driver: &Driver,
) -> TaxiResult<(SessionData, Cookie)> {
    let old_key = session.session_key.clone();
    session_auth::login(&mut session, driver, &state.settings().secret_key)?;
    state.sessions().delete(&old_key).await?;
    state.sessions().save(&session).await?;
    let cookie = session_cookie(state.settings(), &session)?;
    Ok((session, cookie))
}

/// Logs out: deletes the request's session and returns a cookie that
/// clears it in the browser.
pub async fn end_session<S: AuthState>(state: &S, headers: &HeaderMap) -> TaxiResult<Cookie> {
    if let Some(key) = session_key_from_headers(state.settings(), headers) {
        state.sessions().delete(&key).await?;
    }
    Ok(Cookie::removal(&state.settings().session_cookie_name))
}

/// Formats a cookie as a `Set-Cookie` header value.
pub fn set_cookie_header(cookie: &Cookie) -> TaxiResult<HeaderValue> {
    HeaderValue::from_str(&cookie.to_set_cookie_header())
        .map_err(|e| TaxiError::InternalServerError(format!("Invalid Set-Cookie header: {e}")))
}

/// Why an auth extractor refused the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in; redirect to this login URL.
    LoginRequired {
        /// The login URL including `next`.
        location: String,
    },
    /// Logged in but not allowed.
    PermissionDenied,
    /// The session store failed.
    Internal(TaxiError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::LoginRequired { location } => {
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            Self::PermissionDenied => {
                (StatusCode::FORBIDDEN, "403 Forbidden").into_response()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "Session lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
            }
        }
    }
}

/// The request's session. A request without a live session gets a new,
/// empty one that is not stored until a handler saves it.
#[derive(Debug, Clone)]
pub struct Session(pub SessionData);

impl<S: AuthState> FromRequestParts<S> for Session {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = load_session(state, &parts.headers)
            .await
            .map_err(AuthRejection::Internal)?
            .unwrap_or_else(|| SessionData::new(session_lifetime(state.settings())));
        Ok(Self(session))
    }
}

/// The logged-in driver and their session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The authenticated driver.
    pub driver: Driver,
    /// The driver's session, for handlers that store data in it.
    pub session: SessionData,
}

impl<S: AuthState> FromRequestParts<S> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = load_session(state, &parts.headers)
            .await
            .map_err(AuthRejection::Internal)?;
        if let Some(session) = session {
            let secret_key = &state.settings().secret_key;
            let driver = session_auth::get_user(state.store(), &session, secret_key)
                .await
                .map_err(AuthRejection::Internal)?;
            if let Some(driver) = driver {
                return Ok(Self { driver, session });
            }
        }
        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        Err(AuthRejection::LoginRequired {
            location: redirect_to_login_url(&state.settings().login_url, &next),
        })
    }
}

/// A logged-in driver with staff status.
#[derive(Debug, Clone)]
pub struct StaffUser(pub CurrentUser);

impl<S: AuthState> FromRequestParts<S> for StaffUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.driver.is_staff {
            Ok(Self(user))
        } else {
            tracing::warn!(driver_id = user.driver.id, "Non-staff driver denied");
            Err(AuthRejection::PermissionDenied)
        }
    }
}
