//! Cookie handling.
//!
//! Provides `Cookie` header parsing, `Set-Cookie` formatting, and HMAC-SHA256
//! signed values. The session cookie is signed so that a forged or truncated
//! session key is rejected before any session lookup.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as Base64Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when verifying a signed cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    /// The value has no signature part.
    Unsigned,
    /// The signature does not match (tampered or signed with another key).
    InvalidSignature,
    /// The signing key could not be used.
    InvalidKey,
}

impl fmt::Display for CookieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned => write!(f, "Cookie value is not signed"),
            Self::InvalidSignature => write!(f, "Invalid cookie signature"),
            Self::InvalidKey => write!(f, "Invalid signing key"),
        }
    }
}

impl std::error::Error for CookieError {}

/// The `SameSite` attribute for cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Cookies are sent only with same-site requests.
    Strict,
    /// Cookies are also sent with top-level navigations.
    Lax,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
        }
    }
}

/// A cookie to be set on an HTTP response.
#[derive(Debug, Clone)]
pub struct Cookie {
    /// The cookie name.
    pub name: String,
    /// The cookie value.
    pub value: String,
    /// Maximum age in seconds. `None` means a browser-session cookie.
    pub max_age: Option<u64>,
    /// The path for which the cookie is valid.
    pub path: String,
    /// Whether the cookie is inaccessible to JavaScript.
    pub httponly: bool,
    /// The `SameSite` attribute.
    pub samesite: Option<SameSite>,
}

impl Cookie {
    /// Creates a new cookie with path `/` and no other attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            path: "/".to_string(),
            httponly: false,
            samesite: None,
        }
    }

    /// A cookie that tells the browser to drop `name` immediately.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(0)
    }

    /// Sets the max age.
    #[must_use]
    pub const fn max_age(mut self, max_age: u64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the httponly flag.
    #[must_use]
    pub const fn httponly(mut self, httponly: bool) -> Self {
        self.httponly = httponly;
        self
    }

    /// Sets the `SameSite` attribute.
    #[must_use]
    pub const fn samesite(mut self, samesite: SameSite) -> Self {
        self.samesite = Some(samesite);
        self
    }

    /// Formats this cookie as a `Set-Cookie` header value.
    pub fn to_set_cookie_header(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }

        parts.push(format!("Path={}", self.path));

        if self.httponly {
            parts.push("HttpOnly".to_string());
        }

        if let Some(samesite) = self.samesite {
            parts.push(format!("SameSite={samesite}"));
        }

        parts.join("; ")
    }
}

/// Parses a `Cookie` header value (`name1=value1; name2=value2`).
///
/// Malformed entries without `=` are skipped.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn mac_for(secret_key: &str, salt: &str) -> Result<HmacSha256, CookieError> {
    let signing_key = format!("{salt}{secret_key}");
    HmacSha256::new_from_slice(signing_key.as_bytes()).map_err(|_| CookieError::InvalidKey)
}

/// Signs a cookie value as `value:signature`, where the signature is
/// `HMAC-SHA256(salt + secret_key, value)` in URL-safe base64.
pub fn sign_cookie_value(value: &str, secret_key: &str, salt: &str) -> Result<String, CookieError> {
    let mut mac = mac_for(secret_key, salt)?;
    mac.update(value.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{value}:{signature}"))
}

/// Verifies a value produced by [`sign_cookie_value`] and returns the
/// original value.
pub fn verify_signed_cookie(
    signed_value: &str,
    secret_key: &str,
    salt: &str,
) -> Result<String, CookieError> {
    let (value, signature) = signed_value.rsplit_once(':').ok_or(CookieError::Unsigned)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| CookieError::InvalidSignature)?;

    let mut mac = mac_for(secret_key, salt)?;
    mac.update(value.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| CookieError::InvalidSignature)?;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cookie_header() {
        let cookie = Cookie::new("sessionid", "abc")
            .max_age(3600)
            .httponly(true)
            .samesite(SameSite::Lax);
        assert_eq!(
            cookie.to_set_cookie_header(),
            "sessionid=abc; Max-Age=3600; Path=/; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_removal_cookie() {
        let header = Cookie::removal("sessionid").to_set_cookie_header();
        assert_eq!(header, "sessionid=; Max-Age=0; Path=/");
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("sessionid=abc; theme=dark;; broken; =x");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["sessionid"], "abc");
        assert_eq!(cookies["theme"], "dark");
    }

    #[test]
    fn test_sign_and_verify() {
        let signed = sign_cookie_value("key123", "secret", "session").unwrap();
        assert!(signed.starts_with("key123:"));
        assert_eq!(
            verify_signed_cookie(&signed, "secret", "session").unwrap(),
            "key123"
        );
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let signed = sign_cookie_value("key123", "secret", "session").unwrap();
        let tampered = signed.replacen("key123", "key124", 1);
        assert_eq!(
            verify_signed_cookie(&tampered, "secret", "session"),
            Err(CookieError::InvalidSignature)
        );
        assert_eq!(
            verify_signed_cookie(&signed, "other-secret", "session"),
            Err(CookieError::InvalidSignature)
        );
        assert_eq!(
            verify_signed_cookie("plainvalue", "secret", "session"),
            Err(CookieError::Unsigned)
        );
    }
}
