//! # taxi-http
//!
//! HTTP-level helpers shared by the form, auth, and view crates.
//!
//! ## Modules
//!
//! - [`querydict`] - Ordered multi-value dictionary for query strings and form bodies,
//!   plus [`query_transform`] for building pagination and filter links
//! - [`cookies`] - Cookie parsing, `Set-Cookie` formatting, and HMAC-signed values

pub mod cookies;
pub mod querydict;

pub use cookies::{Cookie, SameSite};
pub use querydict::{query_transform, redirect_to_login_url, QueryDict};
