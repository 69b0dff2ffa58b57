//! # taxi-auth
//!
//! Authentication for taxi-service. Drivers are the user accounts: they log
//! in with a username and password and get a server-side session.
//!
//! ## Modules
//!
//! - [`hashers`] - Argon2 password hashing and password strength validators
//! - [`sessions`] - Session data and the [`SessionBackend`](sessions::SessionBackend) trait
//! - [`session_auth`] - Recording and resolving the logged-in driver in a session
//! - [`backends`] - Username/password authentication against the store
//! - [`forms`] - Login and driver creation forms
//! - [`extractors`] - Axum extractors for login-required and staff-only handlers

pub mod backends;
pub mod extractors;
pub mod forms;
pub mod hashers;
pub mod session_auth;
pub mod sessions;

pub use backends::authenticate;
pub use extractors::{AuthRejection, AuthState, CurrentUser, Session, StaffUser};
pub use forms::{AuthenticationForm, DriverCreationForm};
pub use hashers::{check_password, make_password, validate_password};
pub use sessions::{InMemorySessionBackend, SessionBackend, SessionData};
