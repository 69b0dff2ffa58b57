//! # taxi
//!
//! A taxi fleet management web app. Drivers log in to browse and maintain
//! manufacturers, cars, and fellow drivers, assign themselves to cars, and
//! (as staff) use the admin site.
//!
//! This is the umbrella crate re-exporting the workspace crates.

/// Settings, errors, and logging.
pub use taxi_core as core;

/// Query strings and cookies.
pub use taxi_http as http;

/// SQLite storage: models, store, and migrations.
pub use taxi_db as db;

/// Forms, fields, widgets, and validators.
pub use taxi_forms as forms;

/// Password hashing, sessions, and login extractors.
pub use taxi_auth as auth;

/// The staff admin site.
pub use taxi_admin as admin;

/// Page handlers, templates, router, and server.
pub use taxi_views as views;

/// Management commands.
pub use taxi_cli as cli;
