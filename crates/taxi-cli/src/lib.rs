//! # taxi-cli
//!
//! Management commands for taxi-service, run as `taxi <command>`.
//!
//! - `migrate` - apply pending schema migrations
//! - `runserver [ADDR]` - migrate, then serve the site
//! - `createsuperuser` - create a staff account with full access
//!
//! Every command accepts `--settings <PATH>` naming a TOML settings file.
//!
//! ```rust
//! use taxi_cli::commands::builtin_registry;
//!
//! let registry = builtin_registry();
//! assert_eq!(registry.list_commands(), vec!["createsuperuser", "migrate", "runserver"]);
//! ```

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand};
pub use commands::{builtin_registry, register_builtin_commands};
