//! # taxi-admin
//!
//! The staff-only admin site for taxi-service.
//!
//! ## Modules
//!
//! - [`model_admin`] - [`ModelAdmin`] and [`Fieldset`] configuration, with the
//!   account, driver, car, and manufacturer admins
//! - [`records`] - Display-ready rows loaded from the store
//! - [`site`] - [`AdminSite`] registry, changelist logic, and the axum router

pub mod model_admin;
pub mod records;
pub mod site;

pub use model_admin::{Fieldset, ModelAdmin};
pub use site::{AdminError, AdminSite, ChangeList};
