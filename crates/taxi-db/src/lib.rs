//! # taxi-db
//!
//! The data model and its SQLite-backed storage.
//!
//! ## Modules
//!
//! - [`models`] - `Manufacturer`, `Driver`, `Car`, and the read-side composites
//! - [`migrations`] - Versioned schema migrations
//! - [`store`] - [`TaxiStore`], the async storage facade over `rusqlite`
//!
//! Uniqueness of driver usernames, driver license numbers, and manufacturer
//! names is enforced by `UNIQUE` constraints. Violations surface as
//! [`TaxiError::UniqueViolation`](taxi_core::TaxiError::UniqueViolation)
//! naming the offending column so forms can attach the error to a field.

pub mod migrations;
pub mod models;
pub mod store;

pub use models::{
    Car, CarDetail, CarWithManufacturer, Driver, DriverDetail, Manufacturer, NewCar, NewDriver,
    NewManufacturer,
};
pub use store::TaxiStore;
