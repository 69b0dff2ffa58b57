//! # taxi-forms
//!
//! Form handling: binding submitted data, field-level cleaning, cross-field
//! validation, rendering context, and saving through [`TaxiStore`](taxi_db::TaxiStore).
//!
//! ## Framework modules
//!
//! - [`value`] - Cleaned field values
//! - [`validators`] - Reusable value validators, including the license-number rule
//! - [`widgets`] - HTML rendering of inputs and selects
//! - [`fields`] - Field definitions and per-field cleaning
//! - [`bound_field`] - Fields paired with data and errors, for templates
//! - [`validation`] - Field-level and form-level validation pipeline
//! - [`form`] - The [`Form`](form::Form) trait and [`BaseForm`](form::BaseForm)
//!
//! ## Application forms
//!
//! - [`car`] - [`CarForm`](car::CarForm): model, manufacturer, non-empty driver set
//! - [`driver`] - [`DriverLicenseUpdateForm`](driver::DriverLicenseUpdateForm)
//! - [`manufacturer`] - [`ManufacturerForm`](manufacturer::ManufacturerForm)
//! - [`search`] - [`SearchForm`](search::SearchForm) for list-view filtering

pub mod bound_field;
pub mod car;
pub mod driver;
pub mod fields;
pub mod form;
pub mod manufacturer;
pub mod search;
pub mod validation;
pub mod validators;
pub mod value;
pub mod widgets;

pub use form::{BaseForm, Form};
pub use value::Value;
