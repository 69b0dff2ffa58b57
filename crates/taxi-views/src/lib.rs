//! # taxi-views
//!
//! The web front of taxi-service: page handlers, templates, pagination, the
//! router, and the server.
//!
//! Every page except login and logout requires a logged-in driver. Lists are
//! searchable and paginated five to a page; create, update, and delete pages
//! redirect to the list on success and re-render with errors otherwise.
//!
//! ## Modules
//!
//! - [`views`] - Request handlers grouped by area
//! - [`urls`] - The route table
//! - [`server`] - [`TaxiApp`], the runnable application
//! - [`state`] - Shared state handed to handlers
//! - [`templates`] - Embedded Tera templates
//! - [`pagination`] - [`Paginator`] and [`Page`]
//! - [`error`] - Mapping errors onto HTTP responses

pub mod error;
pub mod pagination;
pub mod server;
pub mod state;
pub mod templates;
pub mod urls;
pub mod views;

pub use error::{AppError, AppResult};
pub use pagination::{Page, Paginator};
pub use server::TaxiApp;
pub use state::{AppState, SharedState};
pub use urls::routes;
