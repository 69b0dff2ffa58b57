//! HTTP server integration.
//!
//! [`TaxiApp`] combines settings and storage into a runnable web server:
//! it builds the shared state, the routes, and a request-tracing layer, then
//! serves them with axum.
//!
//! # Examples
//!
//! ```no_run
//! use taxi_core::Settings;
//! use taxi_db::TaxiStore;
//! use taxi_views::server::TaxiApp;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let store = TaxiStore::open(&settings.database.path)?;
//! store.migrate().await?;
//! TaxiApp::new(settings, store).run("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::extract::Request;
use axum::Router;
use taxi_core::logging::request_span;
use taxi_core::{Settings, TaxiError, TaxiResult};
use taxi_db::TaxiStore;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::urls::routes;

/// The taxi-service web application.
pub struct TaxiApp {
    settings: Settings,
    store: TaxiStore,
}

impl TaxiApp {
    /// Creates the application over an already-migrated store.
    pub const fn new(settings: Settings, store: TaxiStore) -> Self {
        Self { settings, store }
    }

    /// Returns the application settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Converts the application into an axum router with request tracing.
    pub fn into_router(self) -> TaxiResult<Router> {
        let state = Arc::new(AppState::new(self.settings, self.store)?);
        let router = routes(state)?.layer(TraceLayer::new_for_http().make_span_with(
            |req: &Request| request_span(req.method().as_str(), req.uri().path()),
        ));
        Ok(router)
    }

    /// Serves the application on `addr` until the process is stopped.
    pub async fn run(self, addr: &str) -> TaxiResult<()> {
        let debug_mode = self.settings.debug;
        let router = self.into_router()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| TaxiError::ConfigurationError(format!("Failed to bind to {addr}: {e}")))?;

        tracing::info!(%addr, debug = debug_mode, "Starting server at http://{addr}/");

        axum::serve(listener, router)
            .await
            .map_err(|e| TaxiError::InternalServerError(format!("Server error: {e}")))
    }
}

impl std::fmt::Debug for TaxiApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxiApp")
            .field("store", &self.store)
            .field("debug", &self.settings.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_into_router_builds() {
        let store = TaxiStore::memory_migrated().await.unwrap();
        let app = TaxiApp::new(Settings::for_testing(), store);
        assert_eq!(app.settings().paginate_by, 5);
        assert!(app.into_router().is_ok());
    }

    #[tokio::test]
    async fn test_run_reports_bind_failure() {
        let store = TaxiStore::memory_migrated().await.unwrap();
        let app = TaxiApp::new(Settings::for_testing(), store);
        let err = app.run("not-an-address").await.unwrap_err();
        assert!(matches!(err, TaxiError::ConfigurationError(_)));
    }
}
