//! Shared application state handed to every handler.

use std::sync::Arc;

use taxi_auth::{AuthState, InMemorySessionBackend, SessionBackend};
use taxi_core::{Settings, TaxiResult};
use taxi_db::TaxiStore;

use crate::templates::Templates;

/// Everything a request handler needs: storage, sessions, settings, and
/// templates.
pub struct AppState {
    store: TaxiStore,
    sessions: Arc<dyn SessionBackend>,
    settings: Settings,
    templates: Templates,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

/// The state as stored in the router.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Creates the state with an in-memory session store.
    pub fn new(settings: Settings, store: TaxiStore) -> TaxiResult<Self> {
        Self::with_sessions(settings, store, Arc::new(InMemorySessionBackend::new()))
    }

    /// Creates the state with a given session store.
    pub fn with_sessions(
        settings: Settings,
        store: TaxiStore,
        sessions: Arc<dyn SessionBackend>,
    ) -> TaxiResult<Self> {
        Ok(Self {
            store,
            sessions,
            settings,
            templates: Templates::new()?,
        })
    }

    /// The compiled templates.
    pub const fn templates(&self) -> &Templates {
        &self.templates
    }
}

impl AuthState for AppState {
    fn store(&self) -> &TaxiStore {
        &self.store
    }

    fn sessions(&self) -> &dyn SessionBackend {
        self.sessions.as_ref()
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }
}
