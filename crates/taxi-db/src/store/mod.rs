//! SQLite-backed storage.
//!
//! [`TaxiStore`] owns a single `rusqlite` connection guarded by an async
//! mutex. Every operation runs on the blocking thread pool via
//! `tokio::task::spawn_blocking`, so handlers can `.await` it without
//! stalling the runtime.
//!
//! Operations are grouped by entity:
//!
//! - [`manufacturers`] - manufacturer CRUD and search
//! - [`drivers`] - driver accounts, license updates, and a driver's cars
//! - [`cars`] - cars and the car/driver join table

pub mod cars;
pub mod drivers;
pub mod manufacturers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use taxi_core::{TaxiError, TaxiResult};
use tokio::sync::Mutex;

use crate::migrations;

/// Async storage facade over a SQLite database.
///
/// Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct TaxiStore {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for TaxiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxiStore").field("path", &self.path).finish()
    }
}

impl TaxiStore {
    /// Opens a database at the given path. `:memory:` opens a transient
    /// in-memory database.
    ///
    /// Foreign keys are enforced and WAL journaling is enabled. The schema
    /// is not touched; call [`migrate`](Self::migrate) before use.
    pub fn open(path: impl Into<PathBuf>) -> TaxiResult<Self> {
        let path = path.into();
        let conn = if path.to_str() == Some(":memory:") {
            Connection::open_in_memory()
        } else {
            Connection::open(&path)
        }
        .map_err(|e| TaxiError::OperationalError(format!("SQLite open failed: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| TaxiError::OperationalError(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(path = %path.display(), "Opened database");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> TaxiResult<Self> {
        Self::open(":memory:")
    }

    /// Opens an in-memory database with the schema applied. Used by tests
    /// throughout the workspace.
    pub async fn memory_migrated() -> TaxiResult<Self> {
        let store = Self::memory()?;
        store.migrate().await?;
        Ok(store)
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies pending schema migrations, returning the names applied.
    pub async fn migrate(&self) -> TaxiResult<Vec<&'static str>> {
        self.run(migrations::apply_pending).await
    }

    /// Returns the highest applied migration version.
    pub async fn schema_version(&self) -> TaxiResult<i64> {
        self.run(|conn| migrations::current_version(conn)).await
    }

    /// Runs `f` against the connection on the blocking thread pool.
    pub(crate) async fn run<T, F>(&self, f: F) -> TaxiResult<T>
    where
        F: FnOnce(&mut Connection) -> TaxiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await
        .map_err(|e| TaxiError::DatabaseError(format!("Task join error: {e}")))?
    }
}

/// Maps a `rusqlite` error onto [`TaxiError`].
///
/// `UNIQUE constraint failed: taxi_driver.username` becomes
/// [`TaxiError::UniqueViolation`] with `field = "username"`; other
/// constraint failures become [`TaxiError::IntegrityError`].
pub(crate) fn map_sqlite_error(err: rusqlite::Error) -> TaxiError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            let message = message.clone().unwrap_or_else(|| err.to_string());
            match message.strip_prefix("UNIQUE constraint failed: ") {
                Some(columns) => {
                    let field = columns
                        .split(',')
                        .next()
                        .and_then(|col| col.trim().rsplit('.').next())
                        .unwrap_or("__all__")
                        .to_string();
                    TaxiError::UniqueViolation {
                        message: unique_message(&field),
                        field,
                    }
                }
                None => TaxiError::IntegrityError(message),
            }
        }
        rusqlite::Error::QueryReturnedNoRows => {
            TaxiError::DoesNotExist("Query returned no rows".to_string())
        }
        _ => TaxiError::DatabaseError(err.to_string()),
    }
}

fn unique_message(field: &str) -> String {
    match field {
        "username" => "A user with that username already exists.".to_string(),
        "license_number" => "Driver with this License number already exists.".to_string(),
        "name" => "Manufacturer with this Name already exists.".to_string(),
        other => format!("An object with this {other} already exists."),
    }
}

/// Builds a `LIKE` pattern matching `term` as a substring, escaping the
/// wildcard characters. Use with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Normalizes an optional search term: blank means no filter.
pub(crate) fn search_term(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(like_pattern)
}
