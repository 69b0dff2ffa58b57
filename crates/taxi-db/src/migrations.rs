//! Versioned schema migrations.
//!
//! Each [`Migration`] is an ordered list of SQL statements. Applied
//! migrations are recorded in the `taxi_migrations` table, and
//! [`apply_pending`] runs the missing ones, each inside its own transaction.

use rusqlite::{params, Connection};
use taxi_core::{TaxiError, TaxiResult};

/// A single schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Monotonically increasing version number.
    pub version: i64,
    /// A short descriptive name, shown by the `migrate` command.
    pub name: &'static str,
    /// The statements to execute, in order.
    pub statements: &'static [&'static str],
}

/// Bookkeeping table, created before anything else.
const MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS taxi_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied TEXT NOT NULL
)";

/// All migrations, in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "0001_initial",
        statements: &[
            "CREATE TABLE taxi_manufacturer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                country TEXT NOT NULL DEFAULT ''
            )",
            "CREATE TABLE taxi_driver (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                is_staff INTEGER NOT NULL DEFAULT 0,
                is_superuser INTEGER NOT NULL DEFAULT 0,
                date_joined TEXT NOT NULL,
                last_login TEXT,
                license_number TEXT UNIQUE
            )",
            "CREATE TABLE taxi_car (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                model TEXT NOT NULL,
                manufacturer_id INTEGER NOT NULL
                    REFERENCES taxi_manufacturer(id) ON DELETE CASCADE
            )",
            "CREATE TABLE taxi_car_drivers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                car_id INTEGER NOT NULL REFERENCES taxi_car(id) ON DELETE CASCADE,
                driver_id INTEGER NOT NULL REFERENCES taxi_driver(id) ON DELETE CASCADE,
                UNIQUE (car_id, driver_id)
            )",
        ],
    },
    Migration {
        version: 2,
        name: "0002_relation_indexes",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_taxi_car_manufacturer ON taxi_car(manufacturer_id)",
            "CREATE INDEX IF NOT EXISTS idx_taxi_car_drivers_driver ON taxi_car_drivers(driver_id)",
        ],
    },
];

/// Returns the latest version this build knows about.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Returns the highest applied version, or 0 for a fresh database.
pub fn current_version(conn: &Connection) -> TaxiResult<i64> {
    conn.execute(MIGRATIONS_TABLE, [])
        .map_err(|e| TaxiError::OperationalError(format!("Cannot create migrations table: {e}")))?;
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM taxi_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| TaxiError::DatabaseError(format!("Cannot read schema version: {e}")))
}

/// Applies every migration newer than the current version.
///
/// Returns the names of the migrations that were applied, oldest first.
/// Running it on an up-to-date database applies nothing.
pub fn apply_pending(conn: &mut Connection) -> TaxiResult<Vec<&'static str>> {
    let current = current_version(conn)?;
    let mut applied = Vec::new();

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn
            .transaction()
            .map_err(|e| TaxiError::DatabaseError(format!("Cannot begin migration: {e}")))?;
        for statement in migration.statements {
            tx.execute(statement, []).map_err(|e| {
                TaxiError::DatabaseError(format!("Migration {} failed: {e}", migration.name))
            })?;
        }
        tx.execute(
            "INSERT INTO taxi_migrations (version, name, applied) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.name,
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| TaxiError::DatabaseError(format!("Cannot record migration: {e}")))?;
        tx.commit()
            .map_err(|e| TaxiError::DatabaseError(format!("Cannot commit migration: {e}")))?;

        tracing::info!(version = migration.version, name = migration.name, "Applied migration");
        applied.push(migration.name);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_fresh_database_has_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_apply_pending_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        let applied = apply_pending(&mut conn).unwrap();
        assert_eq!(applied, vec!["0001_initial", "0002_relation_indexes"]);
        for table in ["taxi_manufacturer", "taxi_driver", "taxi_car", "taxi_car_drivers"] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
        assert_eq!(current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn test_apply_pending_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_pending(&mut conn).unwrap();
        assert!(apply_pending(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_migrations_are_strictly_ordered() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }
}
