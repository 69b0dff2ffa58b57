//! Driver storage operations.
//!
//! Drivers double as the user accounts used for login. Password hashing
//! happens in `taxi-auth`; this layer only stores the PHC string.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use taxi_core::{TaxiError, TaxiResult};

use super::cars::CAR_WITH_MANUFACTURER_COLUMNS;
use super::{map_sqlite_error, search_term, TaxiStore};
use crate::models::{Driver, DriverDetail, NewDriver};

pub(crate) const DRIVER_COLUMNS: &str = "d.id, d.username, d.password, d.first_name, \
     d.last_name, d.email, d.is_active, d.is_staff, d.is_superuser, d.date_joined, \
     d.last_login, d.license_number";

pub(crate) fn driver_from_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        is_active: row.get(6)?,
        is_staff: row.get(7)?,
        is_superuser: row.get(8)?,
        date_joined: row.get(9)?,
        last_login: row.get(10)?,
        license_number: row.get(11)?,
    })
}

fn fetch_driver(conn: &rusqlite::Connection, id: i64) -> TaxiResult<Driver> {
    let sql = format!("SELECT {DRIVER_COLUMNS} FROM taxi_driver d WHERE d.id = ?1");
    conn.query_row(&sql, [id], driver_from_row)
        .optional()
        .map_err(map_sqlite_error)?
        .ok_or_else(|| TaxiError::DoesNotExist(format!("Driver {id}")))
}

impl TaxiStore {
    /// Lists drivers ordered by username, optionally filtered by a
    /// case-insensitive substring of the username.
    pub async fn list_drivers(&self, username: Option<&str>) -> TaxiResult<Vec<Driver>> {
        let pattern = search_term(username);
        self.run(move |conn| {
            let sql = format!(
                "SELECT {DRIVER_COLUMNS} FROM taxi_driver d
                 WHERE ?1 IS NULL OR d.username LIKE ?1 ESCAPE '\\'
                 ORDER BY d.username"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
            let rows = stmt
                .query_map(params![pattern], driver_from_row)
                .map_err(map_sqlite_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(map_sqlite_error)
        })
        .await
    }

    /// Fetches one driver.
    pub async fn get_driver(&self, id: i64) -> TaxiResult<Driver> {
        self.run(move |conn| fetch_driver(conn, id)).await
    }

    /// Looks a driver up by exact username.
    pub async fn get_driver_by_username(&self, username: &str) -> TaxiResult<Option<Driver>> {
        let username = username.to_string();
        self.run(move |conn| {
            let sql = format!("SELECT {DRIVER_COLUMNS} FROM taxi_driver d WHERE d.username = ?1");
            conn.query_row(&sql, [username], driver_from_row)
                .optional()
                .map_err(map_sqlite_error)
        })
        .await
    }

    /// Fetches a driver with their cars and those cars' manufacturers.
    pub async fn get_driver_detail(&self, id: i64) -> TaxiResult<DriverDetail> {
        self.run(move |conn| {
            let driver = fetch_driver(conn, id)?;
            let sql = format!(
                "SELECT {CAR_WITH_MANUFACTURER_COLUMNS}
                 FROM taxi_car c
                 JOIN taxi_manufacturer m ON m.id = c.manufacturer_id
                 JOIN taxi_car_drivers cd ON cd.car_id = c.id
                 WHERE cd.driver_id = ?1
                 ORDER BY c.model"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
            let cars = stmt
                .query_map([id], super::cars::car_with_manufacturer_from_row)
                .map_err(map_sqlite_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sqlite_error)?;
            Ok(DriverDetail { driver, cars })
        })
        .await
    }

    /// Creates a driver. A duplicate username or license number is a
    /// [`TaxiError::UniqueViolation`] naming that column.
    pub async fn create_driver(&self, new: NewDriver) -> TaxiResult<Driver> {
        let driver = self
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO taxi_driver (username, password, first_name, last_name, email,
                         is_active, is_staff, is_superuser, date_joined, license_number)
                     VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8, ?9)",
                    params![
                        new.username,
                        new.password_hash,
                        new.first_name,
                        new.last_name,
                        new.email,
                        new.is_staff,
                        new.is_superuser,
                        Utc::now(),
                        new.license_number,
                    ],
                )
                .map_err(map_sqlite_error)?;
                fetch_driver(conn, conn.last_insert_rowid())
            })
            .await?;
        tracing::info!(id = driver.id, username = %driver.username, "Created driver");
        Ok(driver)
    }

    /// Replaces a driver's license number.
    pub async fn update_license_number(&self, id: i64, license_number: &str) -> TaxiResult<Driver> {
        let license_number = license_number.to_string();
        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE taxi_driver SET license_number = ?1 WHERE id = ?2",
                    params![license_number, id],
                )
                .map_err(map_sqlite_error)?;
            if changed == 0 {
                return Err(TaxiError::DoesNotExist(format!("Driver {id}")));
            }
            fetch_driver(conn, id)
        })
        .await
    }

    /// Replaces a driver's password hash.
    pub async fn set_password_hash(&self, id: i64, password_hash: &str) -> TaxiResult<()> {
        let password_hash = password_hash.to_string();
        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE taxi_driver SET password = ?1 WHERE id = ?2",
                    params![password_hash, id],
                )
                .map_err(map_sqlite_error)?;
            if changed == 0 {
                return Err(TaxiError::DoesNotExist(format!("Driver {id}")));
            }
            Ok(())
        })
        .await
    }

    /// Stamps the driver's last login with the current time.
    pub async fn touch_last_login(&self, id: i64) -> TaxiResult<()> {
        self.run(move |conn| {
            conn.execute(
                "UPDATE taxi_driver SET last_login = ?1 WHERE id = ?2",
                params![Utc::now(), id],
            )
            .map_err(map_sqlite_error)?;
            Ok(())
        })
        .await
    }

    /// Deletes a driver and their car assignments.
    pub async fn delete_driver(&self, id: i64) -> TaxiResult<()> {
        self.run(move |conn| {
            let changed = conn
                .execute("DELETE FROM taxi_driver WHERE id = ?1", [id])
                .map_err(map_sqlite_error)?;
            if changed == 0 {
                return Err(TaxiError::DoesNotExist(format!("Driver {id}")));
            }
            Ok(())
        })
        .await?;
        tracing::info!(id, "Deleted driver");
        Ok(())
    }

    /// Counts all drivers.
    pub async fn count_drivers(&self) -> TaxiResult<i64> {
        self.run(|conn| {
            conn.query_row("SELECT COUNT(*) FROM taxi_driver", [], |row| row.get(0))
                .map_err(map_sqlite_error)
        })
        .await
    }
}
