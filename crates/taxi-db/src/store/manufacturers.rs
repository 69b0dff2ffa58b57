//! Manufacturer storage operations.

use rusqlite::{params, OptionalExtension, Row};
use taxi_core::{TaxiError, TaxiResult};

use super::{map_sqlite_error, search_term, TaxiStore};
use crate::models::{Manufacturer, NewManufacturer};

pub(crate) const MANUFACTURER_COLUMNS: &str = "m.id, m.name, m.country";

/// Reads a manufacturer from `row`, starting at column `offset`.
pub(crate) fn manufacturer_from_row(
    row: &Row<'_>,
    offset: usize,
) -> rusqlite::Result<Manufacturer> {
    Ok(Manufacturer {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        country: row.get(offset + 2)?,
    })
}

impl TaxiStore {
    /// Lists manufacturers ordered by name, optionally filtered by a
    /// case-insensitive substring of the name.
    pub async fn list_manufacturers(&self, name: Option<&str>) -> TaxiResult<Vec<Manufacturer>> {
        let pattern = search_term(name);
        self.run(move |conn| {
            let sql = format!(
                "SELECT {MANUFACTURER_COLUMNS} FROM taxi_manufacturer m
                 WHERE ?1 IS NULL OR m.name LIKE ?1 ESCAPE '\\'
                 ORDER BY m.name"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
            let rows = stmt
                .query_map(params![pattern], |row| manufacturer_from_row(row, 0))
                .map_err(map_sqlite_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(map_sqlite_error)
        })
        .await
    }

    /// Fetches one manufacturer.
    pub async fn get_manufacturer(&self, id: i64) -> TaxiResult<Manufacturer> {
        self.run(move |conn| {
            let sql =
                format!("SELECT {MANUFACTURER_COLUMNS} FROM taxi_manufacturer m WHERE m.id = ?1");
            conn.query_row(&sql, [id], |row| manufacturer_from_row(row, 0))
                .optional()
                .map_err(map_sqlite_error)?
                .ok_or_else(|| TaxiError::DoesNotExist(format!("Manufacturer {id}")))
        })
        .await
    }

    /// Creates a manufacturer. A duplicate name is a
    /// [`TaxiError::UniqueViolation`] on `name`.
    pub async fn create_manufacturer(&self, new: NewManufacturer) -> TaxiResult<Manufacturer> {
        let manufacturer = self
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO taxi_manufacturer (name, country) VALUES (?1, ?2)",
                    params![new.name, new.country],
                )
                .map_err(map_sqlite_error)?;
                Ok(Manufacturer {
                    id: conn.last_insert_rowid(),
                    name: new.name,
                    country: new.country,
                })
            })
            .await?;
        tracing::info!(id = manufacturer.id, name = %manufacturer.name, "Created manufacturer");
        Ok(manufacturer)
    }

    /// Replaces a manufacturer's fields.
    pub async fn update_manufacturer(
        &self,
        id: i64,
        new: NewManufacturer,
    ) -> TaxiResult<Manufacturer> {
        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE taxi_manufacturer SET name = ?1, country = ?2 WHERE id = ?3",
                    params![new.name, new.country, id],
                )
                .map_err(map_sqlite_error)?;
            if changed == 0 {
                return Err(TaxiError::DoesNotExist(format!("Manufacturer {id}")));
            }
            Ok(Manufacturer {
                id,
                name: new.name,
                country: new.country,
            })
        })
        .await
    }

    /// Deletes a manufacturer and, by cascade, its cars.
    pub async fn delete_manufacturer(&self, id: i64) -> TaxiResult<()> {
        self.run(move |conn| {
            let changed = conn
                .execute("DELETE FROM taxi_manufacturer WHERE id = ?1", [id])
                .map_err(map_sqlite_error)?;
            if changed == 0 {
                return Err(TaxiError::DoesNotExist(format!("Manufacturer {id}")));
            }
            Ok(())
        })
        .await?;
        tracing::info!(id, "Deleted manufacturer");
        Ok(())
    }

    /// Counts all manufacturers.
    pub async fn count_manufacturers(&self) -> TaxiResult<i64> {
        self.run(|conn| {
            conn.query_row("SELECT COUNT(*) FROM taxi_manufacturer", [], |row| row.get(0))
                .map_err(map_sqlite_error)
        })
        .await
    }
}
