//! Car storage operations and the car/driver join table.
//!
//! Creating or editing a car writes the `taxi_car` row and all of its
//! `taxi_car_drivers` rows in one transaction. If any driver id is unknown
//! the foreign key check fails and nothing is written.

use rusqlite::{params, OptionalExtension, Row, Transaction};
use taxi_core::{TaxiError, TaxiResult};

use super::drivers::{driver_from_row, DRIVER_COLUMNS};
use super::manufacturers::manufacturer_from_row;
use super::{map_sqlite_error, search_term, TaxiStore};
use crate::models::{Car, CarDetail, CarWithManufacturer, NewCar};

pub(crate) const CAR_WITH_MANUFACTURER_COLUMNS: &str =
    "c.id, c.model, c.manufacturer_id, m.id, m.name, m.country";

pub(crate) fn car_with_manufacturer_from_row(
    row: &Row<'_>,
) -> rusqlite::Result<CarWithManufacturer> {
    Ok(CarWithManufacturer {
        car: Car {
            id: row.get(0)?,
            model: row.get(1)?,
            manufacturer_id: row.get(2)?,
        },
        manufacturer: manufacturer_from_row(row, 3)?,
    })
}

fn fetch_car_with_manufacturer(
    conn: &rusqlite::Connection,
    id: i64,
) -> TaxiResult<CarWithManufacturer> {
    let sql = format!(
        "SELECT {CAR_WITH_MANUFACTURER_COLUMNS}
         FROM taxi_car c JOIN taxi_manufacturer m ON m.id = c.manufacturer_id
         WHERE c.id = ?1"
    );
    conn.query_row(&sql, [id], car_with_manufacturer_from_row)
        .optional()
        .map_err(map_sqlite_error)?
        .ok_or_else(|| TaxiError::DoesNotExist(format!("Car {id}")))
}

/// Replaces the driver set of `car_id` inside an open transaction.
fn replace_drivers(tx: &Transaction<'_>, car_id: i64, driver_ids: &[i64]) -> TaxiResult<()> {
    tx.execute("DELETE FROM taxi_car_drivers WHERE car_id = ?1", [car_id])
        .map_err(map_sqlite_error)?;
    let mut stmt = tx
        .prepare("INSERT OR IGNORE INTO taxi_car_drivers (car_id, driver_id) VALUES (?1, ?2)")
        .map_err(map_sqlite_error)?;
    for driver_id in driver_ids {
        stmt.execute(params![car_id, driver_id])
            .map_err(map_sqlite_error)?;
    }
    Ok(())
}

impl TaxiStore {
    /// Lists cars with their manufacturers, ordered by model, optionally
    /// filtered by a case-insensitive substring of the model.
    pub async fn list_cars(&self, model: Option<&str>) -> TaxiResult<Vec<CarWithManufacturer>> {
        let pattern = search_term(model);
        self.run(move |conn| {
            let sql = format!(
                "SELECT {CAR_WITH_MANUFACTURER_COLUMNS}
                 FROM taxi_car c JOIN taxi_manufacturer m ON m.id = c.manufacturer_id
                 WHERE ?1 IS NULL OR c.model LIKE ?1 ESCAPE '\\'
                 ORDER BY c.model, c.id"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
            let rows = stmt
                .query_map(params![pattern], car_with_manufacturer_from_row)
                .map_err(map_sqlite_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(map_sqlite_error)
        })
        .await
    }

    /// Fetches a car with its manufacturer and assigned drivers.
    pub async fn get_car(&self, id: i64) -> TaxiResult<CarDetail> {
        self.run(move |conn| {
            let CarWithManufacturer { car, manufacturer } = fetch_car_with_manufacturer(conn, id)?;
            let sql = format!(
                "SELECT {DRIVER_COLUMNS}
                 FROM taxi_driver d JOIN taxi_car_drivers cd ON cd.driver_id = d.id
                 WHERE cd.car_id = ?1
                 ORDER BY d.username"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
            let drivers = stmt
                .query_map([id], driver_from_row)
                .map_err(map_sqlite_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sqlite_error)?;
            Ok(CarDetail {
                car,
                manufacturer,
                drivers,
            })
        })
        .await
    }

    /// Creates a car and its driver associations atomically.
    ///
    /// An unknown manufacturer or driver id fails with
    /// [`TaxiError::IntegrityError`] and leaves no rows behind.
    pub async fn create_car(&self, new: NewCar) -> TaxiResult<Car> {
        let car = self
            .run(move |conn| {
                let tx = conn.transaction().map_err(map_sqlite_error)?;
                tx.execute(
                    "INSERT INTO taxi_car (model, manufacturer_id) VALUES (?1, ?2)",
                    params![new.model, new.manufacturer_id],
                )
                .map_err(map_sqlite_error)?;
                let id = tx.last_insert_rowid();
                replace_drivers(&tx, id, &new.driver_ids)?;
                tx.commit().map_err(map_sqlite_error)?;
                Ok(Car {
                    id,
                    model: new.model,
                    manufacturer_id: new.manufacturer_id,
                })
            })
            .await?;
        tracing::info!(id = car.id, model = %car.model, "Created car");
        Ok(car)
    }

    /// Updates a car and replaces its driver set atomically.
    pub async fn update_car(&self, id: i64, new: NewCar) -> TaxiResult<Car> {
        self.run(move |conn| {
            let tx = conn.transaction().map_err(map_sqlite_error)?;
            let changed = tx
                .execute(
                    "UPDATE taxi_car SET model = ?1, manufacturer_id = ?2 WHERE id = ?3",
                    params![new.model, new.manufacturer_id, id],
                )
                .map_err(map_sqlite_error)?;
            if changed == 0 {
                return Err(TaxiError::DoesNotExist(format!("Car {id}")));
            }
            replace_drivers(&tx, id, &new.driver_ids)?;
            tx.commit().map_err(map_sqlite_error)?;
            Ok(Car {
                id,
                model: new.model,
                manufacturer_id: new.manufacturer_id,
            })
        })
        .await
    }

    /// Deletes a car and its driver associations.
    pub async fn delete_car(&self, id: i64) -> TaxiResult<()> {
        self.run(move |conn| {
            let changed = conn
                .execute("DELETE FROM taxi_car WHERE id = ?1", [id])
                .map_err(map_sqlite_error)?;
            if changed == 0 {
                return Err(TaxiError::DoesNotExist(format!("Car {id}")));
            }
            Ok(())
        })
        .await?;
        tracing::info!(id, "Deleted car");
        Ok(())
    }

    /// Flips a driver's assignment to a car inside one transaction.
    /// Returns `true` if the driver is assigned afterwards.
    pub async fn toggle_assignment(&self, car_id: i64, driver_id: i64) -> TaxiResult<bool> {
        self.run(move |conn| {
            let tx = conn.transaction().map_err(map_sqlite_error)?;
            let removed = tx
                .execute(
                    "DELETE FROM taxi_car_drivers WHERE car_id = ?1 AND driver_id = ?2",
                    params![car_id, driver_id],
                )
                .map_err(map_sqlite_error)?;
            if removed == 0 {
                tx.execute(
                    "INSERT INTO taxi_car_drivers (car_id, driver_id) VALUES (?1, ?2)",
                    params![car_id, driver_id],
                )
                .map_err(map_sqlite_error)?;
            }
            tx.commit().map_err(map_sqlite_error)?;
            Ok(removed == 0)
        })
        .await
    }

    /// Counts all cars.
    pub async fn count_cars(&self) -> TaxiResult<i64> {
        self.run(|conn| {
            conn.query_row("SELECT COUNT(*) FROM taxi_car", [], |row| row.get(0))
                .map_err(map_sqlite_error)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDriver, NewManufacturer};

    async fn seeded() -> (TaxiStore, i64, i64, i64) {
        let store = TaxiStore::memory_migrated().await.unwrap();
        let m = store
            .create_manufacturer(NewManufacturer::new("Toyota", "Japan"))
            .await
            .unwrap();
        let d1 = store.create_driver(NewDriver::new("d1", "x")).await.unwrap();
        let d2 = store.create_driver(NewDriver::new("d2", "x")).await.unwrap();
        (store, m.id, d1.id, d2.id)
    }

    #[tokio::test]
    async fn test_create_car_with_drivers() {
        let (store, m, d1, d2) = seeded().await;
        let car = store
            .create_car(NewCar::new("Corolla", m, vec![d1, d2, d1]))
            .await
            .unwrap();
        let detail = store.get_car(car.id).await.unwrap();
        assert_eq!(detail.car.to_string(), "Corolla");
        assert_eq!(detail.manufacturer.name, "Toyota");
        assert_eq!(detail.drivers.len(), 2);
    }

    #[tokio::test]
    async fn test_create_car_without_drivers_allowed_by_storage() {
        let (store, m, _, _) = seeded().await;
        let car = store.create_car(NewCar::new("Yaris", m, vec![])).await.unwrap();
        assert!(store.get_car(car.id).await.unwrap().drivers.is_empty());
    }

    #[tokio::test]
    async fn test_create_car_rolls_back_on_unknown_driver() {
        let (store, m, d1, _) = seeded().await;
        let err = store
            .create_car(NewCar::new("Camry", m, vec![d1, 9999]))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxiError::IntegrityError(_)));
        assert_eq!(store.count_cars().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_car_unknown_manufacturer() {
        let (store, _, d1, _) = seeded().await;
        let err = store
            .create_car(NewCar::new("Ghost", 42, vec![d1]))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxiError::IntegrityError(_)));
    }

    #[tokio::test]
    async fn test_update_car_replaces_drivers() {
        let (store, m, d1, d2) = seeded().await;
        let car = store.create_car(NewCar::new("Prius", m, vec![d1])).await.unwrap();
        store
            .update_car(car.id, NewCar::new("Prius Prime", m, vec![d2]))
            .await
            .unwrap();
        let detail = store.get_car(car.id).await.unwrap();
        assert_eq!(detail.car.model, "Prius Prime");
        assert!(detail.has_driver(d2));
        assert!(!detail.has_driver(d1));
    }

    #[tokio::test]
    async fn test_update_car_failure_keeps_old_drivers() {
        let (store, m, d1, _) = seeded().await;
        let car = store.create_car(NewCar::new("Prius", m, vec![d1])).await.unwrap();
        assert!(store
            .update_car(car.id, NewCar::new("Prius", m, vec![12345]))
            .await
            .is_err());
        assert!(store.get_car(car.id).await.unwrap().has_driver(d1));
    }

    #[tokio::test]
    async fn test_toggle_assignment() {
        let (store, m, d1, d2) = seeded().await;
        let car = store.create_car(NewCar::new("Aygo", m, vec![d1])).await.unwrap();
        assert!(!store.toggle_assignment(car.id, d1).await.unwrap());
        assert!(!store.get_car(car.id).await.unwrap().has_driver(d1));
        assert!(store.toggle_assignment(car.id, d1).await.unwrap());

        assert!(store.toggle_assignment(car.id, d2).await.unwrap());
        let detail = store.get_car(car.id).await.unwrap();
        assert!(detail.has_driver(d1));
        assert!(detail.has_driver(d2));
    }

    #[tokio::test]
    async fn test_driver_detail_lists_cars_with_manufacturers() {
        let (store, m, d1, _) = seeded().await;
        store.create_car(NewCar::new("Supra", m, vec![d1])).await.unwrap();
        store.create_car(NewCar::new("Avensis", m, vec![d1])).await.unwrap();
        let detail = store.get_driver_detail(d1).await.unwrap();
        let models: Vec<_> = detail.cars.iter().map(|c| c.car.model.as_str()).collect();
        assert_eq!(models, vec!["Avensis", "Supra"]);
        assert!(detail.cars.iter().all(|c| c.manufacturer.name == "Toyota"));
    }

    #[tokio::test]
    async fn test_cascades() {
        let (store, m, d1, _) = seeded().await;
        let car = store.create_car(NewCar::new("Hilux", m, vec![d1])).await.unwrap();
        store.delete_driver(d1).await.unwrap();
        assert!(store.get_car(car.id).await.unwrap().drivers.is_empty());
        store.delete_manufacturer(m).await.unwrap();
        assert_eq!(store.count_cars().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_cars_filter() {
        let (store, m, _, _) = seeded().await;
        store.create_car(NewCar::new("Land Cruiser", m, vec![])).await.unwrap();
        store.create_car(NewCar::new("Corolla", m, vec![])).await.unwrap();
        let cars = store.list_cars(Some("cruis")).await.unwrap();
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].manufacturer.name, "Toyota");
        assert_eq!(store.list_cars(None).await.unwrap()[0].car.model, "Corolla");
    }
}
