//! Create/update form for cars.
//!
//! The manufacturer and driver choices are snapshotted from the store when
//! the form is built, so a stale id submitted later fails as an invalid
//! choice. An id that disappears between validation and save surfaces as a
//! form-wide error from the rolled-back transaction.

use taxi_core::TaxiResult;
use taxi_db::{Car, CarDetail, Driver, Manufacturer, NewCar, TaxiStore};

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::{delegate_form, invalid_form_error, BaseForm, Form};

/// Form with `model`, `manufacturer`, and a non-empty `drivers` set.
#[derive(Debug)]
pub struct CarForm {
    inner: BaseForm,
}

delegate_form!(CarForm);

impl CarForm {
    /// Builds the form over the given manufacturer and driver choices.
    pub fn new(manufacturers: &[Manufacturer], drivers: &[Driver]) -> Self {
        let manufacturer_choices = manufacturers
            .iter()
            .map(|m| (m.id, m.to_string()))
            .collect();
        let driver_choices = drivers.iter().map(|d| (d.id, d.to_string())).collect();
        Self {
            inner: BaseForm::new(vec![
                FormFieldDef::new("model", FormFieldType::char(255)),
                FormFieldDef::new(
                    "manufacturer",
                    FormFieldType::ModelChoice {
                        choices: manufacturer_choices,
                    },
                ),
                FormFieldDef::new(
                    "drivers",
                    FormFieldType::ModelMultipleChoice {
                        choices: driver_choices,
                    },
                )
                .checkboxes(),
            ]),
        }
    }

    /// Builds the form with every manufacturer and driver as a choice.
    pub async fn load(store: &TaxiStore) -> TaxiResult<Self> {
        let manufacturers = store.list_manufacturers(None).await?;
        let drivers = store.list_drivers(None).await?;
        Ok(Self::new(&manufacturers, &drivers))
    }

    /// Like [`load`](Self::load), pre-filled from an existing car.
    pub async fn load_for_instance(store: &TaxiStore, car: &CarDetail) -> TaxiResult<Self> {
        let form = Self::load(store).await?;
        let driver_ids: Vec<String> = car.drivers.iter().map(|d| d.id.to_string()).collect();
        Ok(Self {
            inner: form
                .inner
                .with_initial("model", [car.car.model.as_str()])
                .with_initial("manufacturer", [car.manufacturer.id.to_string()])
                .with_initial("drivers", driver_ids),
        })
    }

    fn new_car(&self) -> TaxiResult<NewCar> {
        let drivers = self.inner.cleaned_ids("drivers");
        match (
            self.inner.cleaned_str("model"),
            self.inner.cleaned_int("manufacturer"),
        ) {
            (Some(model), Some(manufacturer_id)) if !drivers.is_empty() => {
                Ok(NewCar::new(model, manufacturer_id, drivers))
            }
            _ => Err(invalid_form_error(self.inner.errors())),
        }
    }

    /// Creates the car and its driver assignments in one transaction.
    pub async fn save(&mut self, store: &TaxiStore) -> TaxiResult<Car> {
        let new = self.new_car()?;
        store
            .create_car(new)
            .await
            .map_err(|e| self.inner.absorb_save_error(e))
    }

    /// Updates car `id` and replaces its driver set in one transaction.
    pub async fn save_update(&mut self, store: &TaxiStore, id: i64) -> TaxiResult<Car> {
        let new = self.new_car()?;
        store
            .update_car(id, new)
            .await
            .map_err(|e| self.inner.absorb_save_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_db::{NewDriver, NewManufacturer};
    use taxi_http::QueryDict;

    struct Fixture {
        store: TaxiStore,
        maker: Manufacturer,
        alice: Driver,
        bob: Driver,
    }

    async fn fixture() -> Fixture {
        let store = TaxiStore::memory_migrated().await.unwrap();
        let maker = store
            .create_manufacturer(NewManufacturer::new("Toyota", "Japan"))
            .await
            .unwrap();
        let alice = store.create_driver(NewDriver::new("alice", "x")).await.unwrap();
        let bob = store.create_driver(NewDriver::new("bob", "x")).await.unwrap();
        Fixture {
            store,
            maker,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn test_create_with_drivers() {
        let f = fixture().await;
        let mut form = CarForm::load(&f.store).await.unwrap();
        form.bind(&QueryDict::parse(&format!(
            "model=Corolla&manufacturer={}&drivers={}&drivers={}",
            f.maker.id, f.alice.id, f.bob.id
        )));
        assert!(form.is_valid().await);
        let car = form.save(&f.store).await.unwrap();
        let detail = f.store.get_car(car.id).await.unwrap();
        assert_eq!(detail.drivers.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_drivers_invalid() {
        let f = fixture().await;
        let mut form = CarForm::load(&f.store).await.unwrap();
        form.bind(&QueryDict::parse(&format!(
            "model=Corolla&manufacturer={}",
            f.maker.id
        )));
        assert!(!form.is_valid().await);
        assert_eq!(form.errors()["drivers"], vec!["This field is required."]);
        assert!(form.save(&f.store).await.is_err());
        assert_eq!(f.store.count_cars().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_manufacturer_invalid() {
        let f = fixture().await;
        let mut form = CarForm::load(&f.store).await.unwrap();
        form.bind(&QueryDict::parse(&format!(
            "model=Corolla&manufacturer=999&drivers={}",
            f.alice.id
        )));
        assert!(!form.is_valid().await);
        assert!(form.errors().contains_key("manufacturer"));
    }

    #[tokio::test]
    async fn test_update_replaces_drivers() {
        let f = fixture().await;
        let car = f
            .store
            .create_car(NewCar::new("Corolla", f.maker.id, vec![f.alice.id]))
            .await
            .unwrap();
        let detail = f.store.get_car(car.id).await.unwrap();
        let form = CarForm::load_for_instance(&f.store, &detail).await.unwrap();
        let ctx = form.as_context();
        assert_eq!(ctx["field"]["model"]["value"], "Corolla");
        assert!(ctx["field"]["drivers"]["html"]
            .as_str()
            .unwrap()
            .contains("checked"));

        let mut form = CarForm::load(&f.store).await.unwrap();
        form.bind(&QueryDict::parse(&format!(
            "model=Camry&manufacturer={}&drivers={}",
            f.maker.id, f.bob.id
        )));
        assert!(form.is_valid().await);
        form.save_update(&f.store, car.id).await.unwrap();
        let detail = f.store.get_car(car.id).await.unwrap();
        assert_eq!(detail.car.model, "Camry");
        let ids: Vec<i64> = detail.drivers.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![f.bob.id]);
    }

    #[tokio::test]
    async fn test_driver_deleted_after_validation() {
        let f = fixture().await;
        let mut form = CarForm::load(&f.store).await.unwrap();
        form.bind(&QueryDict::parse(&format!(
            "model=Corolla&manufacturer={}&drivers={}",
            f.maker.id, f.bob.id
        )));
        assert!(form.is_valid().await);
        f.store.delete_driver(f.bob.id).await.unwrap();
        assert!(form.save(&f.store).await.is_err());
        assert!(!form.errors()["__all__"].is_empty());
        assert_eq!(f.store.count_cars().await.unwrap(), 0);
    }
}
