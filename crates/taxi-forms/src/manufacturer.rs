//! Create/update form for manufacturers.

use taxi_core::TaxiResult;
use taxi_db::{Manufacturer, NewManufacturer, TaxiStore};

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::{delegate_form, invalid_form_error, BaseForm, Form};

/// Form with `name` and `country`, both required.
#[derive(Debug)]
pub struct ManufacturerForm {
    inner: BaseForm,
}

delegate_form!(ManufacturerForm);

impl Default for ManufacturerForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ManufacturerForm {
    /// An empty form for creating a manufacturer.
    pub fn new() -> Self {
        Self {
            inner: BaseForm::new(vec![
                FormFieldDef::new("name", FormFieldType::char(255)),
                FormFieldDef::new("country", FormFieldType::char(255)),
            ]),
        }
    }

    /// A form pre-filled from an existing manufacturer.
    pub fn for_instance(manufacturer: &Manufacturer) -> Self {
        Self {
            inner: Self::new()
                .inner
                .with_initial("name", [manufacturer.name.as_str()])
                .with_initial("country", [manufacturer.country.as_str()]),
        }
    }

    fn new_manufacturer(&self) -> TaxiResult<NewManufacturer> {
        match (
            self.inner.cleaned_str("name"),
            self.inner.cleaned_str("country"),
        ) {
            (Some(name), Some(country)) => Ok(NewManufacturer::new(name, country)),
            _ => Err(invalid_form_error(self.inner.errors())),
        }
    }

    /// Creates the manufacturer. Call after a successful
    /// [`is_valid`](Form::is_valid); a duplicate name becomes an error on
    /// `name`.
    pub async fn save(&mut self, store: &TaxiStore) -> TaxiResult<Manufacturer> {
        let new = self.new_manufacturer()?;
        store
            .create_manufacturer(new)
            .await
            .map_err(|e| self.inner.absorb_save_error(e))
    }

    /// Updates manufacturer `id` with the cleaned data.
    pub async fn save_update(&mut self, store: &TaxiStore, id: i64) -> TaxiResult<Manufacturer> {
        let new = self.new_manufacturer()?;
        store
            .update_manufacturer(id, new)
            .await
            .map_err(|e| self.inner.absorb_save_error(e))
    }
}
