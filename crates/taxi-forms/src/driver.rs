//! License-number update form for an existing driver.
//!
//! Driver creation lives in `taxi-auth`, next to password hashing.

use taxi_core::TaxiResult;
use taxi_db::{Driver, TaxiStore};

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::{delegate_form, invalid_form_error, BaseForm, Form};
use crate::validators::LicenseNumberValidator;

/// The `license_number` field shared by driver forms: required, at most
/// 255 characters, checked by [`LicenseNumberValidator`].
pub fn license_number_field() -> FormFieldDef {
    FormFieldDef::new("license_number", FormFieldType::char(255))
        .validator(Box::new(LicenseNumberValidator))
}

/// Edits only a driver's license number.
#[derive(Debug)]
pub struct DriverLicenseUpdateForm {
    inner: BaseForm,
}

delegate_form!(DriverLicenseUpdateForm);

impl Default for DriverLicenseUpdateForm {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverLicenseUpdateForm {
    /// An empty form.
    pub fn new() -> Self {
        Self {
            inner: BaseForm::new(vec![license_number_field()]),
        }
    }

    /// A form showing the driver's current license number.
    pub fn for_instance(driver: &Driver) -> Self {
        let inner = BaseForm::new(vec![license_number_field()]);
        let inner = match &driver.license_number {
            Some(license) => inner.with_initial("license_number", [license.as_str()]),
            None => inner,
        };
        Self { inner }
    }

    /// Writes the validated license number to driver `id`. A number held
    /// by another driver becomes an error on `license_number`.
    pub async fn save(&mut self, store: &TaxiStore, id: i64) -> TaxiResult<Driver> {
        let license = self
            .inner
            .cleaned_str("license_number")
            .map(String::from)
            .ok_or_else(|| invalid_form_error(self.inner.errors()))?;
        store
            .update_license_number(id, &license)
            .await
            .map_err(|e| self.inner.absorb_save_error(e))
    }
}
