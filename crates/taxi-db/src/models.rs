//! Data model.
//!
//! Rows are plain structs with an `id` primary key. Cars and drivers are
//! related many-to-many through the `taxi_car_drivers` join table;
//! read-side composites ([`CarWithManufacturer`], [`CarDetail`],
//! [`DriverDetail`]) bundle an entity with its related rows for rendering.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A car manufacturer. Ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manufacturer {
    /// The primary key.
    pub id: i64,
    /// The manufacturer name, unique across manufacturers.
    pub name: String,
    /// The manufacturer's country. Empty when unknown.
    pub country: String,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

/// Fields for creating or updating a [`Manufacturer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewManufacturer {
    /// The manufacturer name.
    pub name: String,
    /// The manufacturer's country.
    pub country: String,
}

impl NewManufacturer {
    /// Creates manufacturer fields from a name and country.
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }
}

/// A driver: a user account extended with a license number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Driver {
    /// The primary key.
    pub id: i64,
    /// The login name, unique across drivers.
    pub username: String,
    /// The password hash in PHC string format. Never serialized.
    #[serde(skip_serializing)]
    pub password: String,
    /// First name, may be empty.
    pub first_name: String,
    /// Last name, may be empty.
    pub last_name: String,
    /// Email address, may be empty.
    pub email: String,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    /// Staff accounts can use the admin site.
    pub is_staff: bool,
    /// Superusers are staff with every permission.
    pub is_superuser: bool,
    /// When the account was created.
    pub date_joined: DateTime<Utc>,
    /// When the account last logged in.
    pub last_login: Option<DateTime<Utc>>,
    /// The license number, unique when present.
    pub license_number: Option<String>,
}

impl Driver {
    /// Returns "first last", trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The license number, or an empty string when none is recorded.
    pub fn license_display(&self) -> &str {
        self.license_number.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.username, self.first_name, self.last_name
        )
    }
}

/// Fields for creating a [`Driver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDriver {
    /// The login name.
    pub username: String,
    /// An already-hashed password.
    pub password_hash: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Optional license number. Format is not checked here.
    pub license_number: Option<String>,
    /// Whether the account may use the admin site.
    pub is_staff: bool,
    /// Whether the account is a superuser.
    pub is_superuser: bool,
}

impl NewDriver {
    /// Creates driver fields with a username and password hash; everything
    /// else is empty.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            ..Self::default()
        }
    }

    /// Sets first and last name.
    #[must_use]
    pub fn name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Sets the license number.
    #[must_use]
    pub fn license_number(mut self, license_number: impl Into<String>) -> Self {
        self.license_number = Some(license_number.into());
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Marks the account as a staff superuser.
    #[must_use]
    pub const fn superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }
}

/// A car. Ordered by model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Car {
    /// The primary key.
    pub id: i64,
    /// The car model name.
    pub model: String,
    /// The manufacturer's primary key.
    pub manufacturer_id: i64,
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model)
    }
}

/// Fields for creating or updating a [`Car`] with its driver set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCar {
    /// The car model name.
    pub model: String,
    /// The manufacturer's primary key.
    pub manufacturer_id: i64,
    /// Primary keys of the assigned drivers. Duplicates are ignored.
    pub driver_ids: Vec<i64>,
}

impl NewCar {
    /// Creates car fields.
    pub fn new(model: impl Into<String>, manufacturer_id: i64, driver_ids: Vec<i64>) -> Self {
        Self {
            model: model.into(),
            manufacturer_id,
            driver_ids,
        }
    }
}

/// A car together with its manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarWithManufacturer {
    /// The car.
    pub car: Car,
    /// The car's manufacturer.
    pub manufacturer: Manufacturer,
}

/// A car with its manufacturer and assigned drivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarDetail {
    /// The car.
    pub car: Car,
    /// The car's manufacturer.
    pub manufacturer: Manufacturer,
    /// The assigned drivers, ordered by username.
    pub drivers: Vec<Driver>,
}

impl CarDetail {
    /// Returns `true` if the driver is assigned to this car.
    pub fn has_driver(&self, driver_id: i64) -> bool {
        self.drivers.iter().any(|d| d.id == driver_id)
    }
}

/// A driver with their cars and those cars' manufacturers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverDetail {
    /// The driver.
    pub driver: Driver,
    /// The driver's cars, ordered by model.
    pub cars: Vec<CarWithManufacturer>,
}
