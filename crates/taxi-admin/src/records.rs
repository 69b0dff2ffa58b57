//! Flattened, display-ready views of model rows for the admin pages.

use std::collections::{BTreeMap, BTreeSet};

use taxi_core::{TaxiError, TaxiResult};
use taxi_db::{CarDetail, CarWithManufacturer, Driver, Manufacturer, TaxiStore};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The models the admin site knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminModel {
    /// Drivers (the user accounts).
    Driver,
    /// Cars.
    Car,
    /// Manufacturers.
    Manufacturer,
}

impl AdminModel {
    /// Resolves a model name from a URL segment.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "driver" => Some(Self::Driver),
            "car" => Some(Self::Car),
            "manufacturer" => Some(Self::Manufacturer),
            _ => None,
        }
    }

    /// Loads every row of this model in its natural order.
    pub async fn load_all(self, store: &TaxiStore) -> TaxiResult<Vec<AdminRecord>> {
        Ok(match self {
            Self::Driver => store.list_drivers(None).await?.iter().map(AdminRecord::from).collect(),
            Self::Car => store.list_cars(None).await?.iter().map(AdminRecord::from).collect(),
            Self::Manufacturer => store
                .list_manufacturers(None)
                .await?
                .iter()
                .map(AdminRecord::from)
                .collect(),
        })
    }

    /// Loads one row with its related rows.
    pub async fn load_one(self, store: &TaxiStore, id: i64) -> TaxiResult<AdminRecord> {
        Ok(match self {
            Self::Driver => AdminRecord::from(&store.get_driver(id).await?),
            Self::Car => AdminRecord::from(&store.get_car(id).await?),
            Self::Manufacturer => AdminRecord::from(&store.get_manufacturer(id).await?),
        })
    }
}

/// One object as the admin renders it: its key, display string, and a
/// string value per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    /// The primary key.
    pub pk: i64,
    /// The object's display string.
    pub display: String,
    values: BTreeMap<String, String>,
}

impl AdminRecord {
    fn new(pk: i64, display: String) -> Self {
        Self {
            pk,
            display,
            values: BTreeMap::new(),
        }
    }

    fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// The display value of `field`. `__str__` is the display string;
    /// unknown fields render as `-`.
    pub fn value(&self, field: &str) -> String {
        if field == "__str__" {
            return self.display.clone();
        }
        self.values
            .get(field)
            .cloned()
            .unwrap_or_else(|| "-".to_string())
    }

    /// The value compared against a `?field=` changelist filter. Relations
    /// filter on the related id.
    pub fn filter_value(&self, field: &str) -> Option<&str> {
        self.values
            .get(&format!("{field}_id"))
            .or_else(|| self.values.get(field))
            .map(String::as_str)
    }

    /// Whether any of `fields` contains `term`, ignoring case.
    pub fn matches(&self, fields: &[String], term: &str) -> bool {
        let term = term.to_lowercase();
        fields.iter().any(|f| {
            self.values
                .get(f)
                .is_some_and(|v| v.to_lowercase().contains(&term))
        })
    }
}

/// Distinct `(value, label)` filter choices for `field` across `records`,
/// ordered by label.
pub fn filter_choices(records: &[AdminRecord], field: &str) -> Vec<(String, String)> {
    let choices: BTreeSet<(String, String)> = records
        .iter()
        .filter_map(|r| {
            let value = r.filter_value(field)?.to_string();
            Some((r.value(field), value))
        })
        .collect();
    choices.into_iter().map(|(label, value)| (value, label)).collect()
}

/// Resolves a model name or returns `NotFound`.
pub fn model_or_404(name: &str) -> TaxiResult<AdminModel> {
    AdminModel::from_name(name)
        .ok_or_else(|| TaxiError::NotFound(format!("No admin model '{name}'")))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

fn password_summary(hash: &str) -> String {
    if hash.starts_with('!') || hash.is_empty() {
        return "No password set.".to_string();
    }
    let algorithm = hash.trim_start_matches('$').split('$').next().unwrap_or("unknown");
    format!("algorithm: {algorithm}")
}

impl From<&Driver> for AdminRecord {
    fn from(d: &Driver) -> Self {
        Self::new(d.id, d.to_string())
            .with("username", &d.username)
            .with("password", password_summary(&d.password))
            .with("first_name", &d.first_name)
            .with("last_name", &d.last_name)
            .with("email", &d.email)
            .with("is_active", yes_no(d.is_active))
            .with("is_staff", yes_no(d.is_staff))
            .with("is_superuser", yes_no(d.is_superuser))
            .with("date_joined", d.date_joined.format(DATE_FORMAT).to_string())
            .with(
                "last_login",
                d.last_login
                    .map_or_else(|| "-".to_string(), |t| t.format(DATE_FORMAT).to_string()),
            )
            .with("license_number", d.license_display())
    }
}

impl From<&Manufacturer> for AdminRecord {
    fn from(m: &Manufacturer) -> Self {
        Self::new(m.id, m.to_string())
            .with("name", &m.name)
            .with("country", &m.country)
    }
}

impl From<&CarWithManufacturer> for AdminRecord {
    fn from(c: &CarWithManufacturer) -> Self {
        Self::new(c.car.id, c.car.to_string())
            .with("model", &c.car.model)
            .with("manufacturer", c.manufacturer.to_string())
            .with("manufacturer_id", c.manufacturer.id.to_string())
    }
}

impl From<&CarDetail> for AdminRecord {
    fn from(c: &CarDetail) -> Self {
        let drivers: Vec<String> = c.drivers.iter().map(ToString::to_string).collect();
        Self::new(c.car.id, c.car.to_string())
            .with("model", &c.car.model)
            .with("manufacturer", c.manufacturer.to_string())
            .with("manufacturer_id", c.manufacturer.id.to_string())
            .with("drivers", drivers.join(", "))
    }
}
