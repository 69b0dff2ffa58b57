//! Model administration configuration.
//!
//! A [`ModelAdmin`] describes how one model appears in the admin site: the
//! changelist columns, search fields, filters, and the field groupings of
//! the change and add pages.
//!
//! Configurations compose additively. The driver admin starts from
//! [`user_admin`] and appends its license-number settings with the
//! `extend_*` methods, so the base account configuration is never copied
//! or overridden field by field.

use serde::Serialize;

/// How a model is displayed and managed in the admin site.
///
/// # Examples
///
/// ```
/// use taxi_admin::model_admin::ModelAdmin;
///
/// let admin = ModelAdmin::new("taxi", "car")
///     .search_fields(vec!["model"])
///     .list_filter(vec!["manufacturer"]);
/// assert_eq!(admin.model_key(), "taxi.car");
/// assert_eq!(admin.list_display, vec!["__str__"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAdmin {
    /// The application label, always `"taxi"` here.
    pub app_label: String,
    /// The model name in lowercase (e.g. `"driver"`).
    pub model_name: String,
    /// The human-readable name.
    pub verbose_name: String,
    /// The human-readable plural name.
    pub verbose_name_plural: String,
    /// Columns shown in the changelist. `"__str__"` is the object's display string.
    pub list_display: Vec<String>,
    /// Fields the changelist can be filtered on.
    pub list_filter: Vec<String>,
    /// Fields matched by the changelist search box.
    pub search_fields: Vec<String>,
    /// Default changelist ordering.
    pub ordering: Vec<String>,
    /// Rows per changelist page.
    pub list_per_page: usize,
    /// Field groupings of the change page.
    pub fieldsets: Vec<Fieldset>,
    /// Field groupings of the add page.
    pub add_fieldsets: Vec<Fieldset>,
}

impl ModelAdmin {
    /// Creates a configuration with defaults: a single `__str__` column,
    /// no search, no filters.
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        let verbose_name = model_name.replace('_', " ");
        Self {
            app_label: app_label.into(),
            verbose_name_plural: format!("{verbose_name}s"),
            verbose_name,
            model_name,
            list_display: vec!["__str__".to_string()],
            list_filter: Vec::new(),
            search_fields: Vec::new(),
            ordering: Vec::new(),
            list_per_page: 100,
            fieldsets: Vec::new(),
            add_fieldsets: Vec::new(),
        }
    }

    /// Re-targets this configuration at another model, keeping the rest.
    #[must_use]
    pub fn for_model(mut self, app_label: &str, model_name: &str) -> Self {
        let renamed = Self::new(app_label, model_name);
        self.app_label = renamed.app_label;
        self.model_name = renamed.model_name;
        self.verbose_name = renamed.verbose_name;
        self.verbose_name_plural = renamed.verbose_name_plural;
        self
    }

    /// Sets the human-readable names.
    #[must_use]
    pub fn verbose_names(mut self, singular: &str, plural: &str) -> Self {
        self.verbose_name = singular.to_string();
        self.verbose_name_plural = plural.to_string();
        self
    }

    /// Sets the changelist columns.
    #[must_use]
    pub fn list_display(mut self, fields: Vec<&str>) -> Self {
        self.list_display = to_strings(fields);
        self
    }

    /// Sets the filterable fields.
    #[must_use]
    pub fn list_filter(mut self, fields: Vec<&str>) -> Self {
        self.list_filter = to_strings(fields);
        self
    }

    /// Sets the searchable fields.
    #[must_use]
    pub fn search_fields(mut self, fields: Vec<&str>) -> Self {
        self.search_fields = to_strings(fields);
        self
    }

    /// Sets the default ordering. Prefix a field with `-` for descending.
    #[must_use]
    pub fn ordering(mut self, fields: Vec<&str>) -> Self {
        self.ordering = to_strings(fields);
        self
    }

    /// Sets the number of rows per changelist page.
    #[must_use]
    pub const fn list_per_page(mut self, count: usize) -> Self {
        self.list_per_page = count;
        self
    }

    /// Sets the change page groupings.
    #[must_use]
    pub fn fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets = fieldsets;
        self
    }

    /// Sets the add page groupings.
    #[must_use]
    pub fn add_fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.add_fieldsets = fieldsets;
        self
    }

    /// Appends columns after the existing changelist columns.
    #[must_use]
    pub fn extend_list_display(mut self, fields: Vec<&str>) -> Self {
        self.list_display.extend(to_strings(fields));
        self
    }

    /// Appends groupings after the existing change page groupings.
    #[must_use]
    pub fn extend_fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.fieldsets.extend(fieldsets);
        self
    }

    /// Appends groupings after the existing add page groupings.
    #[must_use]
    pub fn extend_add_fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
        self.add_fieldsets.extend(fieldsets);
        self
    }

    /// Returns `"app_label.model_name"`.
    pub fn model_key(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Every field named by the change page groupings, in order.
    pub fn fieldset_fields(&self) -> Vec<&str> {
        flatten(&self.fieldsets)
    }

    /// Every field named by the add page groupings, in order.
    pub fn add_fieldset_fields(&self) -> Vec<&str> {
        flatten(&self.add_fieldsets)
    }

    /// Whether the model has an add page in the admin.
    pub fn has_add_page(&self) -> bool {
        !self.add_fieldsets.is_empty()
    }
}

/// A titled group of fields on a change or add page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fieldset {
    /// The group title; `None` for the untitled leading group.
    pub name: Option<String>,
    /// The fields in the group.
    pub fields: Vec<String>,
    /// CSS classes such as `"wide"`.
    pub classes: Vec<String>,
}

impl Fieldset {
    /// Creates an untitled group.
    pub fn new(fields: Vec<&str>) -> Self {
        Self {
            name: None,
            fields: to_strings(fields),
            classes: Vec::new(),
        }
    }

    /// Creates a titled group.
    pub fn titled(name: &str, fields: Vec<&str>) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new(fields)
        }
    }

    /// Sets the CSS classes.
    #[must_use]
    pub fn classes(mut self, classes: Vec<&str>) -> Self {
        self.classes = to_strings(classes);
        self
    }
}

fn to_strings(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(String::from).collect()
}

fn flatten(fieldsets: &[Fieldset]) -> Vec<&str> {
    fieldsets
        .iter()
        .flat_map(|fs| fs.fields.iter().map(String::as_str))
        .collect()
}

/// The standard account admin that the driver admin builds on.
pub fn user_admin() -> ModelAdmin {
    ModelAdmin::new("auth", "user")
        .list_display(vec!["username", "email", "first_name", "last_name", "is_staff"])
        .list_filter(vec!["is_staff", "is_superuser", "is_active"])
        .search_fields(vec!["username", "first_name", "last_name", "email"])
        .ordering(vec!["username"])
        .fieldsets(vec![
            Fieldset::new(vec!["username", "password"]),
            Fieldset::titled("Personal info", vec!["first_name", "last_name", "email"]),
            Fieldset::titled("Permissions", vec!["is_active", "is_staff", "is_superuser"]),
            Fieldset::titled("Important dates", vec!["last_login", "date_joined"]),
        ])
        .add_fieldsets(vec![
            Fieldset::new(vec!["username", "password1", "password2"]).classes(vec!["wide"])
        ])
}

/// The driver admin: the account admin plus the license number.
pub fn driver_admin() -> ModelAdmin {
    user_admin()
        .for_model("taxi", "driver")
        .extend_list_display(vec!["license_number"])
        .extend_fieldsets(vec![Fieldset::titled(
            "Additional info",
            vec!["license_number"],
        )])
        .extend_add_fieldsets(vec![Fieldset::titled(
            "Additional info",
            vec!["first_name", "last_name", "license_number"],
        )])
}

/// The car admin: searchable by model, filterable by manufacturer.
pub fn car_admin() -> ModelAdmin {
    ModelAdmin::new("taxi", "car")
        .search_fields(vec!["model"])
        .list_filter(vec!["manufacturer"])
        .ordering(vec!["model"])
        .fieldsets(vec![Fieldset::new(vec!["model", "manufacturer", "drivers"])])
}

/// The manufacturer admin, with default settings.
pub fn manufacturer_admin() -> ModelAdmin {
    ModelAdmin::new("taxi", "manufacturer")
        .ordering(vec!["name"])
        .fieldsets(vec![Fieldset::new(vec!["name", "country"])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let admin = ModelAdmin::new("taxi", "manufacturer");
        assert_eq!(admin.list_display, vec!["__str__"]);
        assert_eq!(admin.verbose_name_plural, "manufacturers");
        assert!(admin.search_fields.is_empty());
        assert!(!admin.has_add_page());
    }

    #[test]
    fn test_driver_list_display_is_base_plus_license() {
        let base = user_admin();
        let driver = driver_admin();
        let mut expected = base.list_display.clone();
        expected.push("license_number".to_string());
        assert_eq!(driver.list_display, expected);
    }

    #[test]
    fn test_driver_fieldsets_extend_base() {
        let base = user_admin();
        let driver = driver_admin();
        assert_eq!(driver.fieldsets.len(), base.fieldsets.len() + 1);
        assert_eq!(driver.fieldsets[..base.fieldsets.len()], base.fieldsets[..]);
        let extra = driver.fieldsets.last().unwrap();
        assert_eq!(extra.name.as_deref(), Some("Additional info"));
        assert_eq!(extra.fields, vec!["license_number"]);
    }

    #[test]
    fn test_driver_add_fieldsets_extend_base() {
        let base = user_admin();
        let driver = driver_admin();
        assert_eq!(driver.add_fieldsets[0], base.add_fieldsets[0]);
        assert_eq!(driver.add_fieldsets[0].classes, vec!["wide"]);
        assert_eq!(
            driver.add_fieldset_fields(),
            vec![
                "username",
                "password1",
                "password2",
                "first_name",
                "last_name",
                "license_number"
            ]
        );
    }

    #[test]
    fn test_driver_keeps_base_search_and_ordering() {
        let driver = driver_admin();
        assert_eq!(driver.model_key(), "taxi.driver");
        assert_eq!(driver.verbose_name_plural, "drivers");
        assert_eq!(driver.search_fields, user_admin().search_fields);
        assert_eq!(driver.ordering, vec!["username"]);
    }

    #[test]
    fn test_car_admin() {
        let car = car_admin();
        assert_eq!(car.search_fields, vec!["model"]);
        assert_eq!(car.list_filter, vec!["manufacturer"]);
        assert_eq!(car.list_display, vec!["__str__"]);
    }
}
