//! The [`Form`] trait and [`BaseForm`].
//!
//! [`BaseForm`] handles binding, field cleaning, and template context for a
//! list of [`FormFieldDef`]s. Application forms wrap a `BaseForm`, delegate
//! the bookkeeping to it, and add their own cross-field checks in
//! [`Form::clean`] and a `save` method that writes through the store.
//!
//! Validation is async so that `clean` can consult the database.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use taxi_core::{TaxiError, ValidationError};
use taxi_http::QueryDict;

use crate::bound_field::BoundField;
use crate::fields::FormFieldDef;
use crate::validation;
use crate::value::Value;

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Common behaviour of every form.
#[async_trait]
pub trait Form: Send + Sync {
    /// The form's field definitions.
    fn fields(&self) -> &[FormFieldDef];

    /// Binds submitted data, discarding any previous errors and cleaned data.
    fn bind(&mut self, data: &QueryDict);

    /// Returns `true` once data has been bound.
    fn is_bound(&self) -> bool;

    /// Validates the bound data. An unbound form is never valid.
    ///
    /// Afterwards [`errors`](Self::errors) and
    /// [`cleaned_data`](Self::cleaned_data) are populated.
    async fn is_valid(&mut self) -> bool;

    /// Errors keyed by field name; form-wide errors use [`NON_FIELD_ERRORS`].
    fn errors(&self) -> &HashMap<String, Vec<String>>;

    /// Cleaned values of the fields that passed validation.
    fn cleaned_data(&self) -> &HashMap<String, Value>;

    /// Template context: `fields`, `field`, `errors`, `non_field_errors`,
    /// `is_bound`.
    fn as_context(&self) -> serde_json::Value;

    /// Cross-field validation hook, run after field cleaning.
    async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        Ok(())
    }
}

/// A general-purpose form over a list of field definitions.
#[derive(Debug)]
pub struct BaseForm {
    field_defs: Vec<FormFieldDef>,
    initial: HashMap<String, Vec<String>>,
    bound: bool,
    raw_data: HashMap<String, Vec<String>>,
    errors: HashMap<String, Vec<String>>,
    cleaned_data: HashMap<String, Value>,
}

impl BaseForm {
    /// Creates an unbound form.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            field_defs: fields,
            initial: HashMap::new(),
            bound: false,
            raw_data: HashMap::new(),
            errors: HashMap::new(),
            cleaned_data: HashMap::new(),
        }
    }

    /// Sets the values an unbound form displays for `field`.
    #[must_use]
    pub fn with_initial<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial
            .insert(field.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Looks up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FormFieldDef> {
        self.field_defs.iter().find(|f| f.name == name)
    }

    /// Bound fields in declaration order, for rendering.
    pub fn bound_fields(&self) -> Vec<BoundField<'_>> {
        self.field_defs
            .iter()
            .map(|field| {
                let source = if self.bound { &self.raw_data } else { &self.initial };
                let values = source.get(&field.name).cloned().unwrap_or_default();
                let errors = self.errors.get(&field.name).cloned().unwrap_or_default();
                BoundField::new(field, values, errors)
            })
            .collect()
    }

    /// Form-wide errors.
    pub fn non_field_errors(&self) -> &[String] {
        self.errors.get(NON_FIELD_ERRORS).map_or(&[], Vec::as_slice)
    }

    /// Records an error against `field` and drops its cleaned value.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.cleaned_data.remove(field);
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Merges errors returned by a `clean` hook.
    pub fn merge_errors(&mut self, errors: HashMap<String, Vec<String>>) {
        for (field, messages) in errors {
            for message in messages {
                self.add_error(&field, message);
            }
        }
    }

    /// Returns `true` if any error has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The cleaned text value of `field`.
    pub fn cleaned_str(&self, field: &str) -> Option<&str> {
        self.cleaned_data.get(field).and_then(Value::as_str)
    }

    /// The cleaned integer value of `field`.
    pub fn cleaned_int(&self, field: &str) -> Option<i64> {
        self.cleaned_data.get(field).and_then(Value::as_int)
    }

    /// The cleaned id list of `field`.
    pub fn cleaned_ids(&self, field: &str) -> Vec<i64> {
        self.cleaned_data
            .get(field)
            .map(Value::as_ids)
            .unwrap_or_default()
    }

    /// Turns a failed save into form errors.
    ///
    /// A uniqueness violation on one of this form's fields is attached to
    /// that field; other integrity failures become form-wide errors. The
    /// returned error is a [`TaxiError::ValidationError`] for those cases
    /// and the original error otherwise.
    pub fn absorb_save_error(&mut self, err: TaxiError) -> TaxiError {
        match err {
            TaxiError::UniqueViolation { field, message } => {
                let target = if self.field(&field).is_some() {
                    field
                } else {
                    NON_FIELD_ERRORS.to_string()
                };
                self.add_error(&target, message);
            }
            TaxiError::IntegrityError(message) => {
                tracing::debug!(%message, "Integrity error while saving form");
                self.add_error(
                    NON_FIELD_ERRORS,
                    "The submitted data refers to records that no longer exist.",
                );
            }
            other => return other,
        }
        invalid_form_error(&self.errors)
    }
}

#[async_trait]
impl Form for BaseForm {
    fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    fn bind(&mut self, data: &QueryDict) {
        self.bound = true;
        self.raw_data.clear();
        self.errors.clear();
        self.cleaned_data.clear();
        for field in &self.field_defs {
            let values: Vec<String> = data
                .get_list(&field.name)
                .into_iter()
                .map(String::from)
                .collect();
            self.raw_data.insert(field.name.clone(), values);
        }
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    async fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }
        self.errors.clear();
        self.cleaned_data.clear();

        validation::clean_fields(
            &self.field_defs,
            &self.raw_data,
            &mut self.cleaned_data,
            &mut self.errors,
        );

        if let Err(form_errors) = self.clean().await {
            self.merge_errors(form_errors);
        }
        self.errors.is_empty()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        &self.cleaned_data
    }

    fn as_context(&self) -> serde_json::Value {
        let bound_fields = self.bound_fields();
        let fields: Vec<serde_json::Value> =
            bound_fields.iter().map(BoundField::to_context).collect();
        let by_name: serde_json::Map<String, serde_json::Value> = bound_fields
            .iter()
            .zip(&fields)
            .map(|(bf, ctx)| (bf.name().to_string(), ctx.clone()))
            .collect();
        json!({
            "fields": fields,
            "field": by_name,
            "errors": self.errors,
            "non_field_errors": self.non_field_errors(),
            "is_bound": self.bound,
        })
    }
}

/// Implements [`Form`] for a wrapper struct by delegating to its
/// `inner: BaseForm` field. For forms without their own `clean` step.
macro_rules! delegate_form {
    ($form:ty) => {
        #[async_trait::async_trait]
        impl $crate::form::Form for $form {
            fn fields(&self) -> &[$crate::fields::FormFieldDef] {
                $crate::form::Form::fields(&self.inner)
            }

            fn bind(&mut self, data: &taxi_http::QueryDict) {
                $crate::form::Form::bind(&mut self.inner, data);
            }

            fn is_bound(&self) -> bool {
                $crate::form::Form::is_bound(&self.inner)
            }

            async fn is_valid(&mut self) -> bool {
                $crate::form::Form::is_valid(&mut self.inner).await
            }

            fn errors(&self) -> &std::collections::HashMap<String, Vec<String>> {
                $crate::form::Form::errors(&self.inner)
            }

            fn cleaned_data(&self) -> &std::collections::HashMap<String, $crate::value::Value> {
                $crate::form::Form::cleaned_data(&self.inner)
            }

            fn as_context(&self) -> serde_json::Value {
                $crate::form::Form::as_context(&self.inner)
            }
        }
    };
}

pub(crate) use delegate_form;

/// Error returned by `save` when called on a form that failed validation.
pub fn invalid_form_error(errors: &HashMap<String, Vec<String>>) -> TaxiError {
    TaxiError::ValidationError(ValidationError::from_messages(errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormFieldType;

    fn make_form() -> BaseForm {
        BaseForm::new(vec![
            FormFieldDef::new("name", FormFieldType::char(255)),
            FormFieldDef::new("country", FormFieldType::char(255)).required(false),
        ])
    }

    #[tokio::test]
    async fn test_unbound_form_is_invalid() {
        let mut form = make_form();
        assert!(!form.is_bound());
        assert!(!form.is_valid().await);
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn test_valid_form_cleans() {
        let mut form = make_form();
        form.bind(&QueryDict::parse("name=+Toyota+&country=Japan"));
        assert!(form.is_valid().await);
        assert_eq!(form.cleaned_str("name"), Some("Toyota"));
        assert_eq!(form.cleaned_str("country"), Some("Japan"));
    }

    #[tokio::test]
    async fn test_missing_required_field() {
        let mut form = make_form();
        form.bind(&QueryDict::parse("country=Japan"));
        assert!(!form.is_valid().await);
        assert_eq!(form.errors()["name"], vec!["This field is required."]);
        assert!(form.cleaned_data().get("name").is_none());
    }

    #[tokio::test]
    async fn test_rebinding_clears_errors() {
        let mut form = make_form();
        form.bind(&QueryDict::new());
        assert!(!form.is_valid().await);
        form.bind(&QueryDict::parse("name=BMW"));
        assert!(form.errors().is_empty());
        assert!(form.is_valid().await);
    }

    #[test]
    fn test_add_error_drops_cleaned_value() {
        let mut form = make_form();
        form.cleaned_data.insert("name".into(), Value::from("x"));
        form.add_error("name", "Bad.");
        assert!(form.cleaned_str("name").is_none());
        assert!(form.has_errors());
    }

    #[test]
    fn test_absorb_unique_violation() {
        let mut form = make_form();
        let err = form.absorb_save_error(TaxiError::UniqueViolation {
            field: "name".into(),
            message: "Manufacturer with this Name already exists.".into(),
        });
        assert!(matches!(err, TaxiError::ValidationError(_)));
        assert_eq!(
            form.errors()["name"],
            vec!["Manufacturer with this Name already exists."]
        );

        let mut form = make_form();
        form.absorb_save_error(TaxiError::UniqueViolation {
            field: "other".into(),
            message: "dup".into(),
        });
        assert_eq!(form.non_field_errors(), ["dup"]);

        let mut form = make_form();
        let err = form.absorb_save_error(TaxiError::DatabaseError("boom".into()));
        assert!(matches!(err, TaxiError::DatabaseError(_)));
        assert!(!form.has_errors());
    }

    #[test]
    fn test_context_uses_initial_when_unbound() {
        let form = make_form().with_initial("name", ["Toyota"]);
        let ctx = form.as_context();
        assert_eq!(ctx["is_bound"], false);
        assert_eq!(ctx["fields"][0]["value"], "Toyota");
        assert_eq!(ctx["field"]["name"]["id"], "id_name");
    }

    #[tokio::test]
    async fn test_context_shows_submitted_data_and_errors() {
        let mut form = make_form().with_initial("name", ["Toyota"]);
        form.bind(&QueryDict::parse("country=Japan"));
        form.is_valid().await;
        let ctx = form.as_context();
        assert_eq!(ctx["fields"][0]["value"], serde_json::Value::Null);
        assert_eq!(ctx["fields"][1]["value"], "Japan");
        assert_eq!(ctx["errors"]["name"][0], "This field is required.");
    }
}
