//! Form field definitions and per-field cleaning.
//!
//! A [`FormFieldDef`] describes one field: its [`FormFieldType`], whether it
//! is required, its widget, and extra validators. [`clean_field_value`] turns
//! the raw submitted strings for a field into a typed [`Value`] or a list of
//! error messages.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::validators::Validator;
use crate::value::Value;
use crate::widgets::{
    CheckboxSelectMultiple, EmailInput, PasswordInput, Select, SelectMultiple, TextInput, Widget,
};

/// The type of a form field, with its type-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFieldType {
    /// Free text.
    Char {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
        /// Whether to trim surrounding whitespace before validating.
        strip: bool,
    },
    /// An email address.
    Email,
    /// One primary key out of a fixed set of `(id, label)` choices.
    ModelChoice {
        /// The available choices.
        choices: Vec<(i64, String)>,
    },
    /// Any number of primary keys out of a fixed set of choices.
    ModelMultipleChoice {
        /// The available choices.
        choices: Vec<(i64, String)>,
    },
}

impl FormFieldType {
    /// A text field with an upper length bound that strips whitespace.
    pub const fn char(max_length: usize) -> Self {
        Self::Char {
            min_length: None,
            max_length: Some(max_length),
            strip: true,
        }
    }

    /// Choices formatted as `(value, label)` strings for widgets.
    fn widget_choices(&self) -> Vec<(String, String)> {
        match self {
            Self::ModelChoice { choices } | Self::ModelMultipleChoice { choices } => choices
                .iter()
                .map(|(id, label)| (id.to_string(), label.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Complete definition of a form field.
pub struct FormFieldDef {
    /// The field name (the HTML `name` attribute).
    pub name: String,
    /// The field type.
    pub field_type: FormFieldType,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Human-readable label.
    pub label: String,
    /// Help text shown next to the field.
    pub help_text: String,
    /// Widget used for rendering.
    pub widget: Box<dyn Widget>,
    /// Extra HTML attributes for the widget (placeholder and so on).
    pub attrs: BTreeMap<String, String>,
    /// Validators run after type cleaning succeeds.
    pub validators: Vec<Box<dyn Validator>>,
    /// Overrides for built-in error messages, keyed by error code.
    pub error_messages: HashMap<String, String>,
}

impl fmt::Debug for FormFieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("widget", &self.widget.widget_type())
            .finish_non_exhaustive()
    }
}

impl FormFieldDef {
    /// Creates a required field with the default widget for its type and a
    /// label derived from the name.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = default_label(&name);
        Self {
            name,
            field_type,
            required: true,
            label,
            help_text: String::new(),
            widget,
            attrs: BTreeMap::new(),
            validators: Vec::new(),
            error_messages: HashMap::new(),
        }
    }

    /// Sets whether the field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Replaces the widget.
    #[must_use]
    pub fn widget(mut self, widget: Box<dyn Widget>) -> Self {
        self.widget = widget;
        self
    }

    /// Renders a password input instead of a text input.
    #[must_use]
    pub fn password(self) -> Self {
        self.widget(Box::new(PasswordInput))
    }

    /// Renders the choices as a checkbox list.
    #[must_use]
    pub fn checkboxes(self) -> Self {
        let choices = self.field_type.widget_choices();
        self.widget(Box::new(CheckboxSelectMultiple::new(choices)))
    }

    /// Sets an HTML attribute on the widget.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Sets the widget's placeholder text.
    #[must_use]
    pub fn placeholder(self, text: impl Into<String>) -> Self {
        self.attr("placeholder", text)
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Overrides a built-in error message.
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), message.into());
        self
    }

    fn message(&self, code: &str, default: impl FnOnce() -> String) -> String {
        self.error_messages
            .get(code)
            .cloned()
            .unwrap_or_else(default)
    }
}

/// `license_number` becomes `License number`.
fn default_label(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Returns the default widget for a field type.
pub fn default_widget_for_field_type(field_type: &FormFieldType) -> Box<dyn Widget> {
    match field_type {
        FormFieldType::Char { .. } => Box::new(TextInput),
        FormFieldType::Email => Box::new(EmailInput),
        FormFieldType::ModelChoice { .. } => Box::new(Select::new(field_type.widget_choices())),
        FormFieldType::ModelMultipleChoice { .. } => {
            Box::new(SelectMultiple::new(field_type.widget_choices()))
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Cleans the raw submitted values for one field.
///
/// Runs, in order: the required check, type coercion with the type's
/// built-in constraints, then the field's validators (only if nothing has
/// failed yet). Single-valued fields read the last submitted value.
pub fn clean_field_value(field: &FormFieldDef, raw: &[String]) -> Result<Value, Vec<String>> {
    let required_error =
        || vec![field.message("required", || "This field is required.".to_string())];

    let value = match &field.field_type {
        FormFieldType::Char {
            min_length,
            max_length,
            strip,
        } => {
            let raw = raw.last().map_or("", String::as_str);
            let s = if *strip { raw.trim() } else { raw };
            if s.is_empty() {
                return if field.required {
                    Err(required_error())
                } else {
                    Ok(Value::String(String::new()))
                };
            }
            let count = s.chars().count();
            let mut errors = Vec::new();
            if let Some(min) = min_length {
                if count < *min {
                    errors.push(format!(
                        "Ensure this value has at least {min} characters (it has {count})."
                    ));
                }
            }
            if let Some(max) = max_length {
                if count > *max {
                    errors.push(format!(
                        "Ensure this value has at most {max} characters (it has {count})."
                    ));
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            Value::String(s.to_string())
        }

        FormFieldType::Email => {
            let s = raw.last().map_or("", |s| s.trim());
            if s.is_empty() {
                return if field.required {
                    Err(required_error())
                } else {
                    Ok(Value::String(String::new()))
                };
            }
            if !is_valid_email(s) {
                return Err(vec![field.message("invalid", || {
                    "Enter a valid email address.".to_string()
                })]);
            }
            Value::String(s.to_string())
        }

        FormFieldType::ModelChoice { choices } => {
            let s = raw.last().map_or("", |s| s.trim());
            if s.is_empty() {
                return if field.required {
                    Err(required_error())
                } else {
                    Ok(Value::Null)
                };
            }
            match s.parse::<i64>() {
                Ok(id) if choices.iter().any(|(c, _)| *c == id) => Value::Int(id),
                _ => {
                    return Err(vec![field.message("invalid_choice", || {
                        "Select a valid choice. That choice is not one of the available choices."
                            .to_string()
                    })])
                }
            }
        }

        FormFieldType::ModelMultipleChoice { choices } => {
            let submitted: Vec<&str> = raw
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if submitted.is_empty() {
                return if field.required {
                    Err(required_error())
                } else {
                    Ok(Value::List(Vec::new()))
                };
            }
            let mut ids: Vec<i64> = Vec::with_capacity(submitted.len());
            let mut errors = Vec::new();
            for s in submitted {
                match s.parse::<i64>() {
                    Ok(id) if choices.iter().any(|(c, _)| *c == id) => {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    Ok(_) => errors.push(format!(
                        "Select a valid choice. {s} is not one of the available choices."
                    )),
                    Err(_) => errors.push(format!("\u{201c}{s}\u{201d} is not a valid value.")),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            Value::List(ids.into_iter().map(Value::Int).collect())
        }
    };

    let errors: Vec<String> = field
        .validators
        .iter()
        .filter_map(|v| v.validate(&value).err())
        .map(|e| e.message)
        .collect();
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}
