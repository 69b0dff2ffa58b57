//! Bound fields: a field definition paired with its data and errors.
//!
//! Templates iterate a form's bound fields through
//! [`Form::as_context`](crate::form::Form::as_context), which serializes
//! each [`BoundField`] with [`BoundField::to_context`].

use serde_json::json;

use crate::fields::FormFieldDef;
use crate::widgets::escape_html;

/// A field definition with the values to display and its errors.
#[derive(Debug)]
pub struct BoundField<'a> {
    /// The underlying field definition.
    pub field: &'a FormFieldDef,
    /// Submitted data when bound, otherwise the initial values.
    pub values: Vec<String>,
    /// Validation errors for this field.
    pub errors: Vec<String>,
}

impl<'a> BoundField<'a> {
    /// Pairs a field with values and errors.
    pub const fn new(field: &'a FormFieldDef, values: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            field,
            values,
            errors,
        }
    }

    /// The field's HTML name.
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// The generated HTML `id`, `id_<name>`.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.field.name)
    }

    /// Renders the field's widget, adding `id` and `required` attributes.
    pub fn render(&self) -> String {
        let mut attrs = self.field.attrs.clone();
        attrs.entry("id".to_string()).or_insert_with(|| self.auto_id());
        if self.field.required {
            attrs.insert("required".to_string(), String::new());
        }
        self.field.widget.render(&self.field.name, &self.values, &attrs)
    }

    /// Renders a `<label>` pointing at the widget.
    pub fn label_tag(&self) -> String {
        let target = self.field.widget.id_for_label(&self.auto_id());
        format!(
            r#"<label for="{target}">{}:</label>"#,
            escape_html(&self.field.label)
        )
    }

    /// Returns `true` if the field has errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the errors as `<ul class="errorlist">`, or nothing.
    pub fn errors_as_ul(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let items: String = self
            .errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!(r#"<ul class="errorlist">{items}</ul>"#)
    }

    /// Serializes the field for template rendering.
    pub fn to_context(&self) -> serde_json::Value {
        json!({
            "name": self.field.name,
            "id": self.auto_id(),
            "label": self.field.label,
            "help_text": self.field.help_text,
            "required": self.field.required,
            "widget_type": self.field.widget.widget_type().to_string(),
            "value": self.values.last(),
            "values": self.values,
            "errors": self.errors,
            "html": self.render(),
            "label_tag": self.label_tag(),
            "errors_html": self.errors_as_ul(),
        })
    }
}
