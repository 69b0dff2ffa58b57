//! HTML widgets for form fields.
//!
//! A [`Widget`] renders a field's current value(s) as HTML. Values and
//! labels are escaped here so templates can emit the result with `| safe`.

use std::collections::BTreeMap;
use std::fmt;

/// Identifies the kind of widget, mostly for templates and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`
    TextInput,
    /// `<input type="email">`
    EmailInput,
    /// `<input type="password">`
    PasswordInput,
    /// `<select>`
    Select,
    /// `<select multiple>`
    SelectMultiple,
    /// A list of checkboxes sharing one name.
    CheckboxSelectMultiple,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::EmailInput => "EmailInput",
            Self::PasswordInput => "PasswordInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::CheckboxSelectMultiple => "CheckboxSelectMultiple",
        };
        f.write_str(name)
    }
}

/// Renders a form field as HTML.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget kind.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget with the given values and HTML attributes.
    ///
    /// Single-valued widgets use the last value.
    fn render(&self, name: &str, values: &[String], attrs: &BTreeMap<String, String>) -> String;

    /// Returns the `id` a `<label for>` should target.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Escapes text for use inside HTML content or a quoted attribute.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats attributes as ` key="value"`. Boolean attributes are given an
/// empty value and render bare.
fn render_attrs(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                format!(" {k}")
            } else {
                format!(r#" {k}="{}""#, escape_html(v))
            }
        })
        .collect()
}

fn render_input(
    input_type: &str,
    name: &str,
    value: Option<&str>,
    attrs: &BTreeMap<String, String>,
) -> String {
    let value_attr = match value {
        Some(v) if !v.is_empty() => format!(r#" value="{}""#, escape_html(v)),
        _ => String::new(),
    };
    format!(
        r#"<input type="{input_type}" name="{name}"{value_attr}{}>"#,
        render_attrs(attrs)
    )
}

/// A plain text input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInput;

impl Widget for TextInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::TextInput
    }

    fn render(&self, name: &str, values: &[String], attrs: &BTreeMap<String, String>) -> String {
        render_input("text", name, values.last().map(String::as_str), attrs)
    }
}

/// An email input.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailInput;

impl Widget for EmailInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::EmailInput
    }

    fn render(&self, name: &str, values: &[String], attrs: &BTreeMap<String, String>) -> String {
        render_input("email", name, values.last().map(String::as_str), attrs)
    }
}

/// A password input. Submitted values are never echoed back.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordInput;

impl Widget for PasswordInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::PasswordInput
    }

    fn render(&self, name: &str, _values: &[String], attrs: &BTreeMap<String, String>) -> String {
        render_input("password", name, None, attrs)
    }
}

/// A single-choice dropdown with a leading blank option.
#[derive(Debug, Clone, Default)]
pub struct Select {
    /// `(value, label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl Select {
    /// Creates a dropdown over the given choices.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, values: &[String], attrs: &BTreeMap<String, String>) -> String {
        let current = values.last().map_or("", String::as_str);
        let mut html = format!(r#"<select name="{name}"{}>"#, render_attrs(attrs));
        html.push_str(r#"<option value="">---------</option>"#);
        for (value, label) in &self.choices {
            let selected = if value == current { " selected" } else { "" };
            html.push_str(&format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                escape_html(value),
                escape_html(label)
            ));
        }
        html.push_str("</select>");
        html
    }
}

/// A `<select multiple>`.
#[derive(Debug, Clone, Default)]
pub struct SelectMultiple {
    /// `(value, label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl SelectMultiple {
    /// Creates a multi-select over the given choices.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for SelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::SelectMultiple
    }

    fn render(&self, name: &str, values: &[String], attrs: &BTreeMap<String, String>) -> String {
        let mut html = format!(r#"<select name="{name}" multiple{}>"#, render_attrs(attrs));
        for (value, label) in &self.choices {
            let selected = if values.contains(value) { " selected" } else { "" };
            html.push_str(&format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                escape_html(value),
                escape_html(label)
            ));
        }
        html.push_str("</select>");
        html
    }
}

/// One checkbox per choice, each in its own `<div>`.
///
/// The `id` attribute, if any, is suffixed with the choice index so every
/// checkbox gets a distinct id.
#[derive(Debug, Clone, Default)]
pub struct CheckboxSelectMultiple {
    /// `(value, label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl CheckboxSelectMultiple {
    /// Creates a checkbox list over the given choices.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for CheckboxSelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxSelectMultiple
    }

    fn render(&self, name: &str, values: &[String], attrs: &BTreeMap<String, String>) -> String {
        let mut html = String::from("<div>");
        for (index, (value, label)) in self.choices.iter().enumerate() {
            let mut item_attrs = attrs.clone();
            // A group of checkboxes can't all be required.
            item_attrs.remove("required");
            let id = item_attrs.get("id").map(|id| format!("{id}_{index}"));
            if let Some(id) = &id {
                item_attrs.insert("id".to_string(), id.clone());
            }
            let checked = if values.contains(value) { " checked" } else { "" };
            html.push_str(&format!(
                r#"<div><label{}><input type="checkbox" name="{name}" value="{}"{}{checked}> {}</label></div>"#,
                id.map(|id| format!(r#" for="{id}""#)).unwrap_or_default(),
                escape_html(value),
                render_attrs(&item_attrs),
                escape_html(label)
            ));
        }
        html.push_str("</div>");
        html
    }

    fn id_for_label(&self, id: &str) -> String {
        format!("{id}_0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_text_input_render() {
        let html = TextInput.render(
            "username",
            &["bob".into()],
            &attrs(&[("id", "id_username"), ("placeholder", "Search by username")]),
        );
        assert_eq!(
            html,
            r#"<input type="text" name="username" value="bob" id="id_username" placeholder="Search by username">"#
        );
    }

    #[test]
    fn test_text_input_escapes_value() {
        let html = TextInput.render("q", &["<script>".into()], &BTreeMap::new());
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_password_never_echoes() {
        let html =
            PasswordInput.render("password1", &["secret".into()], &attrs(&[("required", "")]));
        assert_eq!(html, r#"<input type="password" name="password1" required>"#);
    }

    #[test]
    fn test_select_marks_selected() {
        let widget = Select::new(vec![
            ("1".into(), "Toyota Japan".into()),
            ("2".into(), "BMW Germany".into()),
        ]);
        let html = widget.render("manufacturer", &["2".into()], &BTreeMap::new());
        assert!(html
            .starts_with(r#"<select name="manufacturer"><option value="">---------</option>"#));
        assert!(html.contains(r#"<option value="2" selected>BMW Germany</option>"#));
        assert!(html.contains(r#"<option value="1">Toyota Japan</option>"#));
        assert_eq!(widget.widget_type(), WidgetType::Select);
    }

    #[test]
    fn test_select_multiple() {
        let widget = SelectMultiple::new(vec![("1".into(), "a".into()), ("2".into(), "b".into())]);
        let html = widget.render("drivers", &["1".into(), "2".into()], &BTreeMap::new());
        assert_eq!(html.matches(" selected").count(), 2);
        assert!(html.contains("multiple"));
    }

    #[test]
    fn test_checkbox_select_multiple() {
        let widget = CheckboxSelectMultiple::new(vec![
            ("1".into(), "alice".into()),
            ("2".into(), "bob".into()),
        ]);
        let html = widget.render(
            "drivers",
            &["2".into()],
            &attrs(&[("id", "id_drivers"), ("required", "")]),
        );
        assert!(html.contains(
            r#"<label for="id_drivers_0"><input type="checkbox" name="drivers" value="1" id="id_drivers_0"> alice</label>"#
        ));
        assert!(html.contains(r#"value="2" id="id_drivers_1" checked> bob"#));
        assert!(!html.contains("required"));
        assert_eq!(widget.id_for_label("id_drivers"), "id_drivers_0");
    }
}
