//! The compiled page templates.
//!
//! Templates are embedded in the binary and compiled once at startup, so a
//! syntax error fails [`Templates::new`] rather than a request.

use taxi_core::{TaxiError, TaxiResult};
use tera::{Context, Tera};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("includes/forms.html", include_str!("../templates/includes/forms.html")),
    ("includes/pagination.html", include_str!("../templates/includes/pagination.html")),
    ("registration/login.html", include_str!("../templates/registration/login.html")),
    ("taxi/index.html", include_str!("../templates/taxi/index.html")),
    ("taxi/manufacturer_list.html", include_str!("../templates/taxi/manufacturer_list.html")),
    ("taxi/manufacturer_form.html", include_str!("../templates/taxi/manufacturer_form.html")),
    (
        "taxi/manufacturer_confirm_delete.html",
        include_str!("../templates/taxi/manufacturer_confirm_delete.html"),
    ),
    ("taxi/car_list.html", include_str!("../templates/taxi/car_list.html")),
    ("taxi/car_detail.html", include_str!("../templates/taxi/car_detail.html")),
    ("taxi/car_form.html", include_str!("../templates/taxi/car_form.html")),
    ("taxi/car_confirm_delete.html", include_str!("../templates/taxi/car_confirm_delete.html")),
    ("taxi/driver_list.html", include_str!("../templates/taxi/driver_list.html")),
    ("taxi/driver_detail.html", include_str!("../templates/taxi/driver_detail.html")),
    ("taxi/driver_form.html", include_str!("../templates/taxi/driver_form.html")),
    ("taxi/driver_license_form.html", include_str!("../templates/taxi/driver_license_form.html")),
    (
        "taxi/driver_confirm_delete.html",
        include_str!("../templates/taxi/driver_confirm_delete.html"),
    ),
];

/// The template set used by every page.
pub struct Templates {
    tera: Tera,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("count", &TEMPLATES.len())
            .finish()
    }
}

impl Templates {
    /// Compiles the embedded templates.
    pub fn new() -> TaxiResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())
            .map_err(|e| TaxiError::TemplateError(format!("Failed to compile templates: {e}")))?;
        Ok(Self { tera })
    }

    /// Renders `name` with `context`.
    pub fn render(&self, name: &str, context: &Context) -> TaxiResult<String> {
        self.tera.render(name, context).map_err(|e| {
            let mut message = format!("{name}: {e}");
            let mut source = std::error::Error::source(&e);
            while let Some(inner) = source {
                message.push_str(&format!(": {inner}"));
                source = inner.source();
            }
            TaxiError::TemplateError(message)
        })
    }

    /// Whether a template with this name is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let templates = Templates::new().unwrap();
        for (name, _) in TEMPLATES {
            assert!(templates.has_template(name), "{name}");
        }
    }

    #[test]
    fn test_render_escapes_values() {
        let templates = Templates::new().unwrap();
        let mut context = Context::new();
        context.insert("user", &serde_json::Value::Null);
        context.insert("num_drivers", &1);
        context.insert("num_cars", &2);
        context.insert("num_manufacturers", &3);
        context.insert("num_visits", &1);
        let html = templates.render("taxi/index.html", &context).unwrap();
        assert!(html.contains("<strong>Cars:</strong> 2"));
        assert!(html.contains("visited this page 1 time."));
    }

    #[test]
    fn test_missing_template_is_template_error() {
        let templates = Templates::new().unwrap();
        let err = templates.render("taxi/nope.html", &Context::new()).unwrap_err();
        assert!(matches!(err, TaxiError::TemplateError(_)));
    }
}
