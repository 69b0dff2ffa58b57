//! Form validation pipeline.
//!
//! Validation runs in two steps:
//! 1. Field-level: type coercion and per-field validators
//!    ([`clean_fields`]).
//! 2. Form-level: cross-field checks in [`Form::clean`], which may hit the
//!    database.
//!
//! Errors accumulate across fields rather than stopping at the first one.

use std::collections::HashMap;

use crate::fields::{clean_field_value, FormFieldDef};
use crate::form::Form;
use crate::value::Value;

/// Cleans every field, filling `cleaned_data` for valid fields and
/// `errors` for the rest.
pub fn clean_fields(
    field_defs: &[FormFieldDef],
    raw_data: &HashMap<String, Vec<String>>,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    for field in field_defs {
        let raw = raw_data.get(&field.name).map_or(&[][..], Vec::as_slice);
        match clean_field_value(field, raw) {
            Ok(value) => {
                cleaned_data.insert(field.name.clone(), value);
            }
            Err(field_errors) => {
                errors.insert(field.name.clone(), field_errors);
            }
        }
    }
}

/// Runs the full pipeline on any form and returns its errors as sorted
/// `(field, messages)` pairs.
pub async fn full_clean(form: &mut dyn Form) -> Result<(), Vec<(String, Vec<String>)>> {
    if form.is_valid().await {
        return Ok(());
    }
    let mut errors: Vec<(String, Vec<String>)> = form
        .errors()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    errors.sort_by(|a, b| a.0.cmp(&b.0));
    Err(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormFieldType;
    use crate::form::BaseForm;
    use taxi_http::QueryDict;

    #[test]
    fn test_clean_fields_accumulates() {
        let defs = vec![
            FormFieldDef::new("a", FormFieldType::char(3)),
            FormFieldDef::new("b", FormFieldType::char(3)),
            FormFieldDef::new("c", FormFieldType::char(3)),
        ];
        let mut raw = HashMap::new();
        raw.insert("a".to_string(), vec!["ok".to_string()]);
        raw.insert("b".to_string(), vec!["too long".to_string()]);
        let mut cleaned = HashMap::new();
        let mut errors = HashMap::new();
        clean_fields(&defs, &raw, &mut cleaned, &mut errors);

        assert_eq!(cleaned.get("a"), Some(&Value::from("ok")));
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("b"));
        assert_eq!(errors["c"], vec!["This field is required."]);
    }

    #[tokio::test]
    async fn test_full_clean_sorted_errors() {
        let mut form = BaseForm::new(vec![
            FormFieldDef::new("z", FormFieldType::char(3)),
            FormFieldDef::new("a", FormFieldType::char(3)),
        ]);
        form.bind(&QueryDict::new());
        let errors = full_clean(&mut form).await.unwrap_err();
        let names: Vec<&str> = errors.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["a", "z"]);
    }
}
