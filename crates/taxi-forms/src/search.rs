//! The search box shown above each list view.
//!
//! One optional text field, at most 255 characters. A blank value means
//! "no filter", and so does an invalid one: the list falls back to showing
//! everything.

use taxi_http::QueryDict;

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::{delegate_form, BaseForm, Form};

/// Maximum accepted length of a search term.
pub const SEARCH_MAX_LENGTH: usize = 255;

/// A single-field search form.
#[derive(Debug)]
pub struct SearchForm {
    inner: BaseForm,
    field_name: &'static str,
}

delegate_form!(SearchForm);

impl SearchForm {
    /// Creates a search form over `field_name` with the given placeholder.
    pub fn new(field_name: &'static str, placeholder: &str) -> Self {
        let field = FormFieldDef::new(field_name, FormFieldType::char(SEARCH_MAX_LENGTH))
            .required(false)
            .label("")
            .placeholder(placeholder);
        Self {
            inner: BaseForm::new(vec![field]),
            field_name,
        }
    }

    /// Searches drivers by username.
    pub fn drivers() -> Self {
        Self::new("username", "Search by username")
    }

    /// Searches cars by model.
    pub fn cars() -> Self {
        Self::new("model", "Search by model")
    }

    /// Searches manufacturers by name.
    pub fn manufacturers() -> Self {
        Self::new("name", "Search by name")
    }

    /// The name of the searched field.
    pub const fn field_name(&self) -> &'static str {
        self.field_name
    }

    /// The validated, non-blank search term. `None` before validation, for
    /// a blank term, and for an invalid form.
    pub fn query(&self) -> Option<&str> {
        if !self.inner.is_bound() || self.inner.has_errors() {
            return None;
        }
        self.inner
            .cleaned_str(self.field_name)
            .filter(|q| !q.is_empty())
    }

    /// Binds the request's query parameters, validates, and returns the
    /// term to filter by.
    pub async fn apply(&mut self, params: &QueryDict) -> Option<String> {
        self.bind(params);
        if !self.is_valid().await {
            tracing::debug!(field = self.field_name, "Ignoring invalid search term");
        }
        self.query().map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_search_means_no_filter() {
        let mut form = SearchForm::drivers();
        assert_eq!(form.apply(&QueryDict::new()).await, None);
        assert!(form.errors().is_empty());
        assert_eq!(form.apply(&QueryDict::parse("username=")).await, None);
    }

    #[tokio::test]
    async fn test_term_is_trimmed() {
        let mut form = SearchForm::cars();
        assert_eq!(
            form.apply(&QueryDict::parse("model=%20Corolla%20")).await,
            Some("Corolla".to_string())
        );
    }

    #[tokio::test]
    async fn test_too_long_is_ignored() {
        let mut form = SearchForm::manufacturers();
        let long = "a".repeat(256);
        let params = QueryDict::from_pairs([("name", long.as_str())]);
        assert_eq!(form.apply(&params).await, None);
        assert!(form.errors().contains_key("name"));
    }

    #[test]
    fn test_variants() {
        assert_eq!(SearchForm::drivers().field_name(), "username");
        assert_eq!(SearchForm::cars().field_name(), "model");
        assert_eq!(SearchForm::manufacturers().field_name(), "name");
        let ctx = SearchForm::cars().as_context();
        assert!(ctx["field"]["model"]["html"]
            .as_str()
            .unwrap()
            .contains(r#"placeholder="Search by model""#));
    }
}
