//! Account forms.
//!
//! - [`AuthenticationForm`] - login with username and password
//! - [`DriverCreationForm`] - new driver account with password confirmation
//!   and license number
//!
//! Both need the store during validation (credential check, username
//! uniqueness), so they hold a [`TaxiStore`] handle.

use std::collections::HashMap;

use async_trait::async_trait;
use taxi_core::TaxiResult;
use taxi_db::{Driver, NewDriver, TaxiStore};
use taxi_forms::driver::license_number_field;
use taxi_forms::fields::{FormFieldDef, FormFieldType};
use taxi_forms::form::{invalid_form_error, BaseForm, Form, NON_FIELD_ERRORS};
use taxi_forms::validators::UsernameValidator;
use taxi_forms::Value;
use taxi_http::QueryDict;

use crate::backends::authenticate;
use crate::hashers::{make_password, validate_password};

/// Maximum username length.
pub const USERNAME_MAX_LENGTH: usize = 150;

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

fn password_field(name: &str) -> FormFieldDef {
    FormFieldDef::new(
        name,
        FormFieldType::Char {
            min_length: None,
            max_length: None,
            strip: false,
        },
    )
    .password()
}

fn username_field() -> FormFieldDef {
    FormFieldDef::new("username", FormFieldType::char(USERNAME_MAX_LENGTH))
        .validator(Box::new(UsernameValidator))
        .help_text("Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only.")
}

// ── AuthenticationForm ──────────────────────────────────────────────

/// Login form. Valid only when the credentials match an active driver,
/// who is then available from [`user`](Self::user).
#[derive(Debug)]
pub struct AuthenticationForm {
    inner: BaseForm,
    store: TaxiStore,
    user: Option<Driver>,
}

impl AuthenticationForm {
    /// Creates an unbound login form.
    pub fn new(store: TaxiStore) -> Self {
        Self {
            inner: BaseForm::new(vec![
                FormFieldDef::new("username", FormFieldType::char(USERNAME_MAX_LENGTH)),
                password_field("password"),
            ]),
            store,
            user: None,
        }
    }

    /// The authenticated driver after a successful validation.
    pub const fn user(&self) -> Option<&Driver> {
        self.user.as_ref()
    }
}

#[async_trait]
impl Form for AuthenticationForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.inner.fields()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.user = None;
        self.inner.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    async fn is_valid(&mut self) -> bool {
        self.user = None;
        if !self.inner.is_valid().await {
            return false;
        }
        let (Some(username), Some(password)) = (
            self.inner.cleaned_str("username"),
            self.inner.cleaned_str("password"),
        ) else {
            return false;
        };
        match authenticate(&self.store, username, password).await {
            Ok(Some(driver)) => {
                self.user = Some(driver);
                true
            }
            Ok(None) => {
                self.inner.add_error(NON_FIELD_ERRORS, INVALID_LOGIN);
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Authentication failed");
                self.inner.add_error(NON_FIELD_ERRORS, INVALID_LOGIN);
                false
            }
        }
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.inner.errors()
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        self.inner.cleaned_data()
    }

    fn as_context(&self) -> serde_json::Value {
        self.inner.as_context()
    }
}

// ── DriverCreationForm ──────────────────────────────────────────────

/// New driver account: `username`, `password1`, `password2`, `first_name`,
/// `last_name`, `license_number`.
///
/// Password mismatch and password-strength failures are reported on
/// `password2`; license format failures on `license_number`.
#[derive(Debug)]
pub struct DriverCreationForm {
    inner: BaseForm,
    store: TaxiStore,
}

impl DriverCreationForm {
    /// Creates an unbound form.
    pub fn new(store: TaxiStore) -> Self {
        Self {
            inner: BaseForm::new(vec![
                username_field(),
                password_field("password1").label("Password"),
                password_field("password2")
                    .label("Password confirmation")
                    .help_text("Enter the same password as before, for verification."),
                FormFieldDef::new("first_name", FormFieldType::char(150)).required(false),
                FormFieldDef::new("last_name", FormFieldType::char(150)).required(false),
                license_number_field(),
            ]),
            store,
        }
    }

    /// Hashes the password and creates the driver. Username or license
    /// collisions found by the database become field errors.
    pub async fn save(&mut self) -> TaxiResult<Driver> {
        let (Some(username), Some(password), Some(license)) = (
            self.inner.cleaned_str("username"),
            self.inner.cleaned_str("password1"),
            self.inner.cleaned_str("license_number"),
        ) else {
            return Err(invalid_form_error(self.inner.errors()));
        };
        if self.inner.has_errors() {
            return Err(invalid_form_error(self.inner.errors()));
        }
        let new = NewDriver::new(username, make_password(password).await?)
            .name(
                self.inner.cleaned_str("first_name").unwrap_or_default(),
                self.inner.cleaned_str("last_name").unwrap_or_default(),
            )
            .license_number(license);
        self.store
            .create_driver(new)
            .await
            .map_err(|e| self.inner.absorb_save_error(e))
    }
}

#[async_trait]
impl Form for DriverCreationForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.inner.fields()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.inner.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    async fn is_valid(&mut self) -> bool {
        if !self.inner.is_bound() {
            return false;
        }
        let fields_valid = self.inner.is_valid().await;
        if let Err(errors) = self.clean().await {
            self.inner.merge_errors(errors);
        }
        fields_valid && !self.inner.has_errors()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.inner.errors()
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        self.inner.cleaned_data()
    }

    fn as_context(&self) -> serde_json::Value {
        self.inner.as_context()
    }

    async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        let mut errors: HashMap<String, Vec<String>> = HashMap::new();
        let username = self.inner.cleaned_str("username");

        if let Some(username) = username {
            match self.store.get_driver_by_username(username).await {
                Ok(Some(_)) => errors
                    .entry("username".to_string())
                    .or_default()
                    .push(DUPLICATE_USERNAME.to_string()),
                Ok(None) => {}
                // The UNIQUE constraint still catches it on save.
                Err(e) => tracing::warn!(error = %e, "Username availability check failed"),
            }
        }

        if let (Some(p1), Some(p2)) = (
            self.inner.cleaned_str("password1"),
            self.inner.cleaned_str("password2"),
        ) {
            if p1 == p2 {
                let attributes: Vec<&str> = [
                    username,
                    self.inner.cleaned_str("first_name"),
                    self.inner.cleaned_str("last_name"),
                ]
                .into_iter()
                .flatten()
                .collect();
                if let Err(messages) = validate_password(p2, &attributes) {
                    errors.entry("password2".to_string()).or_default().extend(messages);
                }
            } else {
                errors
                    .entry("password2".to_string())
                    .or_default()
                    .push(PASSWORD_MISMATCH.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
