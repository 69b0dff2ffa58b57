//! `taxi createsuperuser`: creates a staff account with full access.
//!
//! Interactively, the username, email, and password are prompted for. With
//! `--noinput` they come from the options, and the password from
//! `--password` or the `TAXI_SUPERUSER_PASSWORD` environment variable.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use taxi_auth::{make_password, validate_password};
use taxi_core::{Settings, TaxiError, TaxiResult, ValidationError};
use taxi_db::{Driver, NewDriver, TaxiStore};

use crate::command::{open_store, ManagementCommand};

/// Environment variable consulted for the password under `--noinput`.
pub const PASSWORD_ENV: &str = "TAXI_SUPERUSER_PASSWORD";

/// Creates a superuser.
pub struct CreatesuperuserCommand;

#[async_trait]
impl ManagementCommand for CreatesuperuserCommand {
    fn name(&self) -> &'static str {
        "createsuperuser"
    }

    fn help(&self) -> &'static str {
        "Create a superuser account"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("username")
                .long("username")
                .help("Username for the superuser"),
        )
        .arg(
            clap::Arg::new("email")
                .long("email")
                .help("Email address for the superuser"),
        )
        .arg(
            clap::Arg::new("password")
                .long("password")
                .help("Password for the superuser (with --noinput)"),
        )
        .arg(
            clap::Arg::new("noinput")
                .long("noinput")
                .action(clap::ArgAction::SetTrue)
                .help("Do not prompt for input"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let store = open_store(settings)?;
        store.migrate().await?;

        let username = matches.get_one::<String>("username").cloned();
        let email = matches.get_one::<String>("email").cloned();

        let (username, email, password) = if matches.get_flag("noinput") {
            let username = username.ok_or_else(|| {
                TaxiError::ConfigurationError("--username is required with --noinput".to_string())
            })?;
            let password = matches
                .get_one::<String>("password")
                .cloned()
                .or_else(|| std::env::var(PASSWORD_ENV).ok())
                .ok_or_else(|| {
                    TaxiError::ConfigurationError(format!(
                        "--password or {PASSWORD_ENV} is required with --noinput"
                    ))
                })?;
            (username, email.unwrap_or_default(), password)
        } else {
            tokio::task::spawn_blocking(move || {
                let stdin = std::io::stdin();
                let mut input = stdin.lock();
                let mut output = std::io::stdout();
                prompt_credentials(&mut input, &mut output, username, email)
            })
            .await
            .map_err(|e| TaxiError::InternalServerError(format!("Prompt task failed: {e}")))??
        };

        let driver = create_superuser(&store, &username, &email, &password).await?;
        println!("Superuser created successfully.");
        tracing::info!(id = driver.id, username = %driver.username, "Created superuser");
        Ok(())
    }
}

/// Validates the credentials and stores a staff superuser.
///
/// The username must be non-blank and free; the password must pass the
/// password validators.
pub async fn create_superuser(
    store: &TaxiStore,
    username: &str,
    email: &str,
    password: &str,
) -> TaxiResult<Driver> {
    let username = username.trim();
    if username.is_empty() {
        return Err(invalid("Username cannot be blank.", "required"));
    }
    if store.get_driver_by_username(username).await?.is_some() {
        return Err(invalid("That username is already taken.", "unique"));
    }
    if let Err(messages) = validate_password(password, &[username, email]) {
        return Err(invalid(messages.join(" "), "password_invalid"));
    }

    let hash = make_password(password).await?;
    store
        .create_driver(NewDriver::new(username, hash).email(email).superuser())
        .await
}

fn invalid(message: impl Into<String>, code: &str) -> TaxiError {
    TaxiError::ValidationError(ValidationError::new(message, code))
}

fn prompt(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> TaxiResult<String> {
    write!(output, "{label}: ")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(TaxiError::ConfigurationError(format!(
            "No input for {label}; use --noinput"
        )));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Asks for whatever the options did not give, plus the password twice.
fn prompt_credentials(
    input: &mut impl BufRead,
    output: &mut impl Write,
    username: Option<String>,
    email: Option<String>,
) -> TaxiResult<(String, String, String)> {
    let username = match username {
        Some(u) => u,
        None => prompt(input, output, "Username")?,
    };
    let email = match email {
        Some(e) => e,
        None => prompt(input, output, "Email address")?,
    };
    let password = prompt(input, output, "Password")?;
    let again = prompt(input, output, "Password (again)")?;
    if password != again {
        return Err(invalid("The two password fields didn't match.", "password_mismatch"));
    }
    Ok((username, email, password))
}
