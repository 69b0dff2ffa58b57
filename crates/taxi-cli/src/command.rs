//! The management command framework.
//!
//! A [`ManagementCommand`] names itself, declares its clap arguments, and
//! handles a parsed invocation. [`CommandRegistry`] collects commands,
//! builds the `taxi` CLI from them, and dispatches to the chosen one.
//!
//! ## Defining a command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use taxi_cli::command::ManagementCommand;
//! use taxi_core::{Settings, TaxiResult};
//!
//! struct HelloCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for HelloCommand {
//!     fn name(&self) -> &str { "hello" }
//!     fn help(&self) -> &str { "Say hello" }
//!
//!     async fn handle(&self, _matches: &clap::ArgMatches, _settings: &Settings) -> TaxiResult<()> {
//!         println!("Hello from taxi!");
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use taxi_core::{Settings, TaxiError, TaxiResult};
use taxi_db::TaxiStore;

/// Name of the global option pointing at a TOML settings file.
pub const SETTINGS_ARG: &str = "settings";

/// A command invocable as `taxi <name>`.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &str;

    /// One-line help shown in `taxi --help`.
    fn help(&self) -> &str;

    /// Adds the command's arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()>;
}

/// The set of commands the `taxi` binary knows.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn ManagementCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing one with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Looks a command up by name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Registered command names, sorted.
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// The number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the `taxi` clap command with one subcommand per registered
    /// command and the global `--settings` option.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("taxi")
            .about("taxi-service management utility")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new(SETTINGS_ARG)
                    .long(SETTINGS_ARG)
                    .global(true)
                    .value_name("PATH")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("TOML settings file (default: taxi.toml when present)"),
            );

        for command in self.commands.values() {
            // Without clap's `string` feature, subcommand names must be
            // `'static`. Commands are registered once per process.
            let name: &'static str = Box::leak(command.name().to_string().into_boxed_str());
            let sub = clap::Command::new(name).about(command.help().to_string());
            app = app.subcommand(command.add_arguments(sub));
        }
        app
    }

    /// Dispatches the parsed invocation to its command.
    pub async fn execute(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| TaxiError::ConfigurationError("No subcommand specified".to_string()))?;
        let command = self
            .get(name)
            .ok_or_else(|| TaxiError::ConfigurationError(format!("Unknown command: {name}")))?;
        tracing::debug!(command = name, "Running management command");
        command.handle(sub_matches, settings).await
    }
}

/// Returns the `--settings` path of a parsed invocation, if given.
pub fn settings_path(matches: &clap::ArgMatches) -> Option<PathBuf> {
    matches.get_one::<PathBuf>(SETTINGS_ARG).cloned()
}

/// Opens the configured database.
pub fn open_store(settings: &Settings) -> TaxiResult<TaxiStore> {
    TaxiStore::open(settings.database.path.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCommand {
        name: &'static str,
    }

    #[async_trait]
    impl ManagementCommand for EchoCommand {
        fn name(&self) -> &str {
            self.name
        }

        fn help(&self) -> &str {
            "Echo"
        }

        fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
            cmd.arg(
                clap::Arg::new("loud")
                    .long("loud")
                    .action(clap::ArgAction::SetTrue),
            )
        }

        async fn handle(&self, matches: &clap::ArgMatches, _settings: &Settings) -> TaxiResult<()> {
            if matches.get_flag("loud") {
                return Err(TaxiError::BadRequest("too loud".to_string()));
            }
            Ok(())
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(EchoCommand { name: "zeta" }));
        registry.register(Box::new(EchoCommand { name: "alpha" }));
        registry
    }

    #[test]
    fn test_register_and_list_sorted() {
        let mut registry = registry();
        assert_eq!(registry.list_commands(), vec!["alpha", "zeta"]);
        registry.register(Box::new(EchoCommand { name: "alpha" }));
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.get("zeta").unwrap().help(), "Echo");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_global_settings_option() {
        let matches = registry()
            .build_cli()
            .try_get_matches_from(["taxi", "alpha", "--settings", "conf/taxi.toml"])
            .unwrap();
        assert_eq!(settings_path(&matches), Some(PathBuf::from("conf/taxi.toml")));

        let matches = registry()
            .build_cli()
            .try_get_matches_from(["taxi", "alpha"])
            .unwrap();
        assert_eq!(settings_path(&matches), None);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(registry().build_cli().try_get_matches_from(["taxi"]).is_err());
        assert!(registry()
            .build_cli()
            .try_get_matches_from(["taxi", "nope"])
            .is_err());
    }

    #[tokio::test]
    async fn test_execute_dispatches() {
        let registry = registry();
        let settings = Settings::for_testing();
        let ok = registry
            .build_cli()
            .try_get_matches_from(["taxi", "zeta"])
            .unwrap();
        assert!(registry.execute(&ok, &settings).await.is_ok());

        let loud = registry
            .build_cli()
            .try_get_matches_from(["taxi", "zeta", "--loud"])
            .unwrap();
        assert!(matches!(
            registry.execute(&loud, &settings).await,
            Err(TaxiError::BadRequest(_))
        ));
    }
}
