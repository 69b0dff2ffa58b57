//! `taxi runserver`: migrates, then serves the site.

use async_trait::async_trait;
use taxi_core::{Settings, TaxiResult};
use taxi_views::TaxiApp;

use crate::command::{open_store, ManagementCommand};

/// Starts the web server.
///
/// The address defaults to `settings.bind_address`. Pending migrations are
/// applied before the socket is opened.
pub struct RunserverCommand;

#[async_trait]
impl ManagementCommand for RunserverCommand {
    fn name(&self) -> &'static str {
        "runserver"
    }

    fn help(&self) -> &'static str {
        "Start the web server"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("addr")
                .value_name("ADDR")
                .required(false)
                .help("Address to bind, e.g. 0.0.0.0:8000"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let addr = matches
            .get_one::<String>("addr")
            .cloned()
            .unwrap_or_else(|| settings.bind_address.clone());

        let store = open_store(settings)?;
        let applied = store.migrate().await?;
        if !applied.is_empty() {
            tracing::info!(count = applied.len(), "Applied pending migrations");
        }

        TaxiApp::new(settings.clone(), store).run(&addr).await
    }
}
