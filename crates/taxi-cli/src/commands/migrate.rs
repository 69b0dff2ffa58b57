//! `taxi migrate`: brings the database schema up to date.

use async_trait::async_trait;
use taxi_core::{Settings, TaxiResult};

use crate::command::{open_store, ManagementCommand};

/// Applies pending schema migrations and reports each one.
pub struct MigrateCommand;

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Apply pending database migrations"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let store = open_store(settings)?;
        let applied = store.migrate().await?;
        if applied.is_empty() {
            println!("No migrations to apply.");
        } else {
            for name in &applied {
                println!("  Applying {name}... OK");
            }
        }
        let version = store.schema_version().await?;
        tracing::info!(
            database = %settings.database.path.display(),
            applied = applied.len(),
            version,
            "Migrations complete"
        );
        Ok(())
    }
}
