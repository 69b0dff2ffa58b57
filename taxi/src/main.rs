//! The `taxi` management binary.

use anyhow::Context;
use taxi_cli::builtin_registry;
use taxi_cli::command::settings_path;
use taxi_core::logging::setup_logging;
use taxi_core::settings_loader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = builtin_registry();
    let matches = registry.build_cli().get_matches();

    let path = settings_path(&matches);
    let settings = settings_loader::load(path.as_deref()).context("failed to load settings")?;
    setup_logging(&settings);
    tracing::debug!(database = %settings.database.path.display(), "Loaded settings");

    registry
        .execute(&matches, &settings)
        .await
        .context("command failed")?;
    Ok(())
}
