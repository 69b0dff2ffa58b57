//! Runs the built-in commands against a file database.

use taxi_cli::builtin_registry;
use taxi_core::{Settings, TaxiError};
use taxi_db::TaxiStore;

fn settings_in(dir: &tempfile::TempDir) -> Settings {
    let mut settings = Settings::for_testing();
    settings.database.path = dir.path().join("taxi.sqlite3");
    settings
}

async fn run(settings: &Settings, args: &[&str]) -> Result<(), TaxiError> {
    let registry = builtin_registry();
    let matches = registry
        .build_cli()
        .try_get_matches_from(std::iter::once("taxi").chain(args.iter().copied()))
        .unwrap();
    registry.execute(&matches, settings).await
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(&dir);

    run(&settings, &["migrate"]).await.unwrap();
    run(&settings, &["migrate"]).await.unwrap();

    let store = TaxiStore::open(settings.database.path.clone()).unwrap();
    assert!(store.migrate().await.unwrap().is_empty());
    assert_eq!(store.count_drivers().await.unwrap(), 0);
}

#[tokio::test]
async fn test_createsuperuser_noinput() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(&dir);

    run(
        &settings,
        &[
            "createsuperuser",
            "--noinput",
            "--username",
            "admin",
            "--email",
            "admin@example.com",
            "--password",
            "x7#kQ29!vb",
        ],
    )
    .await
    .unwrap();

    let store = TaxiStore::open(settings.database.path.clone()).unwrap();
    let admin = store.get_driver_by_username("admin").await.unwrap().unwrap();
    assert!(admin.is_staff && admin.is_superuser);
    assert_eq!(admin.email, "admin@example.com");

    let err = run(
        &settings,
        &["createsuperuser", "--noinput", "--username", "admin", "--password", "x7#kQ29!vb"],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TaxiError::ValidationError(_)));
}

#[tokio::test]
async fn test_createsuperuser_noinput_requires_username() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(&dir);
    let err = run(&settings, &["createsuperuser", "--noinput", "--password", "x7#kQ29!vb"])
        .await
        .unwrap_err();
    assert!(matches!(err, TaxiError::ConfigurationError(_)));
}

#[test]
fn test_runserver_accepts_address() {
    let registry = builtin_registry();
    let matches = registry
        .build_cli()
        .try_get_matches_from(["taxi", "runserver", "0.0.0.0:9000", "--settings", "prod.toml"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "runserver");
    assert_eq!(sub.get_one::<String>("addr").map(String::as_str), Some("0.0.0.0:9000"));
    assert!(taxi_cli::command::settings_path(&matches).is_some());
}
