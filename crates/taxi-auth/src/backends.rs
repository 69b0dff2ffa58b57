//! Username/password authentication against the driver table.

use taxi_core::TaxiResult;
use taxi_db::{Driver, TaxiStore};

use crate::hashers::{check_password, make_password};

/// Returns the driver whose username and password match, if any.
///
/// Inactive drivers never authenticate. Usernames are case-sensitive.
pub async fn authenticate(
    store: &TaxiStore,
    username: &str,
    password: &str,
) -> TaxiResult<Option<Driver>> {
    let Some(driver) = store.get_driver_by_username(username).await? else {
        // Hash anyway so unknown usernames take as long as wrong passwords.
        make_password(password).await?;
        tracing::debug!(%username, "Login attempt for unknown username");
        return Ok(None);
    };
    if !check_password(password, &driver.password).await? {
        tracing::debug!(%username, "Login attempt with wrong password");
        return Ok(None);
    }
    if !driver.is_active {
        return Ok(None);
    }
    store.touch_last_login(driver.id).await?;
    tracing::info!(driver_id = driver.id, %username, "Driver logged in");
    Ok(Some(driver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_db::NewDriver;

    #[tokio::test]
    async fn test_authenticate() {
        let store = TaxiStore::memory_migrated().await.unwrap();
        let hash = make_password("s3cret-pass").await.unwrap();
        store.create_driver(NewDriver::new("bob", hash)).await.unwrap();

        let driver = authenticate(&store, "bob", "s3cret-pass")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(driver.username, "bob");
        let refreshed = store.get_driver(driver.id).await.unwrap();
        assert!(refreshed.last_login.is_some());

        assert!(authenticate(&store, "bob", "wrong").await.unwrap().is_none());
        assert!(authenticate(&store, "BOB", "s3cret-pass").await.unwrap().is_none());
        assert!(authenticate(&store, "nobody", "x").await.unwrap().is_none());
    }
}
