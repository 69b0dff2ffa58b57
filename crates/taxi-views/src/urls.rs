//! URL configuration: every route of the site, plus the admin.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use taxi_admin::AdminSite;
use taxi_core::TaxiResult;

use crate::state::SharedState;
use crate::views::{auth, cars, drivers, index, manufacturers};

/// Builds the application router over `state`.
///
/// The admin site is mounted at `/admin/` with the same session store, so
/// a staff driver logged in on the site is logged in on the admin too.
pub fn routes(state: SharedState) -> TaxiResult<Router> {
    let admin: Router = AdminSite::taxi()?.into_router(Arc::clone(&state));

    let site = Router::new()
        .route("/", get(index::index))
        .route("/accounts/login/", get(auth::login_form).post(auth::login))
        .route("/accounts/logout/", post(auth::logout))
        .route("/manufacturers/", get(manufacturers::manufacturer_list))
        .route(
            "/manufacturers/create/",
            get(manufacturers::manufacturer_create_form).post(manufacturers::manufacturer_create),
        )
        .route(
            "/manufacturers/{id}/update/",
            get(manufacturers::manufacturer_update_form).post(manufacturers::manufacturer_update),
        )
        .route(
            "/manufacturers/{id}/delete/",
            get(manufacturers::manufacturer_delete_confirm)
                .post(manufacturers::manufacturer_delete),
        )
        .route("/cars/", get(cars::car_list))
        .route("/cars/{id}/", get(cars::car_detail))
        .route(
            "/cars/create/",
            get(cars::car_create_form).post(cars::car_create),
        )
        .route(
            "/cars/{id}/update/",
            get(cars::car_update_form).post(cars::car_update),
        )
        .route(
            "/cars/{id}/delete/",
            get(cars::car_delete_confirm).post(cars::car_delete),
        )
        .route("/cars/{id}/toggle-assign/", post(cars::car_toggle_assign))
        .route("/drivers/", get(drivers::driver_list))
        .route("/drivers/{id}/", get(drivers::driver_detail))
        .route(
            "/drivers/create/",
            get(drivers::driver_create_form).post(drivers::driver_create),
        )
        .route(
            "/drivers/{id}/update/",
            get(drivers::driver_license_form).post(drivers::driver_license_update),
        )
        .route(
            "/drivers/{id}/delete/",
            get(drivers::driver_delete_confirm).post(drivers::driver_delete),
        )
        .with_state(state);

    Ok(site.merge(admin))
}
