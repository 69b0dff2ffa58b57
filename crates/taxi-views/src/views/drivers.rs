//! Driver list, detail, creation, license update, and delete.

use axum::extract::{Path, RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use taxi_auth::{AuthState, CurrentUser, DriverCreationForm};
use taxi_db::Driver;
use taxi_forms::driver::DriverLicenseUpdateForm;
use taxi_forms::search::SearchForm;
use taxi_forms::Form;
use taxi_http::QueryDict;

use super::{paginate, query_params, redirect, render, saved, user_context};
use crate::error::AppResult;
use crate::state::{AppState, SharedState};

const LIST_URL: &str = "/drivers/";

/// `GET /drivers/`, searchable by `?username=`.
pub async fn driver_list(
    State(state): State<SharedState>,
    RawQuery(raw): RawQuery,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let params = query_params(raw.as_deref());
    let mut search = SearchForm::drivers();
    let term = search.apply(&params).await;
    let drivers = state.store().list_drivers(term.as_deref()).await?;

    let mut context = user_context(&user);
    paginate(&state, &mut context, drivers, &params)?;
    context.insert("search_form", &search.as_context());
    render(&state, "taxi/driver_list.html", &context)
}

/// `GET /drivers/{id}/`: the driver with their cars and manufacturers.
pub async fn driver_detail(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let detail = state.store().get_driver_detail(id).await?;
    let mut context = user_context(&user);
    context.insert("driver", &detail.driver);
    context.insert("cars", &detail.cars);
    render(&state, "taxi/driver_detail.html", &context)
}

fn render_creation_form(
    state: &AppState,
    user: &CurrentUser,
    form: &DriverCreationForm,
) -> AppResult<Html<String>> {
    let mut context = user_context(user);
    context.insert("form", &form.as_context());
    render(state, "taxi/driver_form.html", &context)
}

/// `GET /drivers/create/`
pub async fn driver_create_form(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let form = DriverCreationForm::new(state.store().clone());
    render_creation_form(&state, &user, &form)
}

/// `POST /drivers/create/`
pub async fn driver_create(
    State(state): State<SharedState>,
    user: CurrentUser,
    body: String,
) -> AppResult<Response> {
    let mut form = DriverCreationForm::new(state.store().clone());
    form.bind(&QueryDict::parse(&body));
    if form.is_valid().await && saved(form.save().await)?.is_some() {
        return Ok(redirect(LIST_URL)?);
    }
    Ok(render_creation_form(&state, &user, &form)?.into_response())
}

fn render_license_form(
    state: &AppState,
    user: &CurrentUser,
    form: &DriverLicenseUpdateForm,
    object: &Driver,
) -> AppResult<Html<String>> {
    let mut context = user_context(user);
    context.insert("form", &form.as_context());
    context.insert("object", object);
    render(state, "taxi/driver_license_form.html", &context)
}

/// `GET /drivers/{id}/update/`
pub async fn driver_license_form(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let driver = state.store().get_driver(id).await?;
    let form = DriverLicenseUpdateForm::for_instance(&driver);
    render_license_form(&state, &user, &form, &driver)
}

/// `POST /drivers/{id}/update/`: replaces the license number.
pub async fn driver_license_update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    body: String,
) -> AppResult<Response> {
    let driver = state.store().get_driver(id).await?;
    let mut form = DriverLicenseUpdateForm::for_instance(&driver);
    form.bind(&QueryDict::parse(&body));
    if form.is_valid().await && saved(form.save(state.store(), id).await)?.is_some() {
        return Ok(redirect(LIST_URL)?);
    }
    Ok(render_license_form(&state, &user, &form, &driver)?.into_response())
}

/// `GET /drivers/{id}/delete/`
pub async fn driver_delete_confirm(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let driver = state.store().get_driver(id).await?;
    let mut context = user_context(&user);
    context.insert("object", &driver);
    render(&state, "taxi/driver_confirm_delete.html", &context)
}

/// `POST /drivers/{id}/delete/`
pub async fn driver_delete(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    _user: CurrentUser,
) -> AppResult<Response> {
    state.store().delete_driver(id).await?;
    Ok(redirect(LIST_URL)?)
}
