//! Car list, detail, create, update, delete, and driver self-assignment.

use axum::extract::{Path, RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use taxi_auth::{AuthState, CurrentUser};
use taxi_db::Car;
use taxi_forms::car::CarForm;
use taxi_forms::search::SearchForm;
use taxi_forms::Form;
use taxi_http::QueryDict;

use super::{paginate, query_params, redirect, render, saved, user_context};
use crate::error::AppResult;
use crate::state::{AppState, SharedState};

const LIST_URL: &str = "/cars/";

/// `GET /cars/`, searchable by `?model=`. Rows carry the manufacturer.
pub async fn car_list(
    State(state): State<SharedState>,
    RawQuery(raw): RawQuery,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let params = query_params(raw.as_deref());
    let mut search = SearchForm::cars();
    let term = search.apply(&params).await;
    let cars = state.store().list_cars(term.as_deref()).await?;

    let mut context = user_context(&user);
    paginate(&state, &mut context, cars, &params)?;
    context.insert("search_form", &search.as_context());
    render(&state, "taxi/car_list.html", &context)
}

/// `GET /cars/{id}/`: model, manufacturer, and drivers.
pub async fn car_detail(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let detail = state.store().get_car(id).await?;
    let mut context = user_context(&user);
    context.insert("is_assigned", &detail.has_driver(user.driver.id));
    context.insert("car", &detail.car);
    context.insert("manufacturer", &detail.manufacturer);
    context.insert("drivers", &detail.drivers);
    render(&state, "taxi/car_detail.html", &context)
}

fn render_form(
    state: &AppState,
    user: &CurrentUser,
    form: &CarForm,
    object: Option<&Car>,
) -> AppResult<Html<String>> {
    let mut context = user_context(user);
    context.insert("form", &form.as_context());
    context.insert("object", &object);
    render(state, "taxi/car_form.html", &context)
}

/// `GET /cars/create/`
pub async fn car_create_form(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let form = CarForm::load(state.store()).await?;
    render_form(&state, &user, &form, None)
}

/// `POST /cars/create/`
pub async fn car_create(
    State(state): State<SharedState>,
    user: CurrentUser,
    body: String,
) -> AppResult<Response> {
    let mut form = CarForm::load(state.store()).await?;
    form.bind(&QueryDict::parse(&body));
    if form.is_valid().await && saved(form.save(state.store()).await)?.is_some() {
        return Ok(redirect(LIST_URL)?);
    }
    Ok(render_form(&state, &user, &form, None)?.into_response())
}

/// `GET /cars/{id}/update/`
pub async fn car_update_form(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let detail = state.store().get_car(id).await?;
    let form = CarForm::load_for_instance(state.store(), &detail).await?;
    render_form(&state, &user, &form, Some(&detail.car))
}

/// `POST /cars/{id}/update/`: replaces the model, manufacturer, and driver set.
pub async fn car_update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    body: String,
) -> AppResult<Response> {
    let detail = state.store().get_car(id).await?;
    let mut form = CarForm::load_for_instance(state.store(), &detail).await?;
    form.bind(&QueryDict::parse(&body));
    if form.is_valid().await && saved(form.save_update(state.store(), id).await)?.is_some() {
        return Ok(redirect(LIST_URL)?);
    }
    Ok(render_form(&state, &user, &form, Some(&detail.car))?.into_response())
}

/// `GET /cars/{id}/delete/`
pub async fn car_delete_confirm(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let detail = state.store().get_car(id).await?;
    let mut context = user_context(&user);
    context.insert("object", &detail.car);
    render(&state, "taxi/car_confirm_delete.html", &context)
}

/// `POST /cars/{id}/delete/`
pub async fn car_delete(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    _user: CurrentUser,
) -> AppResult<Response> {
    state.store().delete_car(id).await?;
    Ok(redirect(LIST_URL)?)
}

/// `POST /cars/{id}/toggle-assign/`: adds the current driver to the car,
/// or removes them if already assigned, then shows the car.
pub async fn car_toggle_assign(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Response> {
    state.store().get_car(id).await?;
    let assigned = state
        .store()
        .toggle_assignment(id, user.driver.id)
        .await?;
    tracing::info!(car_id = id, driver_id = user.driver.id, assigned, "Toggled car assignment");
    Ok(redirect(&format!("/cars/{id}/"))?)
}
