//! Manufacturer list, create, update, and delete.

use axum::extract::{Path, RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use taxi_auth::{AuthState, CurrentUser};
use taxi_db::Manufacturer;
use taxi_forms::manufacturer::ManufacturerForm;
use taxi_forms::search::SearchForm;
use taxi_forms::Form;
use taxi_http::QueryDict;

use super::{paginate, query_params, redirect, render, saved, user_context};
use crate::error::AppResult;
use crate::state::{AppState, SharedState};

const LIST_URL: &str = "/manufacturers/";

/// `GET /manufacturers/`, searchable by `?name=`.
pub async fn manufacturer_list(
    State(state): State<SharedState>,
    RawQuery(raw): RawQuery,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let params = query_params(raw.as_deref());
    let mut search = SearchForm::manufacturers();
    let term = search.apply(&params).await;
    let manufacturers = state.store().list_manufacturers(term.as_deref()).await?;

    let mut context = user_context(&user);
    paginate(&state, &mut context, manufacturers, &params)?;
    context.insert("search_form", &search.as_context());
    render(&state, "taxi/manufacturer_list.html", &context)
}

fn render_form(
    state: &AppState,
    user: &CurrentUser,
    form: &ManufacturerForm,
    object: Option<&Manufacturer>,
) -> AppResult<Html<String>> {
    let mut context = user_context(user);
    context.insert("form", &form.as_context());
    context.insert("object", &object);
    render(state, "taxi/manufacturer_form.html", &context)
}

/// `GET /manufacturers/create/`
pub async fn manufacturer_create_form(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    render_form(&state, &user, &ManufacturerForm::new(), None)
}

/// `POST /manufacturers/create/`
pub async fn manufacturer_create(
    State(state): State<SharedState>,
    user: CurrentUser,
    body: String,
) -> AppResult<Response> {
    let mut form = ManufacturerForm::new();
    form.bind(&QueryDict::parse(&body));
    if form.is_valid().await && saved(form.save(state.store()).await)?.is_some() {
        return Ok(redirect(LIST_URL)?);
    }
    Ok(render_form(&state, &user, &form, None)?.into_response())
}

/// `GET /manufacturers/{id}/update/`
pub async fn manufacturer_update_form(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let manufacturer = state.store().get_manufacturer(id).await?;
    let form = ManufacturerForm::for_instance(&manufacturer);
    render_form(&state, &user, &form, Some(&manufacturer))
}

/// `POST /manufacturers/{id}/update/`
pub async fn manufacturer_update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    body: String,
) -> AppResult<Response> {
    let manufacturer = state.store().get_manufacturer(id).await?;
    let mut form = ManufacturerForm::for_instance(&manufacturer);
    form.bind(&QueryDict::parse(&body));
    if form.is_valid().await && saved(form.save_update(state.store(), id).await)?.is_some() {
        return Ok(redirect(LIST_URL)?);
    }
    Ok(render_form(&state, &user, &form, Some(&manufacturer))?.into_response())
}

/// `GET /manufacturers/{id}/delete/`: the confirmation page.
pub async fn manufacturer_delete_confirm(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let manufacturer = state.store().get_manufacturer(id).await?;
    let mut context = user_context(&user);
    context.insert("object", &manufacturer);
    render(&state, "taxi/manufacturer_confirm_delete.html", &context)
}

/// `POST /manufacturers/{id}/delete/`
pub async fn manufacturer_delete(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    _user: CurrentUser,
) -> AppResult<Response> {
    state.store().delete_manufacturer(id).await?;
    Ok(redirect(LIST_URL)?)
}
