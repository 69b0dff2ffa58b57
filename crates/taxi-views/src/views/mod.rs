//! Request handlers, one module per area of the site.
//!
//! Handlers take the shared state, a [`CurrentUser`] for login-gated pages,
//! and return rendered HTML or a `302` redirect. Form pages follow one
//! shape: GET renders the unbound form, POST binds the body, saves when
//! valid, and otherwise re-renders with errors and status `200`.

pub mod auth;
pub mod cars;
pub mod drivers;
pub mod index;
pub mod manufacturers;

use axum::response::{Html, IntoResponse, Response};
use http::{header, HeaderValue, StatusCode};
use serde::Serialize;
use taxi_auth::{AuthState, CurrentUser};
use taxi_core::{TaxiError, TaxiResult};
use taxi_http::QueryDict;
use tera::Context;

use crate::error::AppResult;
use crate::pagination::Paginator;
use crate::state::AppState;

/// A fresh template context with the logged-in driver as `user`.
pub(crate) fn user_context(user: &CurrentUser) -> Context {
    let mut context = Context::new();
    context.insert("user", &user.driver);
    context
}

/// Renders a template into an HTML response.
pub(crate) fn render(
    state: &AppState,
    template: &str,
    context: &Context,
) -> AppResult<Html<String>> {
    Ok(Html(state.templates().render(template, context)?))
}

/// A `302 Found` redirect.
pub(crate) fn redirect(location: &str) -> TaxiResult<Response> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| TaxiError::InternalServerError(format!("Bad redirect target: {e}")))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Parses the raw query string.
pub(crate) fn query_params(raw: Option<&str>) -> QueryDict {
    QueryDict::parse(raw.unwrap_or_default())
}

/// Splits `objects` into pages of `paginate_by`, picks the page named by
/// `?page=`, and adds `object_list`, `page`, and `paginator_count` to the
/// context. An invalid page is `404`.
pub(crate) fn paginate<T: Serialize + Clone>(
    state: &AppState,
    context: &mut Context,
    objects: Vec<T>,
    params: &QueryDict,
) -> AppResult<()> {
    let paginator = Paginator::new(objects, state.settings().paginate_by);
    let page = paginator.page_from_query(params.get("page"))?;
    context.insert("object_list", &page.object_list);
    context.insert("page", &page.links(params));
    context.insert("paginator_count", &paginator.count());
    context.insert("paginate_by", &paginator.per_page());
    Ok(())
}

/// Runs a save that may fail validation. Validation failures come back as
/// `Ok(None)` so the caller re-renders the form; other errors propagate.
pub(crate) fn saved<T>(result: TaxiResult<T>) -> AppResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TaxiError::ValidationError(e)) => {
            tracing::debug!(error = %e, "Form rejected on save");
            Ok(None)
        }
        Err(other) => Err(other.into()),
    }
}
