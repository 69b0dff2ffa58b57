//! Login and logout.

use axum::extract::{RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use http::{header, HeaderMap};
use taxi_auth::extractors::{end_session, set_cookie_header, start_session, Session};
use taxi_auth::{AuthState, AuthenticationForm};
use taxi_forms::Form;
use taxi_http::QueryDict;
use tera::Context;

use super::{query_params, redirect, render};
use crate::error::AppResult;
use crate::state::{AppState, SharedState};

/// Returns `next` when it is a local path, otherwise `fallback`.
pub fn safe_next<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => fallback,
    }
}

fn render_login(
    state: &AppState,
    form: &AuthenticationForm,
    next: &str,
) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("user", &serde_json::Value::Null);
    context.insert("form", &form.as_context());
    context.insert("next", next);
    render(state, "registration/login.html", &context)
}

/// `GET /accounts/login/`
pub async fn login_form(
    State(state): State<SharedState>,
    RawQuery(raw): RawQuery,
) -> AppResult<Html<String>> {
    let params = query_params(raw.as_deref());
    let form = AuthenticationForm::new(state.store().clone());
    render_login(&state, &form, params.get("next").unwrap_or_default())
}

/// `POST /accounts/login/`: on success starts a fresh session and
/// redirects to `next` (or the default landing page).
pub async fn login(
    State(state): State<SharedState>,
    Session(session): Session,
    body: String,
) -> AppResult<Response> {
    let data = QueryDict::parse(&body);
    let mut form = AuthenticationForm::new(state.store().clone());
    form.bind(&data);
    let next = data.get("next").unwrap_or_default();

    if form.is_valid().await {
        if let Some(driver) = form.user().cloned() {
            let (_, cookie) = start_session(&state, session, &driver).await?;
            let target = safe_next(Some(next), &state.settings().login_redirect_url);
            tracing::info!(driver_id = driver.id, "Logged in");
            let mut response = redirect(target)?;
            response
                .headers_mut()
                .append(header::SET_COOKIE, set_cookie_header(&cookie)?);
            return Ok(response);
        }
    }
    Ok(render_login(&state, &form, next)?.into_response())
}

/// `POST /accounts/logout/`: drops the session and returns to the login page.
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie = end_session(&state, &headers).await?;
    let mut response = redirect(&state.settings().login_url)?;
    response
        .headers_mut()
        .append(header::SET_COOKIE, set_cookie_header(&cookie)?);
    Ok(response)
}
