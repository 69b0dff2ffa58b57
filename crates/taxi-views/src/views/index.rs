//! The home page.

use axum::extract::State;
use axum::response::Html;
use serde_json::json;
use taxi_auth::{AuthState, CurrentUser};

use super::{render, user_context};
use crate::error::AppResult;
use crate::state::SharedState;

/// Session key of the home page visit counter.
pub const NUM_VISITS_KEY: &str = "num_visits";

/// `GET /`: record counts and how many times this session has seen the page.
pub async fn index(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> AppResult<Html<String>> {
    let store = state.store();
    let num_drivers = store.count_drivers().await?;
    let num_cars = store.count_cars().await?;
    let num_manufacturers = store.count_manufacturers().await?;

    let mut session = user.session.clone();
    let num_visits = session
        .get(NUM_VISITS_KEY)
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0)
        + 1;
    session.set(NUM_VISITS_KEY, json!(num_visits));
    state.sessions().save(&session).await?;

    let mut context = user_context(&user);
    context.insert("num_drivers", &num_drivers);
    context.insert("num_cars", &num_cars);
    context.insert("num_manufacturers", &num_manufacturers);
    context.insert("num_visits", &num_visits);
    render(&state, "taxi/index.html", &context)
}
