//! The admin site: model registry, changelist logic, and axum router.
//!
//! [`AdminSite`] holds a [`ModelAdmin`] per registered model and renders
//! the admin pages with its own Tera templates. [`AdminSite::into_router`]
//! produces these routes below the site prefix (`/admin` by default):
//!
//! - `GET /` - index of registered models
//! - `GET /{app}/{model}/` - changelist with `?q=` search and `?field=` filters
//! - `GET /{app}/{model}/{id}/change/` - the object's fieldsets with values
//! - `GET|POST /{app}/{model}/add/` - driver creation
//!
//! Every page requires a staff driver: anonymous requests are redirected
//! to the login page and other drivers get `403 Forbidden`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::{header, HeaderValue, StatusCode};
use serde::Serialize;
use taxi_auth::extractors::StaffUser;
use taxi_auth::{AuthState, DriverCreationForm, SessionBackend};
use taxi_core::{Settings, TaxiError, TaxiResult};
use taxi_db::TaxiStore;
use taxi_forms::Form;
use taxi_http::{query_transform, QueryDict};
use tera::{Context, Tera};

use crate::model_admin::{car_admin, driver_admin, manufacturer_admin, ModelAdmin};
use crate::records::{filter_choices, model_or_404, AdminModel, AdminRecord};

const TEMPLATES: &[(&str, &str)] = &[
    ("admin/base.html", include_str!("../templates/admin/base.html")),
    ("admin/index.html", include_str!("../templates/admin/index.html")),
    ("admin/change_list.html", include_str!("../templates/admin/change_list.html")),
    ("admin/change_form.html", include_str!("../templates/admin/change_form.html")),
    ("admin/add_form.html", include_str!("../templates/admin/add_form.html")),
];

/// The admin site.
///
/// # Examples
///
/// ```
/// use taxi_admin::site::AdminSite;
///
/// let site = AdminSite::taxi().unwrap();
/// assert_eq!(site.registered_models(), vec!["taxi.car", "taxi.driver", "taxi.manufacturer"]);
/// ```
pub struct AdminSite {
    site_header: String,
    url_prefix: String,
    registry: BTreeMap<String, ModelAdmin>,
    tera: Tera,
}

impl std::fmt::Debug for AdminSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSite")
            .field("url_prefix", &self.url_prefix)
            .field("models", &self.registered_models())
            .finish_non_exhaustive()
    }
}

impl AdminSite {
    /// Creates an empty site mounted at `/admin`.
    pub fn new() -> TaxiResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())
            .map_err(|e| TaxiError::TemplateError(format!("Admin templates: {e}")))?;
        Ok(Self {
            site_header: "Taxi administration".to_string(),
            url_prefix: "/admin".to_string(),
            registry: BTreeMap::new(),
            tera,
        })
    }

    /// The site with the driver, car, and manufacturer admins registered.
    pub fn taxi() -> TaxiResult<Self> {
        let mut site = Self::new()?;
        site.register(driver_admin());
        site.register(car_admin());
        site.register(manufacturer_admin());
        Ok(site)
    }

    /// Sets the mount point used when building links.
    #[must_use]
    pub fn url_prefix(mut self, prefix: &str) -> Self {
        self.url_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// The mount point, without a trailing slash.
    pub fn prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Registers a model admin under its model key.
    pub fn register(&mut self, admin: ModelAdmin) {
        tracing::debug!(model = %admin.model_key(), "Registered admin");
        self.registry.insert(admin.model_key(), admin);
    }

    /// Removes a model from the site.
    pub fn unregister(&mut self, model_key: &str) -> Option<ModelAdmin> {
        self.registry.remove(model_key)
    }

    /// The configuration for `model_key` (`"app.model"`).
    pub fn get_model_admin(&self, model_key: &str) -> Option<&ModelAdmin> {
        self.registry.get(model_key)
    }

    /// Registered model keys in sorted order.
    pub fn registered_models(&self) -> Vec<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    fn admin_or_404(&self, app: &str, model: &str) -> TaxiResult<(&ModelAdmin, AdminModel)> {
        let key = format!("{app}.{model}");
        let admin = self
            .registry
            .get(&key)
            .ok_or_else(|| TaxiError::NotFound(format!("Model '{key}' is not registered")))?;
        Ok((admin, model_or_404(model)?))
    }

    fn changelist_url(&self, admin: &ModelAdmin) -> String {
        format!("{}/{}/{}/", self.url_prefix, admin.app_label, admin.model_name)
    }

    /// Builds the changelist for a model: search over `search_fields` with
    /// `?q=`, equality filters over `list_filter`, then pagination with `?p=`.
    pub async fn changelist(
        &self,
        store: &TaxiStore,
        app: &str,
        model: &str,
        params: &QueryDict,
    ) -> TaxiResult<ChangeList> {
        let (admin, kind) = self.admin_or_404(app, model)?;
        let all = kind.load_all(store).await?;

        let query = params.get("q").unwrap_or_default().trim().to_string();
        let mut rows: Vec<AdminRecord> = all
            .iter()
            .filter(|r| {
                query.is_empty()
                    || admin.search_fields.is_empty()
                    || r.matches(&admin.search_fields, &query)
            })
            .filter(|r| {
                admin.list_filter.iter().all(|field| match params.get(field) {
                    Some(wanted) => r.filter_value(field) == Some(wanted),
                    None => true,
                })
            })
            .cloned()
            .collect();
        let result_count = rows.len();

        let per_page = admin.list_per_page.max(1);
        let page_count = result_count.div_ceil(per_page).max(1);
        let page = params
            .get("p")
            .and_then(|p| p.parse::<usize>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
            .min(page_count);
        rows = rows
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        let base_url = self.changelist_url(admin);
        let filters = admin
            .list_filter
            .iter()
            .map(|field| {
                let mut without = params.clone();
                without.remove(field);
                let choices = filter_choices(&all, field)
                    .into_iter()
                    .map(|(value, label)| FilterChoice {
                        url: format!(
                            "{base_url}?{}",
                            query_transform(params, &[(field.as_str(), value.as_str())])
                        ),
                        selected: params.get(field) == Some(value.as_str()),
                        label,
                    })
                    .collect();
                FilterSpec {
                    field: field.clone(),
                    all_url: format!("{base_url}?{}", without.urlencode()),
                    choices,
                }
            })
            .collect();

        Ok(ChangeList {
            admin: admin.clone(),
            columns: admin.list_display.iter().map(|f| column_label(admin, f)).collect(),
            rows,
            query,
            result_count,
            filters,
        })
    }

    fn render(&self, template: &str, context: &Context) -> TaxiResult<String> {
        self.tera
            .render(template, context)
            .map_err(|e| TaxiError::TemplateError(format!("{template}: {e}")))
    }

    fn base_context(&self, user: &StaffUser) -> Context {
        let mut context = Context::new();
        context.insert("site_title", "Taxi site admin");
        context.insert("site_header", &self.site_header);
        context.insert("admin_root", &self.url_prefix);
        context.insert("user", &user.0.driver);
        context
    }

    /// Builds the admin router with every route under [`prefix`](Self::prefix),
    /// ready to be merged into the application router. `auth` supplies the
    /// store, sessions, and settings.
    pub fn into_router<S, S2>(self, auth: S) -> Router<S2>
    where
        S: AuthState + Clone,
        S2: Clone + Send + Sync + 'static,
    {
        let prefix = self.url_prefix.clone();
        let state = AdminState {
            auth,
            site: Arc::new(self),
        };
        Router::new()
            .route(&format!("{prefix}/"), get(handle_index::<S>))
            .route(&format!("{prefix}/{{app}}/{{model}}/"), get(handle_changelist::<S>))
            .route(
                &format!("{prefix}/{{app}}/{{model}}/add/"),
                get(handle_add_form::<S>).post(handle_add::<S>),
            )
            .route(
                &format!("{prefix}/{{app}}/{{model}}/{{id}}/change/"),
                get(handle_change::<S>),
            )
            .with_state(state)
    }
}

/// A changelist page, ready to render.
#[derive(Debug, Clone)]
pub struct ChangeList {
    /// The model's configuration.
    pub admin: ModelAdmin,
    /// Column headers, one per `list_display` entry.
    pub columns: Vec<String>,
    /// The rows on the current page.
    pub rows: Vec<AdminRecord>,
    /// The trimmed search term.
    pub query: String,
    /// Rows matching the search and filters, across all pages.
    pub result_count: usize,
    /// Sidebar filters.
    pub filters: Vec<FilterSpec>,
}

impl ChangeList {
    /// The cell values of each row, in column order.
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| self.admin.list_display.iter().map(|f| r.value(f)).collect())
            .collect()
    }
}

/// One sidebar filter.
#[derive(Debug, Clone, Serialize)]
pub struct FilterSpec {
    /// The filtered field.
    pub field: String,
    /// Link that clears this filter.
    pub all_url: String,
    /// The available values.
    pub choices: Vec<FilterChoice>,
}

/// One value of a sidebar filter.
#[derive(Debug, Clone, Serialize)]
pub struct FilterChoice {
    /// The displayed label.
    pub label: String,
    /// Link that applies this value.
    pub url: String,
    /// Whether this value is currently applied.
    pub selected: bool,
}

fn column_label(admin: &ModelAdmin, field: &str) -> String {
    if field == "__str__" {
        return admin.verbose_name.to_uppercase();
    }
    capitalize(&field.replace('_', " "))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

// ── Router state ───────────────────────────────────────────────────

#[derive(Clone)]
struct AdminState<S> {
    auth: S,
    site: Arc<AdminSite>,
}

impl<S: AuthState> AuthState for AdminState<S> {
    fn store(&self) -> &TaxiStore {
        self.auth.store()
    }

    fn sessions(&self) -> &dyn SessionBackend {
        self.auth.sessions()
    }

    fn settings(&self) -> &Settings {
        self.auth.settings()
    }
}

/// A [`TaxiError`] rendered as an admin error page.
#[derive(Debug)]
pub struct AdminError(pub TaxiError);

impl From<TaxiError> for AdminError {
    fn from(err: TaxiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Admin request failed");
            return (status, "Server Error (500)").into_response();
        }
        (status, self.0.to_string()).into_response()
    }
}

type AdminResult<T> = Result<T, AdminError>;

fn query_dict(raw: Option<&str>) -> QueryDict {
    QueryDict::parse(raw.unwrap_or_default())
}

// ── Handlers ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ModelLink {
    name: String,
    url: String,
    add_url: Option<String>,
}

async fn handle_index<S: AuthState + Clone>(
    State(state): State<AdminState<S>>,
    user: StaffUser,
) -> AdminResult<Html<String>> {
    let site = &state.site;
    let models: Vec<ModelLink> = site
        .registry
        .values()
        .map(|admin| {
            let url = site.changelist_url(admin);
            ModelLink {
                name: admin.verbose_name_plural.clone(),
                add_url: admin.has_add_page().then(|| format!("{url}add/")),
                url,
            }
        })
        .collect();
    let mut context = site.base_context(&user);
    context.insert("models", &models);
    Ok(Html(site.render("admin/index.html", &context)?))
}

#[derive(Serialize)]
struct RowContext {
    url: String,
    cells: Vec<String>,
}

async fn handle_changelist<S: AuthState + Clone>(
    State(state): State<AdminState<S>>,
    Path((app, model)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
    user: StaffUser,
) -> AdminResult<Html<String>> {
    let site = &state.site;
    let params = query_dict(raw.as_deref());
    let changelist = site
        .changelist(state.auth.store(), &app, &model, &params)
        .await?;
    let base_url = site.changelist_url(&changelist.admin);
    let rows: Vec<RowContext> = changelist
        .rows
        .iter()
        .zip(changelist.cells())
        .map(|(record, cells)| RowContext {
            url: format!("{base_url}{}/change/", record.pk),
            cells,
        })
        .collect();

    let mut context = site.base_context(&user);
    context.insert("verbose_name", &changelist.admin.verbose_name);
    context.insert("verbose_name_plural", &changelist.admin.verbose_name_plural);
    context.insert("searchable", &!changelist.admin.search_fields.is_empty());
    context.insert("query", &changelist.query);
    context.insert("columns", &changelist.columns);
    context.insert("rows", &rows);
    context.insert("result_count", &changelist.result_count);
    context.insert("filters", &changelist.filters);
    context.insert(
        "add_url",
        &changelist
            .admin
            .has_add_page()
            .then(|| format!("{base_url}add/")),
    );
    Ok(Html(site.render("admin/change_list.html", &context)?))
}

#[derive(Serialize)]
struct FieldRow {
    field: String,
    label: String,
    value: String,
}

#[derive(Serialize)]
struct FieldsetContext {
    name: Option<String>,
    classes: Vec<String>,
    rows: Vec<FieldRow>,
}

async fn handle_change<S: AuthState + Clone>(
    State(state): State<AdminState<S>>,
    Path((app, model, id)): Path<(String, String, i64)>,
    user: StaffUser,
) -> AdminResult<Html<String>> {
    let site = &state.site;
    let (admin, kind) = site.admin_or_404(&app, &model)?;
    let record = kind.load_one(state.auth.store(), id).await?;
    let fieldsets: Vec<FieldsetContext> = admin
        .fieldsets
        .iter()
        .map(|fs| FieldsetContext {
            name: fs.name.clone(),
            classes: fs.classes.clone(),
            rows: fs
                .fields
                .iter()
                .map(|f| FieldRow {
                    field: f.clone(),
                    label: column_label(admin, f),
                    value: record.value(f),
                })
                .collect(),
        })
        .collect();

    let mut context = site.base_context(&user);
    context.insert("verbose_name", &admin.verbose_name);
    context.insert("verbose_name_plural", &admin.verbose_name_plural);
    context.insert("object", &record.display);
    context.insert("fieldsets", &fieldsets);
    context.insert("changelist_url", &site.changelist_url(admin));
    Ok(Html(site.render("admin/change_form.html", &context)?))
}

fn add_page_admin<'a>(site: &'a AdminSite, app: &str, model: &str) -> TaxiResult<&'a ModelAdmin> {
    let (admin, kind) = site.admin_or_404(app, model)?;
    if kind != AdminModel::Driver || !admin.has_add_page() {
        return Err(TaxiError::NotFound(format!("No add page for '{app}.{model}'")));
    }
    Ok(admin)
}

fn render_add_form(
    site: &AdminSite,
    admin: &ModelAdmin,
    user: &StaffUser,
    form: &DriverCreationForm,
) -> TaxiResult<String> {
    let mut context = site.base_context(user);
    context.insert("verbose_name", &admin.verbose_name);
    context.insert("fieldsets", &admin.add_fieldsets);
    context.insert("form", &form.as_context());
    site.render("admin/add_form.html", &context)
}

async fn handle_add_form<S: AuthState + Clone>(
    State(state): State<AdminState<S>>,
    Path((app, model)): Path<(String, String)>,
    user: StaffUser,
) -> AdminResult<Html<String>> {
    let site = &state.site;
    let admin = add_page_admin(site, &app, &model)?;
    let form = DriverCreationForm::new(state.auth.store().clone());
    Ok(Html(render_add_form(site, admin, &user, &form)?))
}

async fn handle_add<S: AuthState + Clone>(
    State(state): State<AdminState<S>>,
    Path((app, model)): Path<(String, String)>,
    user: StaffUser,
    body: String,
) -> AdminResult<Response> {
    let site = &state.site;
    let admin = add_page_admin(site, &app, &model)?;
    let mut form = DriverCreationForm::new(state.auth.store().clone());
    form.bind(&QueryDict::parse(&body));
    if form.is_valid().await {
        match form.save().await {
            Ok(driver) => {
                tracing::info!(
                    id = driver.id,
                    by = user.0.driver.id,
                    "Driver added through admin"
                );
                let location = format!("{}{}/change/", site.changelist_url(admin), driver.id);
                let location = HeaderValue::from_str(&location)
                    .map_err(|e| TaxiError::InternalServerError(e.to_string()))?;
                return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
            }
            Err(TaxiError::ValidationError(_)) => {}
            Err(other) => return Err(other.into()),
        }
    }
    Ok(Html(render_add_form(site, admin, &user, &form)?).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_db::{NewCar, NewDriver, NewManufacturer};

    #[test]
    fn test_registry() {
        let mut site = AdminSite::taxi().unwrap();
        assert!(site.get_model_admin("taxi.driver").is_some());
        assert!(site.get_model_admin("auth.user").is_none());
        assert!(site.unregister("taxi.car").is_some());
        assert_eq!(site.registered_models(), vec!["taxi.driver", "taxi.manufacturer"]);
    }

    #[test]
    fn test_column_labels() {
        let admin = crate::model_admin::manufacturer_admin();
        assert_eq!(column_label(&admin, "__str__"), "MANUFACTURER");
        assert_eq!(column_label(&admin, "license_number"), "License number");
    }

    async fn fleet() -> TaxiStore {
        let store = TaxiStore::memory_migrated().await.unwrap();
        let toyota = store
            .create_manufacturer(NewManufacturer::new("Toyota", "Japan"))
            .await
            .unwrap();
        let kia = store
            .create_manufacturer(NewManufacturer::new("Kia", "Korea"))
            .await
            .unwrap();
        for (model, maker) in [("Corolla", toyota.id), ("Camry", toyota.id), ("Rio", kia.id)] {
            store.create_car(NewCar::new(model, maker, vec![])).await.unwrap();
        }
        store
            .create_driver(
                NewDriver::new("jsmith", "x")
                    .name("Jane", "Smith")
                    .license_number("JSM12345"),
            )
            .await
            .unwrap();
        store
            .create_driver(NewDriver::new("bob", "x").name("Bob", "Jones"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_driver_changelist_search() {
        let store = fleet().await;
        let site = AdminSite::taxi().unwrap();
        let params = QueryDict::parse("q=smith");
        let cl = site.changelist(&store, "taxi", "driver", &params).await.unwrap();
        assert_eq!(cl.result_count, 1);
        assert_eq!(
            cl.columns,
            vec!["Username", "Email", "First name", "Last name", "Is staff", "License number"]
        );
        assert_eq!(cl.cells()[0], vec!["jsmith", "", "Jane", "Smith", "False", "JSM12345"]);
    }

    #[tokio::test]
    async fn test_car_changelist_filter_and_search() {
        let store = fleet().await;
        let site = AdminSite::taxi().unwrap();
        let all = site
            .changelist(&store, "taxi", "car", &QueryDict::new())
            .await
            .unwrap();
        assert_eq!(all.result_count, 3);
        let toyota = &all.filters[0].choices[1];
        assert_eq!(toyota.label, "Toyota Japan");
        assert!(!toyota.selected);

        let id = toyota.url.rsplit('=').next().unwrap();
        let filtered = site
            .changelist(
                &store,
                "taxi",
                "car",
                &QueryDict::from_pairs([("manufacturer", id)]),
            )
            .await
            .unwrap();
        let models: Vec<_> = filtered.rows.iter().map(|r| r.display.as_str()).collect();
        assert_eq!(models, vec!["Camry", "Corolla"]);
        assert!(filtered.filters[0].choices[1].selected);

        let searched = site
            .changelist(&store, "taxi", "car", &QueryDict::parse("q=RI"))
            .await
            .unwrap();
        assert_eq!(searched.result_count, 1);
    }

    #[tokio::test]
    async fn test_manufacturer_changelist_ignores_search() {
        let store = fleet().await;
        let site = AdminSite::taxi().unwrap();
        let cl = site
            .changelist(&store, "taxi", "manufacturer", &QueryDict::parse("q=zzz"))
            .await
            .unwrap();
        assert_eq!(cl.result_count, 2);
        assert_eq!(cl.columns, vec!["MANUFACTURER"]);
    }

    #[tokio::test]
    async fn test_changelist_pagination() {
        let store = fleet().await;
        let mut site = AdminSite::new().unwrap();
        site.register(crate::model_admin::car_admin().list_per_page(2));
        let page2 = site
            .changelist(&store, "taxi", "car", &QueryDict::parse("p=2"))
            .await
            .unwrap();
        assert_eq!(page2.result_count, 3);
        assert_eq!(page2.rows.len(), 1);
        assert_eq!(page2.rows[0].display, "Rio");
    }

    #[tokio::test]
    async fn test_changelist_page_past_the_end_shows_last_page() {
        let store = fleet().await;
        let mut site = AdminSite::new().unwrap();
        site.register(crate::model_admin::car_admin().list_per_page(2));
        for p in ["p=3", "p=18446744073709551615"] {
            let page = site
                .changelist(&store, "taxi", "car", &QueryDict::parse(p))
                .await
                .unwrap();
            assert_eq!(page.result_count, 3);
            assert_eq!(page.rows.len(), 1, "{p}");
            assert_eq!(page.rows[0].display, "Rio");
        }
    }

    #[tokio::test]
    async fn test_unregistered_model_is_not_found() {
        let store = fleet().await;
        let site = AdminSite::taxi().unwrap();
        let err = site
            .changelist(&store, "auth", "user", &QueryDict::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TaxiError::NotFound(_)));
    }
}
