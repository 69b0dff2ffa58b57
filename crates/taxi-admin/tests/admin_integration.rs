//! Integration tests for the admin router.

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use taxi_admin::AdminSite;
use taxi_auth::extractors::start_session;
use taxi_auth::{AuthState, InMemorySessionBackend, SessionBackend, SessionData};
use taxi_core::Settings;
use taxi_db::{NewCar, NewDriver, NewManufacturer, TaxiStore};
use tower::ServiceExt;

struct TestState {
    store: TaxiStore,
    sessions: InMemorySessionBackend,
    settings: Settings,
}

impl AuthState for TestState {
    fn store(&self) -> &TaxiStore {
        &self.store
    }
    fn sessions(&self) -> &dyn SessionBackend {
        &self.sessions
    }
    fn settings(&self) -> &Settings {
        &self.settings
    }
}

struct Harness {
    router: Router,
    state: Arc<TestState>,
}

impl Harness {
    async fn new() -> Self {
        let store = TaxiStore::memory_migrated().await.unwrap();
        let state = Arc::new(TestState {
            store,
            sessions: InMemorySessionBackend::new(),
            settings: Settings::for_testing(),
        });
        let router = AdminSite::taxi().unwrap().into_router(Arc::clone(&state));
        Self { router, state }
    }

    async fn cookie_for(&self, driver: NewDriver) -> String {
        let driver = self.state.store.create_driver(driver).await.unwrap();
        let (_, cookie) = start_session(&self.state, SessionData::new(3600), &driver)
            .await
            .unwrap();
        format!("{}={}", cookie.name, cookie.value)
    }

    async fn staff_cookie(&self) -> String {
        self.cookie_for(NewDriver::new("admin", "x").superuser()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, http::HeaderMap, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, http::HeaderMap, String) {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }
}

#[tokio::test]
async fn test_anonymous_redirected_to_login() {
    let h = Harness::new().await;
    let (status, headers, _) = h.get("/admin/", None).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/accounts/login/?next=/admin/");
}

#[tokio::test]
async fn test_non_staff_forbidden() {
    let h = Harness::new().await;
    let cookie = h.cookie_for(NewDriver::new("driver", "x")).await;
    let (status, _, _) = h.get("/admin/taxi/car/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_index_lists_models() {
    let h = Harness::new().await;
    let cookie = h.staff_cookie().await;
    let (status, _, body) = h.get("/admin/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Site administration"));
    assert!(body.contains("/admin/taxi/driver/add/"));
    assert!(body.contains("/admin/taxi/manufacturer/"));
    assert!(!body.contains("/admin/taxi/car/add/"));
}

#[tokio::test]
async fn test_driver_changelist_shows_license_column_and_searches() {
    let h = Harness::new().await;
    let cookie = h.staff_cookie().await;
    h.state
        .store
        .create_driver(NewDriver::new("jsmith", "x").license_number("JSM12345"))
        .await
        .unwrap();

    let (status, _, body) = h.get("/admin/taxi/driver/?q=jsm", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("License number"));
    assert!(body.contains("JSM12345"));
    assert!(body.contains("1 driver"));
}

#[tokio::test]
async fn test_change_page_renders_fieldsets() {
    let h = Harness::new().await;
    let cookie = h.staff_cookie().await;
    let toyota = h
        .state
        .store
        .create_manufacturer(NewManufacturer::new("Toyota", "Japan"))
        .await
        .unwrap();
    let driver = h
        .state
        .store
        .create_driver(NewDriver::new("jsmith", "x").license_number("JSM12345"))
        .await
        .unwrap();
    let car = h
        .state
        .store
        .create_car(NewCar::new("Corolla", toyota.id, vec![driver.id]))
        .await
        .unwrap();

    let uri = format!("/admin/taxi/driver/{}/change/", driver.id);
    let (status, _, body) = h.get(&uri, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Additional info"));
    assert!(body.contains("Important dates"));
    assert!(body.contains("JSM12345"));

    let uri = format!("/admin/taxi/car/{}/change/", car.id);
    let (_, _, body) = h.get(&uri, Some(&cookie)).await;
    assert!(body.contains("Toyota Japan"));

    let (status, _, _) = h.get("/admin/taxi/car/999/change/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_driver_through_admin() {
    let h = Harness::new().await;
    let cookie = h.staff_cookie().await;

    let (status, _, body) = h.get("/admin/taxi/driver/add/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"password2\""));
    assert!(body.contains("name=\"license_number\""));

    let form = "username=newdriver&password1=Str0ng-pass!&password2=Str0ng-pass!\
                &first_name=New&last_name=Driver&license_number=NEW12345";
    let request = Request::post("/admin/taxi/driver/add/")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let (status, headers, _) = h.send(request).await;
    assert_eq!(status, StatusCode::FOUND);
    let created = h
        .state
        .store
        .get_driver_by_username("newdriver")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        headers[header::LOCATION],
        format!("/admin/taxi/driver/{}/change/", created.id).as_str()
    );
    assert_eq!(created.license_number.as_deref(), Some("NEW12345"));
}

#[tokio::test]
async fn test_add_driver_invalid_rerenders() {
    let h = Harness::new().await;
    let cookie = h.staff_cookie().await;
    let request = Request::post("/admin/taxi/driver/add/")
        .header(header::COOKIE, &cookie)
        .body(Body::from(
            "username=x&password1=Str0ng-pass!&password2=Str0ng-pass!&license_number=bad",
        ))
        .unwrap();
    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("License number must consist of exactly 8 characters."));
    assert!(h.state.store.get_driver_by_username("x").await.unwrap().is_none());

    let (status, _, _) = h.get("/admin/taxi/car/add/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
