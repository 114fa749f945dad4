#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use fleet_console::startup::build_router;
use fleet_console::{AppState, ConsoleOptions};
use fleet_core::providers::{MockIdentityProvider, MockProfileStore, MockSentimentBackend};
use fleet_core::Session;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@fleet.test";
pub const EMPLOYEE_EMAIL: &str = "staff@fleet.test";
pub const PASSWORD: &str = "hunter22";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub identity: Arc<MockIdentityProvider>,
    pub profiles: Arc<MockProfileStore>,
    pub backend: Arc<MockSentimentBackend>,
}

impl TestApp {
    /// Console over mocks, session store not yet initialized (Loading).
    pub fn build(identity: MockIdentityProvider) -> Self {
        let identity = Arc::new(
            identity
                .with_account(ADMIN_EMAIL, PASSWORD, "u-admin")
                .with_account(EMPLOYEE_EMAIL, PASSWORD, "u-staff"),
        );
        let profiles = Arc::new(
            MockProfileStore::new()
                .with_role("u-admin", "admin")
                .with_role("u-staff", "employee"),
        );
        let backend = Arc::new(MockSentimentBackend::new());
        let state = AppState::new(
            identity.clone(),
            profiles.clone(),
            backend.clone(),
            ConsoleOptions::default(),
        );
        let router = build_router(state.clone());
        Self {
            state,
            router,
            identity,
            profiles,
            backend,
        }
    }

    /// Anonymous operator.
    pub async fn spawn() -> Self {
        let app = Self::build(MockIdentityProvider::new());
        app.state.sessions.initialize().await;
        app
    }

    /// Operator with a restored session and a resolved role.
    pub async fn signed_in(user_id: &str, email: &str) -> Self {
        let app = Self::build(MockIdentityProvider::new().with_session(Session::new(user_id, email)));
        app.state.sessions.initialize().await;
        app.state
            .sessions
            .wait_for_role(Duration::from_secs(2))
            .await
            .expect("role should resolve");
        app
    }

    pub async fn admin() -> Self {
        Self::signed_in("u-admin", ADMIN_EMAIL).await
    }

    pub async fn employee() -> Self {
        Self::signed_in("u-staff", EMPLOYEE_EMAIL).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn htmx_post_form(&self, uri: &str, body: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header("HX-Request", "true")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
