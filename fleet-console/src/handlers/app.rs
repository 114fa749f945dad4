use askama::Template;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use fleet_core::{Navigation, Role};
use serde::Serialize;

use crate::handlers::navigate;
use crate::AppState;

#[derive(Template)]
#[template(path = "waiting.html")]
pub struct WaitingTemplate {
    pub path: String,
}

pub async fn health_check() -> &'static str {
    "OK"
}

#[derive(Serialize)]
pub struct SessionInfo {
    pub state: &'static str,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// The operator's current session, as the guard sees it.
pub async fn session_info(State(state): State<AppState>) -> impl IntoResponse {
    let auth = state.sessions.state();
    let session = auth.session();
    Json(SessionInfo {
        state: auth.label(),
        user_id: session.map(|s| s.user_id.clone()),
        email: session.map(|s| s.email.clone()),
        role: auth.role(),
    })
}

/// The guard already redirects unmatched paths; this only covers requests
/// it lets through.
pub async fn fallback(headers: HeaderMap) -> Response {
    navigate(&headers, Navigation::Landing)
}
