use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::error::ConsoleError;
use crate::handlers::{
    app::{fallback, health_check, session_info},
    auth::{login_handler, login_page, logout_handler, signup_handler, signup_page},
    dashboard::{dashboard_page, dashboard_summary, drivers_fragment, refresh_drivers},
    feedback::{feedback_page, submit_feedback},
    metrics::metrics,
};
use crate::middleware::{
    auth::route_guard, metrics::metrics_middleware, request_id::request_id_middleware,
};
use crate::services::{BackendClient, GoTrueClient, ProfileClient};
use crate::{AppState, ConsoleOptions};

/// Builds the state over the HTTP collaborators named in `settings`.
pub fn build_state(settings: &Settings) -> Result<AppState, ConsoleError> {
    settings.scoring.validate()?;

    let identity = Arc::new(GoTrueClient::new(settings.identity.clone()));
    let profiles = Arc::new(ProfileClient::new(
        settings.identity.clone(),
        identity.clone(),
    ));
    let backend = Arc::new(BackendClient::new(settings.backend.clone()));

    let options = ConsoleOptions {
        scoring: settings.scoring.clone(),
        notice_ttl: settings.notices.ttl(),
        min_password_length: settings.identity.min_password_length,
    };
    Ok(AppState::new(identity, profiles, backend, options))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(feedback_page))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/signup", get(signup_page).post(signup_handler))
        .route("/logout", post(logout_handler))
        .route("/session", get(session_info))
        .route("/feedback", get(feedback_page).post(submit_feedback))
        .route("/dashboard", get(dashboard_page))
        .route("/dashboard/drivers", get(drivers_fragment))
        .route("/dashboard/refresh", post(refresh_drivers))
        .route("/dashboard/summary", get(dashboard_summary))
        .fallback(fallback)
        // Router-wide so unmatched paths are guarded too
        .layer(from_fn_with_state(state.clone(), route_guard))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
