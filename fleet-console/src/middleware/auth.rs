use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use fleet_core::GuardDecision;

use crate::handlers::{app::WaitingTemplate, navigate};
use crate::AppState;

/// Applies the route table to every request, including unmatched paths.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let auth = state.sessions.state();

    match state.routes.decide(&path, &auth) {
        GuardDecision::Render => next.run(request).await,
        GuardDecision::Redirect(target) => {
            tracing::debug!(path = %path, state = auth.label(), to = target.path(), "Guard redirect");
            navigate(request.headers(), target)
        }
        GuardDecision::Wait => {
            tracing::debug!(path = %path, state = auth.label(), "Guard waiting on session");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(RETRY_AFTER, "1")],
                WaitingTemplate { path },
            )
                .into_response()
        }
    }
}
