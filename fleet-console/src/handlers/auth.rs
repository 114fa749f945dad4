use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use fleet_core::{Navigation, SignUpForm};
use serde::Deserialize;
use std::time::Duration;

use crate::handlers::{navigate, NoticeView};
use crate::services::metrics::record_sign_in;
use crate::AppState;

/// How long a successful sign-in waits for the role before redirecting.
/// Past this the guard shows its waiting page instead.
const ROLE_WAIT: Duration = Duration::from_secs(5);

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub notice: NoticeView,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub notice: NoticeView,
    pub min_password_length: usize,
}

#[derive(Template)]
#[template(path = "signup_done.html")]
pub struct SignupDoneTemplate {}

#[derive(Template)]
#[template(path = "notice.html")]
pub struct NoticeTemplate {
    pub notice: NoticeView,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_page(State(state): State<AppState>) -> impl IntoResponse {
    LoginTemplate {
        notice: state.sign_in_notices.current().into(),
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(payload): Form<LoginRequest>,
) -> Response {
    match state.sessions.sign_in(&payload.email, &payload.password).await {
        Ok(()) => {
            record_sign_in("success");
            let role = state.sessions.wait_for_role(ROLE_WAIT).await;
            tracing::info!(role = ?role, "Operator signed in");
            navigate(&headers, Navigation::Landing)
        }
        Err(e) => {
            record_sign_in(e.outcome());
            let notice = state.sign_in_notices.error(e.user_message());
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                NoticeTemplate {
                    notice: Some(notice).into(),
                },
            )
                .into_response()
        }
    }
}

pub async fn signup_page(State(state): State<AppState>) -> impl IntoResponse {
    SignupTemplate {
        notice: state.sign_up_notices.current().into(),
        min_password_length: state.min_password_length,
    }
}

pub async fn signup_handler(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> Response {
    match state.sessions.sign_up(&form, state.min_password_length).await {
        Ok(()) => {
            tracing::info!("Sign-up accepted");
            SignupDoneTemplate {}.into_response()
        }
        Err(e) => {
            tracing::debug!(outcome = e.outcome(), "Sign-up refused");
            let notice = state.sign_up_notices.error(e.user_message());
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                NoticeTemplate {
                    notice: Some(notice).into(),
                },
            )
                .into_response()
        }
    }
}

pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let target = state.sessions.sign_out().await;
    navigate(&headers, target)
}
