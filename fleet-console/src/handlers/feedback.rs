use askama::Template;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Form};
use fleet_core::{EntityType, FeedbackDraft, FeedbackError, Role};

use crate::handlers::NoticeView;
use crate::services::metrics::record_feedback;
use crate::AppState;

pub struct FeedbackFormView {
    pub draft: FeedbackDraft,
    pub entity_types: Vec<EntityType>,
}

impl From<FeedbackDraft> for FeedbackFormView {
    fn from(draft: FeedbackDraft) -> Self {
        Self {
            draft,
            entity_types: EntityType::ALL.to_vec(),
        }
    }
}

#[derive(Template)]
#[template(path = "feedback.html")]
pub struct FeedbackPageTemplate {
    pub user: String,
    pub is_admin: bool,
    pub form: FeedbackFormView,
    pub notice: NoticeView,
}

#[derive(Template)]
#[template(path = "feedback_form.html")]
pub struct FeedbackFormTemplate {
    pub form: FeedbackFormView,
    pub notice: NoticeView,
}

/// Landing view: the feedback form.
pub async fn feedback_page(State(state): State<AppState>) -> impl IntoResponse {
    let auth = state.sessions.state();
    FeedbackPageTemplate {
        user: auth
            .session()
            .map(|s| s.display_name().to_string())
            .unwrap_or_default(),
        is_admin: auth.role() == Some(Role::Admin),
        form: FeedbackDraft::default().into(),
        notice: state.feedback.notices().current().into(),
    }
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    Form(mut draft): Form<FeedbackDraft>,
) -> impl IntoResponse {
    let status = match state.feedback.submit(&mut draft).await {
        Ok(_) => {
            record_feedback("success");
            StatusCode::OK
        }
        Err(e) => {
            record_feedback(e.outcome());
            match e {
                FeedbackError::Validation(_) | FeedbackError::Rejected(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                FeedbackError::InFlight => StatusCode::CONFLICT,
                FeedbackError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            }
        }
    };

    (
        status,
        FeedbackFormTemplate {
            form: draft.into(),
            notice: state.feedback.notices().current().into(),
        },
    )
}
