pub mod app;
pub mod auth;
pub mod dashboard;
pub mod feedback;
pub mod metrics;

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use fleet_core::{Navigation, Notice};

/// Sends the browser to `target`. HTMX requests get an `HX-Redirect`
/// header so the whole page navigates instead of swapping a fragment.
pub fn navigate(request_headers: &HeaderMap, target: Navigation) -> Response {
    if request_headers.contains_key("HX-Request") {
        let mut headers = HeaderMap::new();
        headers.insert("HX-Redirect", HeaderValue::from_static(target.path()));
        return (StatusCode::OK, headers).into_response();
    }
    Redirect::to(target.path()).into_response()
}

/// Notice as rendered by the templates.
pub struct NoticeView {
    pub visible: bool,
    pub level: &'static str,
    pub message: String,
}

impl From<Option<Notice>> for NoticeView {
    fn from(notice: Option<Notice>) -> Self {
        match notice {
            Some(notice) => Self {
                visible: true,
                level: notice.level.as_str(),
                message: notice.message,
            },
            None => Self {
                visible: false,
                level: "",
                message: String::new(),
            },
        }
    }
}
