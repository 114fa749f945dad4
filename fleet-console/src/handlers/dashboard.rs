use askama::Template;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use fleet_core::{DashboardView, DriverRow, LoadState};
use serde::Deserialize;

use crate::handlers::NoticeView;
use crate::services::metrics::record_refresh;
use crate::AppState;

#[derive(Deserialize, Default)]
pub struct DashboardQuery {
    #[serde(default)]
    pub q: String,
}

fn when(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One driver as shown in the chart and the table.
pub struct DriverLine {
    pub driver_id: String,
    pub score: String,
    pub total_count: u64,
    pub last_updated: String,
    pub last_alert_at: String,
    pub class: &'static str,
    pub alerting: bool,
    pub bar_pct: String,
}

impl From<&DriverRow> for DriverLine {
    fn from(row: &DriverRow) -> Self {
        Self {
            driver_id: row.driver_id.clone(),
            score: format!("{:.3}", row.score),
            total_count: row.total_count,
            last_updated: when(row.last_updated),
            last_alert_at: when(row.last_alert_at),
            class: row.assessment.class.label(),
            alerting: row.assessment.alerting,
            bar_pct: format!("{:.1}", row.bar * 100.0),
        }
    }
}

pub struct DriversPanel {
    pub query: String,
    pub status: &'static str,
    pub error: String,
    pub driver_count: usize,
    pub at_risk_count: usize,
    pub average: String,
    pub total_feedback: u64,
    pub alert_threshold: String,
    pub fetched_at: String,
    pub chart: Vec<DriverLine>,
    pub rows: Vec<DriverLine>,
}

impl DriversPanel {
    fn new(view: DashboardView) -> Self {
        let (status, error) = match &view.load {
            LoadState::Idle => ("idle", String::new()),
            LoadState::Pending => ("pending", String::new()),
            LoadState::Ready => ("ready", String::new()),
            LoadState::Failed(message) => ("failed", message.clone()),
        };
        Self {
            query: view.query.clone(),
            status,
            error,
            driver_count: view.summary.driver_count,
            at_risk_count: view.summary.at_risk_count,
            average: view.summary.average_display(),
            total_feedback: view.summary.total_feedback,
            alert_threshold: format!("{}", view.alert_threshold),
            fetched_at: when(view.fetched_at),
            chart: view.chart.iter().map(DriverLine::from).collect(),
            rows: view.rows.iter().map(DriverLine::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: String,
    pub is_admin: bool,
    pub panel: DriversPanel,
    pub notice: NoticeView,
}

#[derive(Template)]
#[template(path = "drivers.html")]
pub struct DriversTemplate {
    pub panel: DriversPanel,
    pub notice: NoticeView,
}

impl DriversTemplate {
    fn from_board(state: &AppState, query: &str) -> Self {
        Self {
            panel: DriversPanel::new(state.board.view(query)),
            notice: state.board.notices().current().into(),
        }
    }
}

/// Admin dashboard. Fetches the feed the first time it is opened.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    state.board.ensure_loaded().await;
    let user = state
        .sessions
        .state()
        .session()
        .map(|s| s.display_name().to_string())
        .unwrap_or_default();
    let DriversTemplate { panel, notice } = DriversTemplate::from_board(&state, &query.q);
    DashboardTemplate {
        user,
        is_admin: true,
        panel,
        notice,
    }
}

/// Explicit re-fetch of the driver feed.
pub async fn refresh_drivers(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    match state.board.refresh().await {
        Ok(count) => {
            record_refresh("success");
            tracing::debug!(drivers = count, "Dashboard refreshed");
        }
        Err(_) => record_refresh("failure"),
    }
    DriversTemplate::from_board(&state, &query.q)
}

/// Re-filters the current snapshot without fetching.
pub async fn drivers_fragment(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    DriversTemplate::from_board(&state, &query.q)
}

pub async fn dashboard_summary(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Json<DashboardView> {
    Json(state.board.view(&query.q))
}
