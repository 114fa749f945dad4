//! Admin dashboard read path: the latest driver snapshot, its fetch
//! lifecycle, and the view derived from it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

use crate::aggregator::{DriverAggregator, FleetSummary};
use crate::error::BackendError;
use crate::models::DriverStat;
use crate::notice::NoticeBoard;
use crate::providers::SentimentBackend;
use crate::scoring::{RiskAssessment, ScoringConfig};
use crate::search;

pub const CONNECTIVITY_MESSAGE: &str =
    "Could not connect to the server. Make sure the backend is running.";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Idle,
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverRow {
    pub driver_id: String,
    pub score: f64,
    pub total_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_alert_at: Option<DateTime<Utc>>,
    pub assessment: RiskAssessment,
    /// Score position within the configured scale, 0.0..=1.0.
    pub bar: f64,
}

impl DriverRow {
    fn from_stat(stat: &DriverStat, scoring: &ScoringConfig) -> Self {
        Self {
            driver_id: stat.driver_id.clone(),
            score: stat.score,
            total_count: stat.total_count,
            last_updated: stat.last_updated,
            last_alert_at: stat.last_alert_at,
            assessment: scoring.assess(stat.score),
            bar: scoring.normalize(stat.score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub load: LoadState,
    pub query: String,
    /// Over the whole fleet, regardless of `query`.
    pub summary: FleetSummary,
    pub chart: Vec<DriverRow>,
    pub rows: Vec<DriverRow>,
    pub alert_threshold: f64,
    pub fetched_at: Option<DateTime<Utc>>,
}

struct Snapshot {
    drivers: Arc<[DriverStat]>,
    fetched_at: Option<DateTime<Utc>>,
}

pub struct DriverBoard {
    backend: Arc<dyn SentimentBackend>,
    scoring: ScoringConfig,
    snapshot: RwLock<Snapshot>,
    load: watch::Sender<LoadState>,
    generation: AtomicU64,
    notices: NoticeBoard,
}

impl DriverBoard {
    pub fn new(
        backend: Arc<dyn SentimentBackend>,
        scoring: ScoringConfig,
        notices: NoticeBoard,
    ) -> Self {
        let (load, _) = watch::channel(LoadState::Idle);
        Self {
            backend,
            scoring,
            snapshot: RwLock::new(Snapshot {
                drivers: Arc::from(Vec::new()),
                fetched_at: None,
            }),
            load,
            generation: AtomicU64::new(0),
            notices,
        }
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn load_state(&self) -> LoadState {
        self.load.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<LoadState> {
        self.load.subscribe()
    }

    pub fn snapshot(&self) -> Arc<[DriverStat]> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .drivers
            .clone()
    }

    /// Fetches the feed once. A failed fetch keeps the previous snapshot.
    /// If a newer refresh started meanwhile, this result is dropped.
    pub async fn refresh(&self) -> Result<usize, BackendError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.load.send_replace(LoadState::Pending);

        let result = self.backend.list_drivers().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Discarding superseded driver fetch");
            return result.map(|drivers| drivers.len());
        }

        match result {
            Ok(drivers) => {
                let count = drivers.len();
                {
                    let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
                    snapshot.drivers = Arc::from(drivers);
                    snapshot.fetched_at = Some(Utc::now());
                }
                self.load.send_replace(LoadState::Ready);
                tracing::info!(drivers = count, "Driver feed refreshed");
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "Driver feed refresh failed");
                self.load
                    .send_replace(LoadState::Failed(CONNECTIVITY_MESSAGE.to_string()));
                self.notices.error(CONNECTIVITY_MESSAGE);
                Err(e)
            }
        }
    }

    /// Fetches on first use only.
    pub async fn ensure_loaded(&self) {
        if self.load_state() == LoadState::Idle {
            let _ = self.refresh().await;
        }
    }

    pub fn view(&self, query: &str) -> DashboardView {
        let (drivers, fetched_at) = {
            let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            (snapshot.drivers.clone(), snapshot.fetched_at)
        };
        let aggregator = DriverAggregator::new(&drivers, &self.scoring);
        let to_row = |stat: &DriverStat| DriverRow::from_stat(stat, &self.scoring);

        DashboardView {
            load: self.load_state(),
            query: query.to_string(),
            summary: aggregator.summary(),
            chart: aggregator
                .worst_n(self.scoring.chart_size)
                .into_iter()
                .map(to_row)
                .collect(),
            rows: search::filter(&drivers, query)
                .into_iter()
                .map(to_row)
                .collect(),
            alert_threshold: self.scoring.alert_threshold,
            fetched_at,
        }
    }
}
