pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod services;
pub mod startup;

use fleet_core::models::account::DEFAULT_MIN_PASSWORD_LENGTH;
use fleet_core::{
    DriverBoard, FeedbackSubmitter, IdentityProvider, NoticeBoard, ProfileStore, RoleResolver,
    RouteTable, ScoringConfig, SentimentBackend, SessionStore, DEFAULT_NOTICE_TTL,
};
use std::sync::Arc;
use std::time::Duration;

/// Tunables shared by the console's components.
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub scoring: ScoringConfig,
    pub notice_ttl: Duration,
    pub min_password_length: usize,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            notice_ttl: DEFAULT_NOTICE_TTL,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

/// Shared application state: the operator's session and the components
/// behind each screen.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub feedback: Arc<FeedbackSubmitter>,
    pub board: Arc<DriverBoard>,
    pub routes: Arc<RouteTable>,
    pub sign_in_notices: NoticeBoard,
    pub sign_up_notices: NoticeBoard,
    pub min_password_length: usize,
}

impl AppState {
    /// Wires the components. The session store still has to be
    /// initialized before serving.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        backend: Arc<dyn SentimentBackend>,
        options: ConsoleOptions,
    ) -> Self {
        let ttl = options.notice_ttl;
        Self {
            sessions: SessionStore::new(identity, RoleResolver::new(profiles)),
            feedback: Arc::new(FeedbackSubmitter::new(
                backend.clone(),
                NoticeBoard::new("feedback", ttl),
            )),
            board: Arc::new(DriverBoard::new(
                backend,
                options.scoring,
                NoticeBoard::new("dashboard", ttl),
            )),
            routes: Arc::new(RouteTable::console()),
            sign_in_notices: NoticeBoard::new("sign-in", ttl),
            sign_up_notices: NoticeBoard::new("sign-up", ttl),
            min_password_length: options.min_password_length,
        }
    }
}
