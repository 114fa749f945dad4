#![allow(dead_code)]

use fleet_core::providers::{MockIdentityProvider, MockProfileStore, MockSentimentBackend};
use fleet_core::{
    AuthState, DriverBoard, FeedbackSubmitter, NoticeBoard, RoleResolver, ScoringConfig,
    SessionStore, DEFAULT_NOTICE_TTL,
};
use std::sync::Arc;
use std::time::Duration;

pub const ADMIN_EMAIL: &str = "admin@fleet.test";
pub const EMPLOYEE_EMAIL: &str = "staff@fleet.test";
pub const PASSWORD: &str = "hunter22";

pub struct TestConsole {
    pub identity: Arc<MockIdentityProvider>,
    pub profiles: Arc<MockProfileStore>,
    pub backend: Arc<MockSentimentBackend>,
    pub sessions: Arc<SessionStore>,
    pub feedback: FeedbackSubmitter,
    pub board: DriverBoard,
}

impl TestConsole {
    pub fn new() -> Self {
        Self::with(MockIdentityProvider::new())
    }

    /// Console over `identity`, with an admin (`u-admin`) and an employee
    /// (`u-staff`) account.
    pub fn with(identity: MockIdentityProvider) -> Self {
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
        Self::assemble(identity, profiles)
    }

    pub fn assemble(identity: Arc<MockIdentityProvider>, profiles: Arc<MockProfileStore>) -> Self {
        let backend = Arc::new(MockSentimentBackend::new());
        let sessions = SessionStore::new(identity.clone(), RoleResolver::new(profiles.clone()));
        let feedback = FeedbackSubmitter::new(
            backend.clone(),
            NoticeBoard::new("feedback", DEFAULT_NOTICE_TTL),
        );
        let board = DriverBoard::new(
            backend.clone(),
            ScoringConfig::default(),
            NoticeBoard::new("dashboard", DEFAULT_NOTICE_TTL),
        );
        Self {
            identity,
            profiles,
            backend,
            sessions,
            feedback,
            board,
        }
    }
}

/// Waits until the session state satisfies `predicate`, panicking after 2s.
pub async fn wait_for_state<F>(sessions: &SessionStore, predicate: F) -> AuthState
where
    F: Fn(&AuthState) -> bool,
{
    let mut receiver = sessions.watch();
    let outcome = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let state = receiver.borrow_and_update().clone();
            if predicate(&state) {
                return state;
            }
            receiver
                .changed()
                .await
                .expect("session store dropped while waiting");
        }
    })
    .await;
    outcome.unwrap_or_else(|_| panic!("timed out; last state was {:?}", sessions.state()))
}

/// Lets spawned tasks (listener, role lookups) run to their next await.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
