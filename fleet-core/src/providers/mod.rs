//! Contracts for the systems the console talks to but does not own.

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{AuthError, BackendError, ProviderError};
use crate::models::{
    DriverStat, FeedbackAck, FeedbackSubmission, Session, SessionEvent, SignUpForm,
};

#[cfg(any(test, feature = "test-support"))]
pub use mock::{MockIdentityProvider, MockProfileStore, MockSentimentBackend};

/// Password authentication and session lifecycle.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    async fn sign_up(&self, form: &SignUpForm) -> Result<(), AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;
    fn subscribe(&self) -> SessionSubscription;
}

/// Raw profile row; the role string is parsed by the role resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub role: Option<String>,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_role(&self, user_id: &str) -> Result<ProfileRecord, ProviderError>;
}

/// Driver score feed and feedback intake.
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    async fn list_drivers(&self) -> Result<Vec<DriverStat>, BackendError>;
    async fn submit_feedback(
        &self,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackAck, BackendError>;
}

/// Ordered stream of session events from an identity provider.
///
/// Dropping the subscription unsubscribes; `unsubscribe` makes the teardown
/// explicit at call sites.
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    pub fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Next event in arrival order, or `None` once the provider is gone.
    ///
    /// If the reader fell behind, the skipped events are dropped: every event
    /// carries the full current session, so the newest one is sufficient.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session subscriber lagged; skipping stale events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        tracing::debug!("Session subscription closed");
    }
}
