//! In-memory collaborators for tests and local runs without a backend.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, Notify};

use super::{
    IdentityProvider, ProfileRecord, ProfileStore, SentimentBackend, SessionSubscription,
};
use crate::error::{AuthError, BackendError, ProviderError};
use crate::models::{
    DriverStat, FeedbackAck, FeedbackSubmission, Session, SessionEvent, SignUpForm,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct MockAccount {
    user_id: String,
    password: String,
}

/// Identity provider backed by a map of accounts.
pub struct MockIdentityProvider {
    accounts: Mutex<HashMap<String, MockAccount>>,
    current: Mutex<Option<Session>>,
    scripted_failures: Mutex<VecDeque<AuthError>>,
    events: broadcast::Sender<SessionEvent>,
    sign_in_count: AtomicU64,
    sign_out_count: AtomicU64,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            scripted_failures: Mutex::new(VecDeque::new()),
            events,
            sign_in_count: AtomicU64::new(0),
            sign_out_count: AtomicU64::new(0),
        }
    }

    pub fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        lock(&self.accounts).insert(
            email.to_lowercase(),
            MockAccount {
                user_id: user_id.to_string(),
                password: password.to_string(),
            },
        );
        self
    }

    /// Session restored on `get_session`, as if left over from a prior run.
    pub fn with_session(self, session: Session) -> Self {
        *lock(&self.current) = Some(session);
        self
    }

    /// The next sign-in / sign-up / sign-out call fails with `err`.
    pub fn fail_next(&self, err: AuthError) {
        lock(&self.scripted_failures).push_back(err);
    }

    /// Pushes a session change as if it happened elsewhere (another tab,
    /// token expiry).
    pub fn emit(&self, event: SessionEvent) {
        *lock(&self.current) = event.session.clone();
        let _ = self.events.send(event);
    }

    pub fn sign_in_count(&self) -> u64 {
        self.sign_in_count.load(Ordering::SeqCst)
    }

    pub fn sign_out_count(&self) -> u64 {
        self.sign_out_count.load(Ordering::SeqCst)
    }

    fn scripted_failure(&self) -> Option<AuthError> {
        lock(&self.scripted_failures).pop_front()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.sign_in_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.scripted_failure() {
            return Err(err);
        }

        let user_id = {
            let accounts = lock(&self.accounts);
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => account.user_id.clone(),
                _ => {
                    return Err(AuthError::InvalidCredentials(
                        "Invalid login credentials".to_string(),
                    ))
                }
            }
        };

        let session = Session::new(user_id, email);
        tracing::info!(user_id = %session.user_id, "[MOCK] Signed in");
        self.emit(SessionEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, form: &SignUpForm) -> Result<(), AuthError> {
        if let Some(err) = self.scripted_failure() {
            return Err(err);
        }
        let mut accounts = lock(&self.accounts);
        let key = form.email.trim().to_lowercase();
        if accounts.contains_key(&key) {
            return Err(AuthError::DuplicateAccount);
        }
        let user_id = format!("user-{}", accounts.len() + 1);
        accounts.insert(
            key,
            MockAccount {
                user_id,
                password: form.password.clone(),
            },
        );
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_count.fetch_add(1, Ordering::SeqCst);
        let failure = self.scripted_failure();
        self.emit(SessionEvent::signed_out());
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(lock(&self.current).clone())
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.events.subscribe())
    }
}

#[derive(Clone)]
enum ProfileBehavior {
    Row(Option<String>),
    Fails,
}

/// Profile store backed by a map; unknown users have no row.
#[derive(Default)]
pub struct MockProfileStore {
    profiles: Mutex<HashMap<String, ProfileBehavior>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    lookups: AtomicU64,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(self, user_id: &str, role: &str) -> Self {
        lock(&self.profiles).insert(
            user_id.to_string(),
            ProfileBehavior::Row(Some(role.to_string())),
        );
        self
    }

    /// A row exists but its role column is null.
    pub fn with_empty_row(self, user_id: &str) -> Self {
        lock(&self.profiles).insert(user_id.to_string(), ProfileBehavior::Row(None));
        self
    }

    pub fn failing_for(self, user_id: &str) -> Self {
        lock(&self.profiles).insert(user_id.to_string(), ProfileBehavior::Fails);
        self
    }

    /// Lookups for `user_id` block until the returned handle is notified.
    pub fn hold(&self, user_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.holds).insert(user_id.to_string(), gate.clone());
        gate
    }

    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn get_role(&self, user_id: &str) -> Result<ProfileRecord, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.holds).get(user_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let behavior = lock(&self.profiles).get(user_id).cloned();
        match behavior {
            Some(ProfileBehavior::Row(role)) => Ok(ProfileRecord { role }),
            Some(ProfileBehavior::Fails) => Err(ProviderError::Connection(
                "mock profile store unavailable".to_string(),
            )),
            None => Err(ProviderError::NotFound),
        }
    }
}

/// Sentiment backend with a fixed driver feed and scripted submit results.
#[derive(Default)]
pub struct MockSentimentBackend {
    drivers: Mutex<Option<Vec<DriverStat>>>,
    list_failures: Mutex<VecDeque<BackendError>>,
    submit_results: Mutex<VecDeque<Result<FeedbackAck, BackendError>>>,
    submissions: Mutex<Vec<FeedbackSubmission>>,
    submit_hold: Mutex<Option<Arc<Notify>>>,
    list_calls: AtomicU64,
}

impl MockSentimentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drivers(self, drivers: Vec<DriverStat>) -> Self {
        *lock(&self.drivers) = Some(drivers);
        self
    }

    pub fn set_drivers(&self, drivers: Vec<DriverStat>) {
        *lock(&self.drivers) = Some(drivers);
    }

    pub fn fail_next_list(&self, err: BackendError) {
        lock(&self.list_failures).push_back(err);
    }

    /// Result of the next submission. Without a scripted result the
    /// submission is accepted.
    pub fn respond_next(&self, result: Result<FeedbackAck, BackendError>) {
        lock(&self.submit_results).push_back(result);
    }

    /// Submissions block until the returned handle is notified.
    pub fn hold_submissions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.submit_hold) = Some(gate.clone());
        gate
    }

    pub fn submissions(&self) -> Vec<FeedbackSubmission> {
        lock(&self.submissions).clone()
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentBackend for MockSentimentBackend {
    async fn list_drivers(&self) -> Result<Vec<DriverStat>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.list_failures).pop_front() {
            return Err(err);
        }
        Ok(lock(&self.drivers).clone().unwrap_or_default())
    }

    async fn submit_feedback(
        &self,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackAck, BackendError> {
        lock(&self.submissions).push(submission.clone());
        let gate = lock(&self.submit_hold).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        lock(&self.submit_results)
            .pop_front()
            .unwrap_or_else(|| Ok(FeedbackAck::accepted()))
    }
}
