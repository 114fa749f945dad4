//! Single owner of [`AuthState`].
//!
//! Every state change goes through [`SessionStore::apply`], which is driven by
//! the identity provider's session events (plus the initial session lookup
//! and local sign-out). Role lookups run as tasks tagged with the epoch of the
//! event that started them; a result whose epoch is no longer current is
//! dropped instead of applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::role::RoleResolver;
use crate::error::AuthError;
use crate::guard::Navigation;
use crate::models::{AuthState, Role, Session, SessionEvent, SignUpForm};
use crate::providers::{IdentityProvider, SessionSubscription};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SessionStore {
    identity: Arc<dyn IdentityProvider>,
    resolver: RoleResolver,
    state: watch::Sender<AuthState>,
    epoch: AtomicU64,
    /// Role lookup for the current epoch, if one is running. Also serializes
    /// `apply` so epochs and spawned lookups stay in the same order.
    resolution: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(identity: Arc<dyn IdentityProvider>, resolver: RoleResolver) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::Loading);
        Arc::new(Self {
            identity,
            resolver,
            state,
            epoch: AtomicU64::new(0),
            resolution: Mutex::new(None),
            listener: Mutex::new(None),
        })
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Read-only view for guards and screens.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Looks up any existing session, then follows the provider's session
    /// events until [`shutdown`](Self::shutdown).
    pub async fn initialize(self: &Arc<Self>) {
        self.state.send_replace(AuthState::Loading);
        let subscription = self.identity.subscribe();

        let restored = match self.identity.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed; starting anonymous");
                None
            }
        };
        tracing::info!(restored = restored.is_some(), "Session store initialized");
        self.apply(SessionEvent::initial(restored));

        let handle = tokio::spawn(Self::listen(Arc::downgrade(self), subscription));
        if let Some(previous) = lock(&self.listener).replace(handle) {
            previous.abort();
        }
    }

    async fn listen(store: Weak<Self>, mut subscription: SessionSubscription) {
        while let Some(event) = subscription.next().await {
            let Some(store) = store.upgrade() else {
                break;
            };
            tracing::debug!(kind = ?event.kind, "Session event");
            store.apply(event);
        }
        subscription.unsubscribe();
    }

    /// Re-derives the auth state from one session event.
    pub fn apply(self: &Arc<Self>, event: SessionEvent) {
        let mut slot = lock(&self.resolution);
        if let Some(stale) = slot.take() {
            stale.abort();
        }

        let mut epoch = 0;
        self.state.send_modify(|state| {
            epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            *state = match &event.session {
                Some(session) => AuthState::Authenticated {
                    session: session.clone(),
                    role: None,
                },
                None => AuthState::Anonymous,
            };
        });

        if let Some(session) = event.session {
            let store = Arc::downgrade(self);
            let resolver = self.resolver.clone();
            *slot = Some(tokio::spawn(async move {
                let role = resolver.resolve(&session.user_id).await;
                if let Some(store) = store.upgrade() {
                    store.commit_role(epoch, &session, role);
                }
            }));
        }
    }

    /// Applies a resolved role if `epoch` is still the latest event.
    fn commit_role(&self, epoch: u64, session: &Session, role: Role) -> bool {
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                tracing::debug!(
                    user_id = %session.user_id,
                    epoch,
                    "Discarding role for superseded session"
                );
                return false;
            }
            match state {
                AuthState::Authenticated {
                    session: current,
                    role: slot,
                } if current.user_id == session.user_id => {
                    *slot = Some(role);
                    tracing::info!(user_id = %session.user_id, role = %role, "Session authorized");
                    true
                }
                _ => false,
            }
        })
    }

    /// Delegates to the identity provider. State is updated by the session
    /// event the provider emits, not here.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please enter your email and password.".to_string(),
            ));
        }

        match self.identity.sign_in(email, password).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user_id, "Sign-in accepted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    pub async fn sign_up(
        &self,
        form: &SignUpForm,
        min_password_length: usize,
    ) -> Result<(), AuthError> {
        form.check(min_password_length)?;
        self.identity.sign_up(form).await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-up failed");
            e
        })
    }

    /// Always ends anonymous, even if the provider call fails; the caller
    /// should reset navigation to the returned entry point.
    pub async fn sign_out(self: &Arc<Self>) -> Navigation {
        if let Err(e) = self.identity.sign_out().await {
            tracing::error!(error = %e, "Provider sign-out failed; clearing local session anyway");
        }
        self.apply(SessionEvent::signed_out());
        tracing::info!("Signed out");
        Navigation::SignIn
    }

    /// Waits until the current session has a resolved role.
    pub async fn wait_for_role(&self, timeout: Duration) -> Option<Role> {
        let mut receiver = self.state.subscribe();
        let settled = tokio::time::timeout(timeout, async {
            loop {
                let role = receiver.borrow_and_update().role();
                if role.is_some() {
                    return role;
                }
                if receiver.changed().await.is_err() {
                    return None;
                }
            }
        })
        .await;
        settled.unwrap_or(None)
    }

    pub fn shutdown(&self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
        if let Some(resolution) = lock(&self.resolution).take() {
            resolution.abort();
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}
