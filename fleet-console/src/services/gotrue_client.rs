//! Password sign-in against a GoTrue-compatible identity service.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fleet_core::models::SessionEvent;
use fleet_core::providers::SessionSubscription;
use fleet_core::{AuthError, IdentityProvider, Session, SignUpForm};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::IdentitySettings;
use crate::observability::TracedClientExt;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

struct StoredSession {
    session: Session,
    access_token: Secret<String>,
    expires_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl StoredSession {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Pulls a human-readable message out of a GoTrue error body. GoTrue has
/// used `error_description`, `msg` and `message` over time.
pub fn error_message(body: &str) -> String {
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// The cached session plus the channel that announces changes to it.
/// Shared with the expiry timer.
struct SessionSlot {
    current: RwLock<Option<StoredSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionSlot {
    fn publish(&self, event: SessionEvent) {
        // No receivers just means nobody is listening yet.
        let _ = self.events.send(event);
    }

    fn replace(&self, stored: Option<StoredSession>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = stored;
    }

    /// Clears the cached session if `ends` says so, then announces the expiry.
    fn end_if(&self, ends: impl FnOnce(&StoredSession) -> bool) -> bool {
        let ended = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if current.as_ref().is_some_and(ends) {
                current.take()
            } else {
                None
            }
        };
        match ended {
            Some(stored) => {
                tracing::info!(user_id = %stored.session.user_id, "Session token expired");
                self.publish(SessionEvent::expired());
                true
            }
            None => false,
        }
    }

    fn drop_if_expired(&self) -> bool {
        let now = Utc::now();
        self.end_if(|stored| stored.is_expired(now))
    }
}

pub struct GoTrueClient {
    client: Client,
    settings: IdentitySettings,
    slot: Arc<SessionSlot>,
    generations: AtomicU64,
    expiry: Mutex<Option<JoinHandle<()>>>,
}

impl GoTrueClient {
    pub fn new(settings: IdentitySettings) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            client: Client::new(),
            settings,
            slot: Arc::new(SessionSlot {
                current: RwLock::new(None),
                events,
            }),
            generations: AtomicU64::new(0),
            expiry: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.settings.url.trim_end_matches('/'), path)
    }

    /// Access token of the current session, for calls made on the
    /// operator's behalf.
    pub fn access_token(&self) -> Option<String> {
        self.slot.drop_if_expired();
        self.slot
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|stored| stored.access_token.expose_secret().clone())
    }

    /// Ends session `generation` once its token runs out, unless it has
    /// been replaced by then.
    fn schedule_expiry(&self, generation: u64, after: Duration) {
        let slot = Arc::downgrade(&self.slot);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(slot) = slot.upgrade() {
                slot.end_if(|stored| stored.generation == generation);
            }
        });
        if let Some(previous) = self.swap_expiry(Some(handle)) {
            previous.abort();
        }
    }

    fn swap_expiry(&self, next: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        std::mem::replace(
            &mut *self.expiry.lock().unwrap_or_else(PoisonError::into_inner),
            next,
        )
    }
}

impl Drop for GoTrueClient {
    fn drop(&mut self) {
        if let Some(timer) = self.swap_expiry(None) {
            timer.abort();
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = self.url("/token");
        let response = self
            .client
            .traced_post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", self.settings.api_key.expose_secret())
            .timeout(self.settings.timeout())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send sign-in request to {}: {}", url, e);
                AuthError::from_sign_in_failure(None, &e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_sign_in_failure(
                Some(status.as_u16()),
                &error_message(&body),
            ));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Unreadable token response");
            AuthError::Rejected("Unexpected response from the sign-in service.".to_string())
        })?;

        let session = Session::new(
            tokens.user.id,
            tokens.user.email.unwrap_or_else(|| email.to_string()),
        );
        let lifetime = tokens
            .expires_in
            .map(|secs| Duration::from_secs(u64::try_from(secs).unwrap_or(0)));
        let expires_at = lifetime
            .and_then(|ttl| ChronoDuration::from_std(ttl).ok())
            .map(|ttl| session.issued_at + ttl);
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        self.slot.replace(Some(StoredSession {
            session: session.clone(),
            access_token: Secret::new(tokens.access_token),
            expires_at,
            generation,
        }));

        tracing::info!(user_id = %session.user_id, "Identity provider issued session");
        self.slot.publish(SessionEvent::signed_in(session.clone()));
        if let Some(ttl) = lifetime {
            self.schedule_expiry(generation, ttl);
        }
        Ok(session)
    }

    async fn sign_up(&self, form: &SignUpForm) -> Result<(), AuthError> {
        let url = self.url("/signup");
        let response = self
            .client
            .traced_post(&url)
            .header("apikey", self.settings.api_key.expose_secret())
            .timeout(self.settings.timeout())
            .json(&serde_json::json!({
                "email": form.email.trim(),
                "password": form.password,
                "data": { "full_name": form.full_name.trim() },
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send sign-up request to {}: {}", url, e);
                AuthError::from_sign_up_failure(None, &e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Account registered; awaiting email confirmation");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::from_sign_up_failure(
            Some(status.as_u16()),
            &error_message(&body),
        ))
    }

    /// Revokes the token remotely, but always forgets the local session.
    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.access_token();
        if let Some(timer) = self.swap_expiry(None) {
            timer.abort();
        }
        self.slot.replace(None);
        self.slot.publish(SessionEvent::signed_out());

        let Some(token) = token else {
            return Ok(());
        };
        let url = self.url("/logout");
        let response = self
            .client
            .traced_post(&url)
            .header("apikey", self.settings.api_key.expose_secret())
            .bearer_auth(token)
            .timeout(self.settings.timeout())
            .send()
            .await
            .map_err(|e| AuthError::Connectivity(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::Rejected(format!(
                "logout returned {}: {}",
                status,
                error_message(&body)
            )))
        }
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.slot.drop_if_expired();
        Ok(self
            .slot
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|stored| stored.session.clone()))
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.slot.events.subscribe())
    }
}
