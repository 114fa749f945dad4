//! Session, role and auth-state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An authenticated identity as handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            issued_at: Utc::now(),
        }
    }

    /// Display name derived from the local part of the email.
    pub fn display_name(&self) -> &str {
        self.email
            .split('@')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("User")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("admin") {
            Ok(Role::Admin)
        } else if value.eq_ignore_ascii_case("employee") {
            Ok(Role::Employee)
        } else {
            Err(UnknownRole(raw.to_string()))
        }
    }
}

/// Who is using the console right now.
///
/// `Authenticated` carries `role: None` while the role for that session is
/// still being resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Loading,
    Anonymous,
    Authenticated {
        session: Session,
        role: Option<Role>,
    },
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            AuthState::Authenticated { role, .. } => *role,
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// True once no lookup is outstanding: either anonymous, or
    /// authenticated with a resolved role.
    pub fn is_settled(&self) -> bool {
        match self {
            AuthState::Loading => false,
            AuthState::Anonymous => true,
            AuthState::Authenticated { role, .. } => role.is_some(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthState::Loading => "loading",
            AuthState::Anonymous => "anonymous",
            AuthState::Authenticated { role: None, .. } => "resolving",
            AuthState::Authenticated { .. } => "authenticated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    /// The access token ran out; the session is gone.
    TokenExpired,
    TokenRefreshed,
    UserUpdated,
}

/// A push from the identity provider. `session` is the provider's current
/// session after the change, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn initial(session: Option<Session>) -> Self {
        Self {
            kind: SessionEventKind::InitialSession,
            session,
        }
    }

    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: SessionEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: SessionEventKind::SignedOut,
            session: None,
        }
    }

    pub fn expired() -> Self {
        Self {
            kind: SessionEventKind::TokenExpired,
            session: None,
        }
    }
}
