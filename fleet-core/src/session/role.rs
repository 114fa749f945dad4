//! Role lookup with a single fallback policy: anything short of a clean
//! `admin`/`employee` row resolves to `Employee`.

use std::sync::Arc;

use crate::models::Role;
use crate::providers::{ProfileRecord, ProfileStore};

#[derive(Clone)]
pub struct RoleResolver {
    profiles: Arc<dyn ProfileStore>,
}

impl RoleResolver {
    pub const FALLBACK: Role = Role::Employee;

    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    pub async fn resolve(&self, user_id: &str) -> Role {
        match self.profiles.get_role(user_id).await {
            Ok(ProfileRecord { role: Some(raw) }) => match raw.parse::<Role>() {
                Ok(role) => {
                    tracing::debug!(user_id, role = %role, "Resolved role");
                    role
                }
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Unrecognised role in profile; using fallback");
                    Self::FALLBACK
                }
            },
            Ok(ProfileRecord { role: None }) => {
                tracing::debug!(user_id, "Profile has no role; using fallback");
                Self::FALLBACK
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Role lookup failed; using fallback");
                Self::FALLBACK
            }
        }
    }
}
