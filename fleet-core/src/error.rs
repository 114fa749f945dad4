use thiserror::Error;

pub const FILL_ALL_FIELDS: &str = "Please fill in all fields.";

/// Failures from the identity provider, plus local credential-form checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Rate limited by identity provider")]
    RateLimited,

    #[error("Account already exists")]
    DuplicateAccount,

    #[error("Identity provider unreachable: {0}")]
    Connectivity(String),

    #[error("Rejected by identity provider: {0}")]
    Rejected(String),
}

impl AuthError {
    /// Maps a failed sign-in response onto a category. `status` is `None`
    /// when there was no HTTP response at all.
    pub fn from_sign_in_failure(status: Option<u16>, message: &str) -> Self {
        let lowered = message.to_lowercase();
        match status {
            None => AuthError::Connectivity(message.to_string()),
            Some(429) => AuthError::RateLimited,
            _ if lowered.contains("rate limit") || lowered.contains("too many") => {
                AuthError::RateLimited
            }
            Some(400 | 401 | 422) => AuthError::InvalidCredentials(message.to_string()),
            Some(status) if status >= 500 => AuthError::Connectivity(message.to_string()),
            Some(_) => AuthError::Rejected(message.to_string()),
        }
    }

    /// Sign-up failures distinguish rate limiting from duplicate accounts by
    /// status first, then by message text.
    pub fn from_sign_up_failure(status: Option<u16>, message: &str) -> Self {
        let lowered = message.to_lowercase();
        if status.is_none() {
            return AuthError::Connectivity(message.to_string());
        }
        if status == Some(429) || lowered.contains("rate limit") || lowered.contains("too many") {
            AuthError::RateLimited
        } else if status == Some(400)
            || lowered.contains("already registered")
            || lowered.contains("already exists")
        {
            AuthError::DuplicateAccount
        } else {
            AuthError::Rejected(message.to_string())
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(msg) => msg.clone(),
            AuthError::InvalidCredentials(msg) if !msg.trim().is_empty() => msg.clone(),
            AuthError::InvalidCredentials(_) => {
                "Invalid credentials. Please try again.".to_string()
            }
            AuthError::RateLimited => {
                "Too many attempts. Please wait a few minutes and try again.".to_string()
            }
            AuthError::DuplicateAccount => {
                "An account with this email already exists. Try signing in instead.".to_string()
            }
            AuthError::Connectivity(_) => {
                "Could not reach the sign-in service. Check your connection and try again."
                    .to_string()
            }
            AuthError::Rejected(msg) if !msg.trim().is_empty() => msg.clone(),
            AuthError::Rejected(_) => "Request failed. Please try again.".to_string(),
        }
    }

    /// Short label for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation",
            AuthError::InvalidCredentials(_) => "invalid_credentials",
            AuthError::RateLimited => "rate_limited",
            AuthError::DuplicateAccount => "duplicate_account",
            AuthError::Connectivity(_) => "connectivity",
            AuthError::Rejected(_) => "rejected",
        }
    }
}

/// Failures from the profile store. Never reaches the UI: the role
/// resolver folds all of them into the least-privileged role.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Profile not found")]
    NotFound,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Profile store returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Failures from the sentiment backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Connectivity(String),

    #[error("Rejected by backend: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A submission is already in progress")]
    InFlight,

    #[error("Rejected by server: {0}")]
    Rejected(String),

    #[error("Connectivity failure: {0}")]
    Connectivity(String),
}

impl FeedbackError {
    pub fn user_message(&self) -> String {
        match self {
            FeedbackError::Validation(msg) => msg.clone(),
            FeedbackError::InFlight => "A submission is already in progress.".to_string(),
            FeedbackError::Rejected(msg) if !msg.trim().is_empty() => msg.clone(),
            FeedbackError::Rejected(_) => "Something went wrong.".to_string(),
            FeedbackError::Connectivity(_) => {
                "Failed to submit feedback. Is the server running?".to_string()
            }
        }
    }

    /// Short label for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            FeedbackError::Validation(_) => "validation",
            FeedbackError::InFlight => "in_flight",
            FeedbackError::Rejected(_) => "rejected",
            FeedbackError::Connectivity(_) => "connectivity",
        }
    }
}

impl From<BackendError> for FeedbackError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Connectivity(msg) => FeedbackError::Connectivity(msg),
            BackendError::Rejected(msg) => FeedbackError::Rejected(msg),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid scoring configuration: {0}")]
    InvalidScoring(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_rate_limit_wins_over_bad_request() {
        assert_eq!(
            AuthError::from_sign_up_failure(Some(400), "Email rate limit exceeded"),
            AuthError::RateLimited
        );
        assert_eq!(
            AuthError::from_sign_up_failure(Some(429), ""),
            AuthError::RateLimited
        );
    }

    #[test]
    fn sign_up_duplicate_by_status_or_message() {
        assert_eq!(
            AuthError::from_sign_up_failure(Some(422), "User already registered"),
            AuthError::DuplicateAccount
        );
        assert_eq!(
            AuthError::from_sign_up_failure(Some(400), "bad"),
            AuthError::DuplicateAccount
        );
        assert_eq!(
            AuthError::from_sign_up_failure(Some(500), "boom"),
            AuthError::Rejected("boom".into())
        );
    }

    #[test]
    fn sign_in_categories_have_distinct_messages() {
        let wrong = AuthError::from_sign_in_failure(Some(400), "Invalid login credentials");
        let offline = AuthError::from_sign_in_failure(None, "operation timed out");
        let limited = AuthError::from_sign_in_failure(Some(429), "slow down");

        assert_eq!(wrong.user_message(), "Invalid login credentials");
        assert_ne!(wrong.user_message(), offline.user_message());
        assert_ne!(offline.user_message(), limited.user_message());
        assert!(matches!(
            AuthError::from_sign_in_failure(Some(503), "unavailable"),
            AuthError::Connectivity(_)
        ));
    }

    #[test]
    fn backend_errors_map_onto_feedback_outcomes() {
        assert_eq!(
            FeedbackError::from(BackendError::Rejected("bad payload".into())),
            FeedbackError::Rejected("bad payload".into())
        );
        let err = FeedbackError::from(BackendError::Connectivity("refused".into()));
        assert_eq!(err.outcome(), "connectivity");
        assert_eq!(
            err.user_message(),
            "Failed to submit feedback. Is the server running?"
        );
    }
}
