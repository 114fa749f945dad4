pub mod account;
pub mod driver;
pub mod feedback;
pub mod session;

pub use account::SignUpForm;
pub use driver::{DriverList, DriverStat};
pub use feedback::{EntityType, FeedbackAck, FeedbackDraft, FeedbackSubmission};
pub use session::{AuthState, Role, Session, SessionEvent, SessionEventKind, UnknownRole};

use validator::ValidationError;

/// Rejects values that are empty once surrounding whitespace is removed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
