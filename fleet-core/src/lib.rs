//! fleet-core: session, authorization and driver-risk logic shared by the
//! fleet feedback console.
//!
//! The crate owns the auth state machine (`session`), the route guard
//! (`guard`), the feedback write path (`feedback`) and the read path over the
//! driver score feed (`aggregator`, `search`, `board`). External systems are
//! reached only through the traits in `providers`.
pub mod aggregator;
pub mod board;
pub mod error;
pub mod feedback;
pub mod guard;
pub mod models;
pub mod notice;
pub mod providers;
pub mod scoring;
pub mod search;
pub mod session;

pub use aggregator::{DriverAggregator, FleetSummary};
pub use board::{DashboardView, DriverBoard, DriverRow, LoadState};
pub use error::{AuthError, BackendError, ConfigError, FeedbackError, ProviderError};
pub use feedback::FeedbackSubmitter;
pub use guard::{authorize, Access, GuardDecision, Navigation, RouteTable};
pub use models::{
    AuthState, DriverStat, EntityType, FeedbackAck, FeedbackDraft, FeedbackSubmission, Role,
    Session, SessionEvent, SessionEventKind, SignUpForm,
};
pub use notice::{Notice, NoticeBoard, NoticeLevel, DEFAULT_NOTICE_TTL};
pub use providers::{IdentityProvider, ProfileRecord, ProfileStore, SentimentBackend};
pub use scoring::{RiskAssessment, RiskClass, ScoringConfig};
pub use session::{RoleResolver, SessionStore};
