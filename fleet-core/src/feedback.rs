//! Feedback write path: validate the draft, submit it once, report the
//! outcome on the feedback notice board.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use validator::Validate;

use crate::error::{FeedbackError, FILL_ALL_FIELDS};
use crate::models::{FeedbackAck, FeedbackDraft, FeedbackSubmission};
use crate::notice::NoticeBoard;
use crate::providers::SentimentBackend;

pub const SUBMITTED_MESSAGE: &str = "Feedback submitted successfully!";

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FeedbackSubmitter {
    backend: Arc<dyn SentimentBackend>,
    notices: NoticeBoard,
    in_flight: AtomicBool,
}

impl FeedbackSubmitter {
    pub fn new(backend: Arc<dyn SentimentBackend>, notices: NoticeBoard) -> Self {
        Self {
            backend,
            notices,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submits `draft`. At most one submission runs at a time; a second call
    /// while one is pending is refused without reaching the backend. On
    /// success the draft's text is cleared and its ids are kept.
    pub async fn submit(&self, draft: &mut FeedbackDraft) -> Result<FeedbackAck, FeedbackError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("Feedback submission already pending, ignoring");
            return Err(FeedbackError::InFlight);
        };

        if let Err(e) = draft.validate() {
            tracing::debug!(error = %e, "Feedback draft incomplete");
            self.notices.error(FILL_ALL_FIELDS);
            return Err(FeedbackError::Validation(FILL_ALL_FIELDS.to_string()));
        }

        let submission = FeedbackSubmission::from_draft(draft);
        tracing::info!(
            driver_id = %submission.driver_id,
            trip_id = %submission.trip_id,
            external_feedback_id = %submission.external_feedback_id,
            entity_type = ?submission.entity_type,
            "Submitting feedback"
        );

        let result = match self.backend.submit_feedback(&submission).await {
            Ok(ack) if ack.success => Ok(ack),
            Ok(ack) => Err(FeedbackError::Rejected(ack.message.unwrap_or_default())),
            Err(e) => Err(FeedbackError::from(e)),
        };

        match result {
            Ok(ack) => {
                draft.text.clear();
                self.notices.success(SUBMITTED_MESSAGE);
                tracing::info!(
                    external_feedback_id = %submission.external_feedback_id,
                    sentiment_score = ?ack.sentiment_score,
                    "Feedback accepted"
                );
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(
                    external_feedback_id = %submission.external_feedback_id,
                    outcome = e.outcome(),
                    error = %e,
                    "Feedback submission failed"
                );
                self.notices.error(e.user_message());
                Err(e)
            }
        }
    }
}
