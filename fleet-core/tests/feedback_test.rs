mod common;

use common::{settle, TestConsole};
use fleet_core::error::FILL_ALL_FIELDS;
use fleet_core::{BackendError, EntityType, FeedbackDraft, FeedbackError, NoticeLevel};
use std::sync::Arc;

#[tokio::test]
async fn empty_trip_id_makes_no_backend_call() {
    let console = TestConsole::new();
    let mut draft = FeedbackDraft::new("drv_1", "", "Rude at pickup");

    let err = console.feedback.submit(&mut draft).await.unwrap_err();

    assert_eq!(err, FeedbackError::Validation(FILL_ALL_FIELDS.to_string()));
    assert!(console.backend.submissions().is_empty());
    let notice = console.feedback.notices().current().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
}

#[tokio::test]
async fn second_submit_while_pending_is_refused() {
    let console = Arc::new(TestConsole::new());
    let gate = console.backend.hold_submissions();

    let first = {
        let console = console.clone();
        tokio::spawn(async move {
            let mut draft = FeedbackDraft::new("drv_1", "trip_1", "Smooth ride");
            console.feedback.submit(&mut draft).await
        })
    };
    settle().await;
    assert!(console.feedback.is_submitting());

    let mut second = FeedbackDraft::new("drv_1", "trip_1", "Smooth ride");
    let refused = console.feedback.submit(&mut second).await.unwrap_err();
    assert_eq!(refused, FeedbackError::InFlight);

    gate.notify_one();
    first.await.unwrap().unwrap();

    assert_eq!(console.backend.submissions().len(), 1);
    assert!(!console.feedback.is_submitting());
}

#[tokio::test]
async fn retry_after_failure_mints_a_new_idempotency_key() {
    let console = TestConsole::new();
    console
        .backend
        .respond_next(Err(BackendError::Connectivity("refused".into())));
    let mut draft = FeedbackDraft::new("drv_7", "trip_3", "Late twice");
    draft.entity_type = EntityType::Trip;

    assert!(console.feedback.submit(&mut draft).await.is_err());
    assert_eq!(draft.text, "Late twice");
    console.feedback.submit(&mut draft).await.unwrap();

    let sent = console.backend.submissions();
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0].external_feedback_id, sent[1].external_feedback_id);
    assert_eq!(sent[1].entity_type, Some(EntityType::Trip));
    assert_eq!(draft.text, "");
}
