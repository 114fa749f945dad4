//! Feedback draft (what the operator typed) and the wire payload built from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    #[default]
    Driver,
    Trip,
    App,
    Marshal,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Driver,
        EntityType::Trip,
        EntityType::App,
        EntityType::Marshal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Driver => "driver",
            EntityType::Trip => "trip",
            EntityType::App => "app",
            EntityType::Marshal => "marshal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Driver => "Driver",
            EntityType::Trip => "Trip",
            EntityType::App => "Mobile App",
            EntityType::Marshal => "Marshal",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            EntityType::Driver => {
                "Describe the driver's behaviour, professionalism, and overall experience..."
            }
            EntityType::Trip => "Describe the trip quality: route taken, ETAs, safety during the ride...",
            EntityType::App => "Share your experience using the mobile app: UI, speed, bugs, or crashes...",
            EntityType::Marshal => "Describe the marshal's conduct, helpfulness, and safety protocols...",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| format!("unknown feedback type: {raw}"))
    }
}

/// The feedback form as the operator is filling it in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(default)]
pub struct FeedbackDraft {
    #[validate(custom(function = "not_blank", message = "Driver ID is required"))]
    pub driver_id: String,
    #[validate(custom(function = "not_blank", message = "Trip ID is required"))]
    pub trip_id: String,
    #[validate(custom(function = "not_blank", message = "Feedback text is required"))]
    pub text: String,
    pub entity_type: EntityType,
}

impl FeedbackDraft {
    pub fn new(
        driver_id: impl Into<String>,
        trip_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            driver_id: driver_id.into(),
            trip_id: trip_id.into(),
            text: text.into(),
            entity_type: EntityType::default(),
        }
    }
}

/// `POST /feedback` body. `external_feedback_id` is minted once per
/// submission attempt and is the key the backend deduplicates on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSubmission {
    pub driver_id: String,
    pub trip_id: String,
    pub text: String,
    pub external_feedback_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
}

impl FeedbackSubmission {
    pub fn from_draft(draft: &FeedbackDraft) -> Self {
        Self {
            driver_id: draft.driver_id.trim().to_string(),
            trip_id: draft.trip_id.trim().to_string(),
            text: draft.text.trim().to_string(),
            external_feedback_id: Uuid::new_v4(),
            entity_type: Some(draft.entity_type),
        }
    }
}

fn default_success() -> bool {
    true
}

/// 2xx body of `POST /feedback`. Older backends omit `success`; a 2xx without
/// it counts as accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedbackAck {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub sentiment_label: Option<String>,
    #[serde(default)]
    pub updated_driver_score: Option<f64>,
}

impl FeedbackAck {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: None,
            sentiment_score: None,
            sentiment_label: None,
            updated_driver_score: None,
        }
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::accepted()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_trims_fields_and_mints_fresh_keys() {
        let draft = FeedbackDraft::new(" drv_1 ", "trip_9\n", "  late again ");
        let first = FeedbackSubmission::from_draft(&draft);
        let second = FeedbackSubmission::from_draft(&draft);

        assert_eq!(first.driver_id, "drv_1");
        assert_eq!(first.trip_id, "trip_9");
        assert_eq!(first.text, "late again");
        assert_ne!(first.external_feedback_id, second.external_feedback_id);
    }

    #[test]
    fn submission_serializes_snake_case_wire_names() {
        let mut draft = FeedbackDraft::new("drv_1", "trip_9", "fine");
        draft.entity_type = EntityType::Marshal;
        let body = serde_json::to_value(FeedbackSubmission::from_draft(&draft)).unwrap();

        assert_eq!(body["driver_id"], "drv_1");
        assert_eq!(body["trip_id"], "trip_9");
        assert_eq!(body["entity_type"], "marshal");
        assert!(body["external_feedback_id"].as_str().is_some());
    }

    #[test]
    fn ack_without_success_flag_counts_as_accepted() {
        let ack: FeedbackAck =
            serde_json::from_str(r#"{"message":"Feedback processed successfully"}"#).unwrap();
        assert!(ack.success);

        let ack: FeedbackAck =
            serde_json::from_str(r#"{"success":false,"message":"duplicate"}"#).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message.as_deref(), Some("duplicate"));
    }

    #[test]
    fn entity_type_round_trips_through_str() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>(), Ok(t));
        }
        assert!("bus".parse::<EntityType>().is_err());
    }
}
