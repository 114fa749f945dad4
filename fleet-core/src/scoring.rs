//! Score scale, classification cut points and alert threshold.
//!
//! The default contract is the signed scale [-1, 1] with cut points at
//! +/-0.25 and alerts below -0.5. Other scales (for example 0-5 with an alert
//! threshold of 2.5) are expressed by configuration, never per call site.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskClass {
    Positive,
    Neutral,
    Negative,
}

impl RiskClass {
    pub fn label(&self) -> &'static str {
        match self {
            RiskClass::Positive => "Positive",
            RiskClass::Neutral => "Neutral",
            RiskClass::Negative => "Negative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub class: RiskClass,
    /// Score is strictly below the alert threshold.
    pub alerting: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub scale_min: f64,
    pub scale_max: f64,
    /// Scores at or above this are Positive.
    pub positive_cutoff: f64,
    /// Scores at or below this are Negative.
    pub negative_cutoff: f64,
    pub alert_threshold: f64,
    /// Number of lowest performers fed to the chart.
    pub chart_size: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            scale_min: -1.0,
            scale_max: 1.0,
            positive_cutoff: 0.25,
            negative_cutoff: -0.25,
            alert_threshold: -0.5,
            chart_size: 15,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.scale_min,
            self.scale_max,
            self.positive_cutoff,
            self.negative_cutoff,
            self.alert_threshold,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::InvalidScoring(
                "all scoring values must be finite".to_string(),
            ));
        }
        if self.scale_min >= self.scale_max {
            return Err(ConfigError::InvalidScoring(format!(
                "scale_min ({}) must be below scale_max ({})",
                self.scale_min, self.scale_max
            )));
        }
        if self.negative_cutoff >= self.positive_cutoff {
            return Err(ConfigError::InvalidScoring(format!(
                "negative_cutoff ({}) must be below positive_cutoff ({})",
                self.negative_cutoff, self.positive_cutoff
            )));
        }
        let in_scale = |v: f64| v >= self.scale_min && v <= self.scale_max;
        for (name, value) in [
            ("positive_cutoff", self.positive_cutoff),
            ("negative_cutoff", self.negative_cutoff),
            ("alert_threshold", self.alert_threshold),
        ] {
            if !in_scale(value) {
                return Err(ConfigError::InvalidScoring(format!(
                    "{name} ({value}) lies outside [{}, {}]",
                    self.scale_min, self.scale_max
                )));
            }
        }
        Ok(())
    }

    pub fn classify(&self, score: f64) -> RiskClass {
        if score >= self.positive_cutoff {
            RiskClass::Positive
        } else if score <= self.negative_cutoff {
            RiskClass::Negative
        } else {
            RiskClass::Neutral
        }
    }

    pub fn is_alerting(&self, score: f64) -> bool {
        score < self.alert_threshold
    }

    pub fn assess(&self, score: f64) -> RiskAssessment {
        RiskAssessment {
            class: self.classify(score),
            alerting: self.is_alerting(score),
        }
    }

    /// Position of `score` within the scale, clamped to [0, 1].
    pub fn normalize(&self, score: f64) -> f64 {
        let span = self.scale_max - self.scale_min;
        ((score - self.scale_min) / span).clamp(0.0, 1.0)
    }
}
