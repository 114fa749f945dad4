//! Figures derived from one driver feed snapshot. Pure: nothing here mutates
//! or reorders the slice it is given.

use serde::Serialize;

use crate::models::DriverStat;
use crate::scoring::{RiskClass, ScoringConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    pub driver_count: usize,
    pub at_risk_count: usize,
    /// `None` when there are no drivers.
    pub average_score: Option<f64>,
    pub total_feedback: u64,
}

impl FleetSummary {
    pub const NO_DATA: &'static str = "N/A";

    pub fn average_display(&self) -> String {
        match self.average_score {
            Some(avg) => format!("{avg:.3}"),
            None => Self::NO_DATA.to_string(),
        }
    }
}

pub struct DriverAggregator<'a> {
    drivers: &'a [DriverStat],
    scoring: &'a ScoringConfig,
}

impl<'a> DriverAggregator<'a> {
    pub fn new(drivers: &'a [DriverStat], scoring: &'a ScoringConfig) -> Self {
        Self { drivers, scoring }
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn at_risk_count(&self) -> usize {
        self.drivers
            .iter()
            .filter(|d| self.scoring.is_alerting(d.score))
            .count()
    }

    pub fn average_score(&self) -> Option<f64> {
        if self.drivers.is_empty() {
            return None;
        }
        let sum: f64 = self.drivers.iter().map(|d| d.score).sum();
        Some(sum / self.drivers.len() as f64)
    }

    pub fn total_feedback_volume(&self) -> u64 {
        self.drivers
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.total_count))
    }

    /// The `n` lowest scores, ascending. Equal scores keep feed order.
    pub fn worst_n(&self, n: usize) -> Vec<&'a DriverStat> {
        let mut ranked: Vec<&'a DriverStat> = self.drivers.iter().collect();
        ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
        ranked.truncate(n);
        ranked
    }

    pub fn classify(&self, score: f64) -> RiskClass {
        self.scoring.classify(score)
    }

    pub fn summary(&self) -> FleetSummary {
        FleetSummary {
            driver_count: self.driver_count(),
            at_risk_count: self.at_risk_count(),
            average_score: self.average_score(),
            total_feedback: self.total_feedback_volume(),
        }
    }
}
