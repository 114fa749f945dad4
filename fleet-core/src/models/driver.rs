//! Driver score snapshot as served by the sentiment backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStat {
    pub driver_id: String,
    pub score: f64,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default, with = "timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub last_alert_at: Option<DateTime<Utc>>,
}

impl DriverStat {
    pub fn new(driver_id: impl Into<String>, score: f64, total_count: u64) -> Self {
        Self {
            driver_id: driver_id.into(),
            score,
            total_count,
            last_updated: None,
            last_alert_at: None,
        }
    }
}

/// `GET /drivers` response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriverList {
    #[serde(default)]
    pub data: Vec<DriverStat>,
}

impl DriverList {
    /// Drops rows the rest of the crate cannot reason about: blank ids and
    /// non-finite scores. Order of the remaining rows is preserved.
    pub fn into_valid(self) -> Vec<DriverStat> {
        let total = self.data.len();
        let rows: Vec<DriverStat> = self
            .data
            .into_iter()
            .filter(|row| !row.driver_id.trim().is_empty() && row.score.is_finite())
            .collect();

        if rows.len() != total {
            tracing::warn!(
                dropped = total - rows.len(),
                kept = rows.len(),
                "Discarded malformed driver rows from feed"
            );
        }
        rows
    }
}

/// Timestamps arrive either as RFC 3339 or as naive ISO 8601 (read as UTC).
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc())
            })
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_some(&t.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) if !s.trim().is_empty() => parse(s.trim())
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
