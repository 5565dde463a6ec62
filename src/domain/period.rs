//! Ledger period granularities and canonical period keys.

use crate::domain::primitives::{ParseEnumError, TimeMs};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Aggregation granularity for commission ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(ParseEnumError {
                kind: "granularity",
                value: other.to_string(),
            }),
        }
    }
}

/// Derive the canonical period key for a timestamp at a granularity.
///
/// Daily keys are `YYYY-MM-DD`, monthly keys `YYYY-MM`. Weekly keys are
/// `YYYY-W{week}` under ISO-8601 week rules: the year component is the ISO
/// week-year, so a late-December date can key into the following year and
/// an early-January date into the previous one.
///
/// Pure and deterministic; all calendar math is UTC.
pub fn period_key(time: TimeMs, granularity: Granularity) -> String {
    let dt: DateTime<Utc> =
        DateTime::from_timestamp_millis(time.as_ms()).unwrap_or(DateTime::UNIX_EPOCH);

    match granularity {
        Granularity::Daily => dt.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let week = dt.iso_week();
            format!("{}-W{}", week.year(), week.week())
        }
        Granularity::Monthly => dt.format("%Y-%m").to_string(),
    }
}
