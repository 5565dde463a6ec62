//! Domain primitives: TimeMs, OwnerType, EventType.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

/// Error for parsing enum-like domain strings.
#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Commission owner kind: an agent or an affiliate.
///
/// Ledger rows and withdrawals address owners as an (OwnerType, id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    Agent,
    Affiliate,
}

impl OwnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerType::Agent => "agent",
            OwnerType::Affiliate => "affiliate",
        }
    }
}

impl std::fmt::Display for OwnerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OwnerType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(OwnerType::Agent),
            "affiliate" => Ok(OwnerType::Affiliate),
            other => Err(ParseEnumError {
                kind: "owner type",
                value: other.to_string(),
            }),
        }
    }
}

/// Tracking event kind.
///
/// Events are append-only facts; `Ftd` marks a player's first deposit and is
/// spawned at most once per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Registration,
    Deposit,
    Ftd,
    Loss,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Registration => "registration",
            EventType::Deposit => "deposit",
            EventType::Ftd => "ftd",
            EventType::Loss => "loss",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(EventType::Click),
            "registration" => Ok(EventType::Registration),
            "deposit" => Ok(EventType::Deposit),
            "ftd" => Ok(EventType::Ftd),
            "loss" => Ok(EventType::Loss),
            other => Err(ParseEnumError {
                kind: "event type",
                value: other.to_string(),
            }),
        }
    }
}
