//! Referred player account.

use crate::domain::{Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// A player referred into the gaming platform.
///
/// Players registered through an agent campaign are bound to that agent;
/// affiliate-referred players carry no owner (attribution lives on the
/// tracking events).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub total_deposits: Decimal,
    pub total_losses: Decimal,
    pub created_ms: TimeMs,
}

impl Player {
    pub fn new(
        username: String,
        agent_id: Option<String>,
        country: Option<String>,
        created_ms: TimeMs,
    ) -> Self {
        Player {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            agent_id,
            status: "active".to_string(),
            country,
            total_deposits: Decimal::zero(),
            total_losses: Decimal::zero(),
            created_ms,
        }
    }
}
