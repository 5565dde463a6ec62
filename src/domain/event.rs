//! Append-only tracking events.

use crate::domain::{Decimal, EventType, OwnerType, TimeMs};
use serde::{Deserialize, Serialize};

/// An immutable attribution fact: a click, registration, deposit, first
/// deposit or loss.
///
/// The owning agent/affiliate is denormalized from the campaign at creation
/// time so attribution survives later campaign edits. Rows are never
/// updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub id: String,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    pub owner_type: OwnerType,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
    pub time_ms: TimeMs,
}

impl TrackingEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_type: EventType,
        player_id: Option<String>,
        campaign_id: Option<String>,
        owner_type: OwnerType,
        owner_id: String,
        amount: Option<Decimal>,
        currency: Option<String>,
        ip: Option<String>,
        ua: Option<String>,
        time_ms: TimeMs,
    ) -> Self {
        TrackingEvent {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            player_id,
            campaign_id,
            owner_type,
            owner_id,
            amount,
            currency,
            ip,
            ua,
            time_ms,
        }
    }
}
