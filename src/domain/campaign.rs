//! Referral campaign (tracking link).

use crate::domain::{OwnerType, TimeMs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::primitives::ParseEnumError;

/// Campaign lifecycle status. Tracking only accepts events for active
/// campaigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            other => Err(ParseEnumError {
                kind: "campaign status",
                value: other.to_string(),
            }),
        }
    }
}

/// A referral campaign owned by an agent or affiliate.
///
/// The `code` is the public tracking handle embedded in referral links;
/// events resolve campaigns by code and denormalize the owner onto the
/// event row at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub code: String,
    pub name: String,
    pub owner_type: OwnerType,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_url: Option<String>,
    pub status: CampaignStatus,
    pub created_ms: TimeMs,
}

impl Campaign {
    pub fn new(
        code: String,
        name: String,
        owner_type: OwnerType,
        owner_id: String,
        landing_url: Option<String>,
        created_ms: TimeMs,
    ) -> Self {
        Campaign {
            id: uuid::Uuid::new_v4().to_string(),
            code,
            name,
            owner_type,
            owner_id,
            landing_url,
            status: CampaignStatus::Active,
            created_ms,
        }
    }
}
