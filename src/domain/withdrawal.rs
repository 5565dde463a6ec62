//! Withdrawal requests and their status lifecycle.

use crate::domain::primitives::ParseEnumError;
use crate::domain::{Decimal, OwnerType, TimeMs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Withdrawal lifecycle: pending -> approved -> paid, or pending ->
/// rejected.
///
/// Funds are locked (withdrawable balance decremented) when the request is
/// created; rejection releases the lock, payment debits the wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            "paid" => Ok(WithdrawalStatus::Paid),
            other => Err(ParseEnumError {
                kind: "withdrawal status",
                value: other.to_string(),
            }),
        }
    }
}

/// A withdrawal request against an owner's withdrawable balance.
///
/// Amount, method and currency are immutable once created; only `status`
/// and `reference` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: String,
    pub owner_type: OwnerType,
    pub owner_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub status: WithdrawalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub created_ms: TimeMs,
    pub updated_ms: TimeMs,
}

impl Withdrawal {
    pub fn new(
        owner_type: OwnerType,
        owner_id: String,
        amount: Decimal,
        method: String,
        currency: String,
        created_ms: TimeMs,
    ) -> Self {
        Withdrawal {
            id: uuid::Uuid::new_v4().to_string(),
            owner_type,
            owner_id,
            amount,
            currency,
            method,
            status: WithdrawalStatus::Pending,
            reference: None,
            created_ms,
            updated_ms: created_ms,
        }
    }
}
