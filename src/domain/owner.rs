//! Commission owner: an agent or affiliate holding wallet balances.

use crate::domain::{Decimal, OwnerType, TimeMs};
use serde::{Deserialize, Serialize};

/// An agent or affiliate account.
///
/// `wallet_balance` is the total ever credited, debited only when a
/// withdrawal is paid out. `withdrawable_balance` excludes funds locked by
/// pending/approved withdrawals; it never exceeds `wallet_balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub owner_type: OwnerType,
    /// Short human-facing code, e.g. "AGT001".
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub wallet_balance: Decimal,
    pub withdrawable_balance: Decimal,
    pub created_ms: TimeMs,
}

impl Owner {
    /// Create a new owner with zero balances.
    pub fn new(
        owner_type: OwnerType,
        code: String,
        name: String,
        contact: Option<String>,
        created_ms: TimeMs,
    ) -> Self {
        Owner {
            id: uuid::Uuid::new_v4().to_string(),
            owner_type,
            code,
            name,
            contact,
            wallet_balance: Decimal::zero(),
            withdrawable_balance: Decimal::zero(),
            created_ms,
        }
    }
}
