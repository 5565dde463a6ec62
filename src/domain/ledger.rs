//! Commission ledger rows.

use crate::domain::{Decimal, Granularity, OwnerType, TimeMs};
use serde::{Deserialize, Serialize};

/// One commission ledger row per (owner_type, owner_id, period, period_key).
///
/// `gross` accumulates the commission amounts settled into the period (the
/// field name is inherited from upstream reporting and does not mean
/// pre-commission revenue). `commission = gross + adjustments` is the value
/// credited to balances over the life of the row. Rows are upserted, never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub owner_type: OwnerType,
    pub owner_id: String,
    pub period: Granularity,
    pub period_key: String,
    pub gross: Decimal,
    pub adjustments: Decimal,
    pub commission: Decimal,
    pub currency: String,
    pub created_ms: TimeMs,
    pub updated_ms: TimeMs,
}
