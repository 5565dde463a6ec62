//! Commission and wallet engines: the balance-mutating core.

pub mod calculator;
pub mod settlement;
pub mod wallet;

pub use calculator::CommissionCalculator;
pub use settlement::SettlementEngine;
pub use wallet::WalletEngine;

use crate::domain::Decimal;
use thiserror::Error;

/// Failure taxonomy shared by the settlement and wallet engines.
///
/// `Store` errors are transient and safe to retry for settlements (the
/// ledger upsert is idempotent); retried withdrawal creation can duplicate
/// requests and is the caller's responsibility.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} not found")]
    OwnerNotFound(String),
    #[error("withdrawal {0} not found")]
    WithdrawalNotFound(String),
    #[error("insufficient balance: requested {requested}, withdrawable {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}
