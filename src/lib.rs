pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;

pub use config::{CommissionConfig, CommissionModel, Config};
pub use db::{init_db, Repository};
pub use domain::{
    period_key, Campaign, CampaignStatus, Decimal, EventType, Granularity, LedgerEntry, Owner,
    OwnerType, Player, TimeMs, TrackingEvent, Withdrawal, WithdrawalStatus,
};
pub use engine::{CommissionCalculator, SettlementEngine, WalletEngine};
pub use error::AppError;
