//! Domain types for the affiliate/agent commission platform.
//!
//! This module provides:
//! - Lossless monetary amounts via the Decimal wrapper
//! - Domain primitives: TimeMs, OwnerType, EventType
//! - Persistent row types: Owner, Player, Campaign, TrackingEvent,
//!   LedgerEntry, Withdrawal
//! - The pure period key derivation used by the ledger

pub mod campaign;
pub mod decimal;
pub mod event;
pub mod ledger;
pub mod owner;
pub mod period;
pub mod player;
pub mod primitives;
pub mod withdrawal;

pub use campaign::{Campaign, CampaignStatus};
pub use decimal::Decimal;
pub use event::TrackingEvent;
pub use ledger::LedgerEntry;
pub use owner::Owner;
pub use period::{period_key, Granularity};
pub use player::Player;
pub use primitives::{EventType, OwnerType, TimeMs};
pub use withdrawal::{Withdrawal, WithdrawalStatus};
