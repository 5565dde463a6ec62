//! Pure commission calculation.
//!
//! Both paths are functions of the event and the immutable
//! [`CommissionConfig`] injected at construction; nothing here touches the
//! store or the environment.

use crate::config::{CommissionConfig, CommissionModel};
use crate::domain::{Decimal, EventType};

/// Computes commission amounts from attribution events.
#[derive(Debug, Clone, Copy)]
pub struct CommissionCalculator {
    config: CommissionConfig,
}

impl CommissionCalculator {
    pub fn new(config: CommissionConfig) -> Self {
        Self { config }
    }

    /// Agent commission from player net losses. Always revenue-share.
    pub fn agent_loss_commission(&self, net_losses: Decimal) -> Decimal {
        net_losses * self.config.agent_revshare_pct
    }

    /// Affiliate commission, gated by the global payout model.
    ///
    /// Under CPA only `ftd` events pay (the fixed CPA amount, regardless of
    /// the deposit size); under REVSHARE only `deposit` events pay. Every
    /// other combination is worth zero, which callers treat as a silent
    /// no-op.
    pub fn affiliate_commission(&self, event_type: EventType, amount: Decimal) -> Decimal {
        match (self.config.affiliate_model, event_type) {
            (CommissionModel::Cpa, EventType::Ftd) => self.config.affiliate_cpa_ftd,
            (CommissionModel::Revshare, EventType::Deposit) => {
                amount * self.config.affiliate_revshare_pct
            }
            _ => Decimal::zero(),
        }
    }
}
