//! Ledger settlement: converts commission amounts into period-keyed ledger
//! rows and owner balance credits, atomically.

use crate::config::CommissionConfig;
use crate::db::Repository;
use crate::domain::{
    period_key, Decimal, EventType, Granularity, LedgerEntry, OwnerType, TimeMs,
};
use crate::engine::{CommissionCalculator, EngineError};
use std::sync::Arc;

/// Settles commissions into the ledger and owner balances.
///
/// Settlement always writes at daily granularity; weekly/monthly rows are
/// the province of external batch rollups and are only read here.
pub struct SettlementEngine {
    repo: Arc<Repository>,
    calculator: CommissionCalculator,
}

impl SettlementEngine {
    pub fn new(repo: Arc<Repository>, config: CommissionConfig) -> Self {
        Self {
            repo,
            calculator: CommissionCalculator::new(config),
        }
    }

    /// Settle an agent's revenue-share commission on a player loss.
    ///
    /// # Errors
    /// `OwnerNotFound` if the agent does not exist; store errors otherwise.
    /// A non-positive commission is a silent no-op.
    pub async fn settle_agent_loss(
        &self,
        agent_id: &str,
        player_id: &str,
        loss_amount: Decimal,
        at: TimeMs,
    ) -> Result<(), EngineError> {
        let commission = self.calculator.agent_loss_commission(loss_amount);
        tracing::info!(
            agent_id,
            player_id,
            loss = %loss_amount,
            commission = %commission,
            "calculated agent commission"
        );
        if !commission.is_positive() {
            return Ok(());
        }
        self.settle(OwnerType::Agent, agent_id, commission, at).await
    }

    /// Settle an affiliate commission for an `ftd` or `deposit` event.
    ///
    /// The calculator zeroes whichever event type the configured model
    /// ignores, so callers invoke this unconditionally per event.
    pub async fn settle_affiliate(
        &self,
        affiliate_id: &str,
        event_type: EventType,
        amount: Decimal,
        at: TimeMs,
    ) -> Result<(), EngineError> {
        let commission = self.calculator.affiliate_commission(event_type, amount);
        if !commission.is_positive() {
            return Ok(());
        }
        self.settle(OwnerType::Affiliate, affiliate_id, commission, at)
            .await
    }

    /// Accumulate an incremental commission into the owner's daily ledger
    /// row and credit both balances, in one transaction.
    async fn settle(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
        commission: Decimal,
        at: TimeMs,
    ) -> Result<(), EngineError> {
        let period = Granularity::Daily;
        let key = period_key(at, period);

        let _guard = self.repo.lock_writes().await;
        let mut tx = self.repo.pool().begin().await?;

        let owner = Repository::get_owner_tx(&mut tx, owner_type, owner_id)
            .await?
            .ok_or_else(|| EngineError::OwnerNotFound(format!("{} {}", owner_type, owner_id)))?;

        let existing =
            Repository::get_ledger_tx(&mut tx, owner_type, owner_id, period, &key).await?;

        let now = TimeMs::now();
        let entry = match existing {
            Some(e) => {
                let gross = e.gross + commission;
                LedgerEntry {
                    gross,
                    commission: gross + e.adjustments,
                    updated_ms: now,
                    ..e
                }
            }
            None => LedgerEntry {
                id: uuid::Uuid::new_v4().to_string(),
                owner_type,
                owner_id: owner_id.to_string(),
                period,
                period_key: key.clone(),
                gross: commission,
                adjustments: Decimal::zero(),
                commission,
                currency: "USD".to_string(),
                created_ms: now,
                updated_ms: now,
            },
        };

        Repository::upsert_ledger_tx(&mut tx, &entry).await?;

        // Credit only the delta settled by this call; earlier increments on
        // the same period were applied when they settled.
        Repository::set_owner_balances_tx(
            &mut tx,
            owner_type,
            owner_id,
            owner.wallet_balance + commission,
            owner.withdrawable_balance + commission,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            owner_type = owner_type.as_str(),
            owner_id,
            period_key = %key,
            gross = %entry.gross,
            commission = %commission,
            "settled commission period"
        );
        Ok(())
    }
}
