//! Withdrawal lifecycle against owner balances.
//!
//! Funds are locked (withdrawable decremented) when a request is created.
//! Rejection releases the lock; payment debits the wallet balance, which
//! was untouched until then. Approval is a pure status change.

use crate::db::Repository;
use crate::domain::{Decimal, OwnerType, TimeMs, Withdrawal, WithdrawalStatus};
use crate::engine::EngineError;
use std::sync::Arc;

pub struct WalletEngine {
    repo: Arc<Repository>,
}

impl WalletEngine {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Current (wallet, withdrawable) balances for an owner.
    pub async fn get_balance(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
    ) -> Result<(Decimal, Decimal), EngineError> {
        let owner = self
            .repo
            .get_owner(owner_type, owner_id)
            .await?
            .ok_or_else(|| EngineError::OwnerNotFound(format!("{} {}", owner_type, owner_id)))?;
        Ok((owner.wallet_balance, owner.withdrawable_balance))
    }

    /// Create a withdrawal request, locking the amount.
    ///
    /// Balance check, row insert and the withdrawable decrement are one
    /// transaction: on `InsufficientBalance` nothing is written.
    pub async fn create_withdrawal(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
        amount: Decimal,
        method: String,
        currency: String,
    ) -> Result<Withdrawal, EngineError> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "withdrawal amount must be positive, got {}",
                amount
            )));
        }

        let _guard = self.repo.lock_writes().await;
        let mut tx = self.repo.pool().begin().await?;

        let owner = Repository::get_owner_tx(&mut tx, owner_type, owner_id)
            .await?
            .ok_or_else(|| EngineError::OwnerNotFound(format!("{} {}", owner_type, owner_id)))?;

        if amount > owner.withdrawable_balance {
            return Err(EngineError::InsufficientBalance {
                requested: amount,
                available: owner.withdrawable_balance,
            });
        }

        let withdrawal = Withdrawal::new(
            owner_type,
            owner_id.to_string(),
            amount,
            method,
            currency,
            TimeMs::now(),
        );
        Repository::insert_withdrawal_tx(&mut tx, &withdrawal).await?;
        Repository::set_owner_balances_tx(
            &mut tx,
            owner_type,
            owner_id,
            owner.wallet_balance,
            owner.withdrawable_balance - amount,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            owner_type = owner_type.as_str(),
            owner_id,
            withdrawal_id = %withdrawal.id,
            amount = %amount,
            "withdrawal created"
        );
        Ok(withdrawal)
    }

    /// Transition a withdrawal to approved, rejected or paid.
    ///
    /// Balance effects are guarded on the current status so a replayed
    /// transition cannot credit or debit twice; the status and any supplied
    /// reference are always set.
    pub async fn transition_withdrawal(
        &self,
        withdrawal_id: &str,
        new_status: WithdrawalStatus,
        reference: Option<String>,
    ) -> Result<Withdrawal, EngineError> {
        if new_status == WithdrawalStatus::Pending {
            return Err(EngineError::InvalidTransition(
                "cannot transition back to pending".to_string(),
            ));
        }

        let _guard = self.repo.lock_writes().await;
        let mut tx = self.repo.pool().begin().await?;

        let withdrawal = Repository::get_withdrawal_tx(&mut tx, withdrawal_id)
            .await?
            .ok_or_else(|| EngineError::WithdrawalNotFound(withdrawal_id.to_string()))?;

        match new_status {
            // Rejecting a pending request releases the locked funds.
            WithdrawalStatus::Rejected if withdrawal.status == WithdrawalStatus::Pending => {
                let owner = Self::owner_of(&mut tx, &withdrawal).await?;
                Repository::set_owner_balances_tx(
                    &mut tx,
                    withdrawal.owner_type,
                    &withdrawal.owner_id,
                    owner.wallet_balance,
                    owner.withdrawable_balance + withdrawal.amount,
                )
                .await?;
            }
            // Paying debits the wallet; withdrawable was already reduced at
            // creation time.
            WithdrawalStatus::Paid if withdrawal.status != WithdrawalStatus::Paid => {
                let owner = Self::owner_of(&mut tx, &withdrawal).await?;
                Repository::set_owner_balances_tx(
                    &mut tx,
                    withdrawal.owner_type,
                    &withdrawal.owner_id,
                    owner.wallet_balance - withdrawal.amount,
                    owner.withdrawable_balance,
                )
                .await?;
            }
            _ => {}
        }

        Repository::set_withdrawal_status_tx(
            &mut tx,
            withdrawal_id,
            new_status,
            reference.as_deref(),
            TimeMs::now(),
        )
        .await?;

        let updated = Repository::get_withdrawal_tx(&mut tx, withdrawal_id)
            .await?
            .ok_or_else(|| EngineError::WithdrawalNotFound(withdrawal_id.to_string()))?;

        tx.commit().await?;

        tracing::info!(
            withdrawal_id,
            from = withdrawal.status.as_str(),
            to = new_status.as_str(),
            amount = %withdrawal.amount,
            "withdrawal transitioned"
        );
        Ok(updated)
    }

    async fn owner_of(
        conn: &mut sqlx::sqlite::SqliteConnection,
        withdrawal: &Withdrawal,
    ) -> Result<crate::domain::Owner, EngineError> {
        Repository::get_owner_tx(conn, withdrawal.owner_type, &withdrawal.owner_id)
            .await?
            .ok_or_else(|| {
                EngineError::OwnerNotFound(format!(
                    "{} {}",
                    withdrawal.owner_type, withdrawal.owner_id
                ))
            })
    }
}
