//! Repository layer for database operations.
//!
//! Pool-level methods serve plain reads and append-only writes. Mutations
//! that touch owner balances or ledger rows go through the transaction-
//! scoped associated functions (`*_tx`), composed by the engines inside a
//! single transaction held under [`Repository::lock_writes`] so that
//! concurrent settlements and withdrawals for the same owner serialize.

use crate::domain::{
    Campaign, CampaignStatus, Decimal, EventType, Granularity, LedgerEntry, Owner, OwnerType,
    Player, TimeMs, TrackingEvent, Withdrawal, WithdrawalStatus,
};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tokio::sync::{Mutex, MutexGuard};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Acquire the process-wide writer lock.
    ///
    /// Every transaction that mutates owner balances, ledger rows or
    /// withdrawal status must hold this guard for its full duration; it is
    /// the lock domain that keeps read-modify-write sequences on the same
    /// owner from interleaving.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    // ---- owners ----

    pub async fn insert_owner(&self, owner: &Owner) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO owners (
                id, owner_type, code, name, contact,
                wallet_balance, withdrawable_balance, created_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&owner.id)
        .bind(owner.owner_type.as_str())
        .bind(&owner.code)
        .bind(&owner.name)
        .bind(&owner.contact)
        .bind(owner.wallet_balance.to_canonical_string())
        .bind(owner.withdrawable_balance.to_canonical_string())
        .bind(owner.created_ms.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_owner(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
    ) -> Result<Option<Owner>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM owners WHERE owner_type = ? AND id = ?")
            .bind(owner_type.as_str())
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| owner_from_row(&r)))
    }

    /// Fetch an owner inside an open transaction.
    pub async fn get_owner_tx(
        conn: &mut SqliteConnection,
        owner_type: OwnerType,
        owner_id: &str,
    ) -> Result<Option<Owner>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM owners WHERE owner_type = ? AND id = ?")
            .bind(owner_type.as_str())
            .bind(owner_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(|r| owner_from_row(&r)))
    }

    /// Overwrite both balances of an owner inside an open transaction.
    pub async fn set_owner_balances_tx(
        conn: &mut SqliteConnection,
        owner_type: OwnerType,
        owner_id: &str,
        wallet_balance: Decimal,
        withdrawable_balance: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE owners SET wallet_balance = ?, withdrawable_balance = ? \
             WHERE owner_type = ? AND id = ?",
        )
        .bind(wallet_balance.to_canonical_string())
        .bind(withdrawable_balance.to_canonical_string())
        .bind(owner_type.as_str())
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // ---- players ----

    pub async fn insert_player(&self, player: &Player) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO players (
                id, username, agent_id, status, country,
                total_deposits, total_losses, created_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&player.id)
        .bind(&player.username)
        .bind(&player.agent_id)
        .bind(&player.status)
        .bind(&player.country)
        .bind(player.total_deposits.to_canonical_string())
        .bind(player.total_losses.to_canonical_string())
        .bind(player.created_ms.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_player(&self, player_id: &str) -> Result<Option<Player>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM players WHERE id = ?")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| player_from_row(&r)))
    }

    pub async fn get_player_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Player>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM players WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| player_from_row(&r)))
    }

    /// Accumulate a deposit into the player's lifetime totals.
    pub async fn add_player_deposit(
        &self,
        player_id: &str,
        amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        let Some(player) = self.get_player(player_id).await? else {
            return Ok(());
        };
        sqlx::query("UPDATE players SET total_deposits = ? WHERE id = ?")
            .bind((player.total_deposits + amount).to_canonical_string())
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Accumulate a loss into the player's lifetime totals.
    pub async fn add_player_loss(
        &self,
        player_id: &str,
        amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        let Some(player) = self.get_player(player_id).await? else {
            return Ok(());
        };
        sqlx::query("UPDATE players SET total_losses = ? WHERE id = ?")
            .bind((player.total_losses + amount).to_canonical_string())
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- campaigns ----

    pub async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, code, name, owner_type, owner_id, landing_url, status, created_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&campaign.id)
        .bind(&campaign.code)
        .bind(&campaign.name)
        .bind(campaign.owner_type.as_str())
        .bind(&campaign.owner_id)
        .bind(&campaign.landing_url)
        .bind(campaign.status.as_str())
        .bind(campaign.created_ms.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_campaign_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM campaigns WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| campaign_from_row(&r)))
    }

    // ---- tracking events ----

    pub async fn insert_event(&self, event: &TrackingEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tracking_events (
                id, event_type, player_id, campaign_id, owner_type, owner_id,
                amount, currency, ip, ua, time_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(event.event_type.as_str())
        .bind(&event.player_id)
        .bind(&event.campaign_id)
        .bind(event.owner_type.as_str())
        .bind(&event.owner_id)
        .bind(event.amount.map(|a| a.to_canonical_string()))
        .bind(&event.currency)
        .bind(&event.ip)
        .bind(&event.ua)
        .bind(event.time_ms.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// First-time-deposit check: has this player any prior `ftd` event?
    pub async fn has_ftd_event(&self, player_id: &str) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tracking_events WHERE player_id = ? AND event_type = 'ftd'",
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }

    /// The player attached to the most recent registration on a campaign.
    ///
    /// Fallback attribution for deposits reported without a player id.
    pub async fn latest_registered_player(
        &self,
        campaign_id: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT player_id FROM tracking_events \
             WHERE campaign_id = ? AND event_type = 'registration' \
             ORDER BY time_ms DESC LIMIT 1",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|r| r.get("player_id")))
    }

    /// Count events of a type, optionally scoped to one owner, in a window.
    pub async fn count_events(
        &self,
        owner: Option<(OwnerType, &str)>,
        event_type: EventType,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = if let Some((owner_type, owner_id)) = owner {
            sqlx::query_as(
                "SELECT COUNT(*) FROM tracking_events \
                 WHERE owner_type = ? AND owner_id = ? AND event_type = ? \
                   AND time_ms >= ? AND time_ms <= ?",
            )
            .bind(owner_type.as_str())
            .bind(owner_id)
            .bind(event_type.as_str())
            .bind(from_ms)
            .bind(to_ms)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT COUNT(*) FROM tracking_events \
                 WHERE event_type = ? AND time_ms >= ? AND time_ms <= ?",
            )
            .bind(event_type.as_str())
            .bind(from_ms)
            .bind(to_ms)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(row.0)
    }

    /// Deposit count and summed amount, optionally scoped to one owner.
    pub async fn deposit_totals(
        &self,
        owner: Option<(OwnerType, &str)>,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<(i64, Decimal), sqlx::Error> {
        let rows = if let Some((owner_type, owner_id)) = owner {
            sqlx::query(
                "SELECT amount FROM tracking_events \
                 WHERE owner_type = ? AND owner_id = ? AND event_type = 'deposit' \
                   AND time_ms >= ? AND time_ms <= ?",
            )
            .bind(owner_type.as_str())
            .bind(owner_id)
            .bind(from_ms)
            .bind(to_ms)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT amount FROM tracking_events \
                 WHERE event_type = 'deposit' AND time_ms >= ? AND time_ms <= ?",
            )
            .bind(from_ms)
            .bind(to_ms)
            .fetch_all(&self.pool)
            .await?
        };

        let mut total = Decimal::zero();
        for row in &rows {
            let amount: Option<String> = row.get("amount");
            if let Some(a) = amount.and_then(|s| Decimal::from_str(&s).ok()) {
                total = total + a;
            }
        }

        Ok((rows.len() as i64, total))
    }

    // ---- commission ledger ----

    pub async fn get_ledger(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
        period: Granularity,
        period_key: &str,
    ) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT * FROM commission_ledger \
             WHERE owner_type = ? AND owner_id = ? AND period = ? AND period_key = ?",
        )
        .bind(owner_type.as_str())
        .bind(owner_id)
        .bind(period.as_str())
        .bind(period_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ledger_from_row(&r)))
    }

    /// Fetch a ledger row inside an open transaction.
    pub async fn get_ledger_tx(
        conn: &mut SqliteConnection,
        owner_type: OwnerType,
        owner_id: &str,
        period: Granularity,
        period_key: &str,
    ) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT * FROM commission_ledger \
             WHERE owner_type = ? AND owner_id = ? AND period = ? AND period_key = ?",
        )
        .bind(owner_type.as_str())
        .bind(owner_id)
        .bind(period.as_str())
        .bind(period_key)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|r| ledger_from_row(&r)))
    }

    /// Upsert a ledger row on its composite key inside an open transaction.
    ///
    /// Re-settling the same owner+period updates the existing row in place;
    /// `created_ms` is preserved on update.
    pub async fn upsert_ledger_tx(
        conn: &mut SqliteConnection,
        entry: &LedgerEntry,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO commission_ledger (
                id, owner_type, owner_id, period, period_key,
                gross, adjustments, commission, currency, created_ms, updated_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_type, owner_id, period, period_key) DO UPDATE SET
                gross = excluded.gross,
                adjustments = excluded.adjustments,
                commission = excluded.commission,
                updated_ms = excluded.updated_ms
            "#,
        )
        .bind(&entry.id)
        .bind(entry.owner_type.as_str())
        .bind(&entry.owner_id)
        .bind(entry.period.as_str())
        .bind(&entry.period_key)
        .bind(entry.gross.to_canonical_string())
        .bind(entry.adjustments.to_canonical_string())
        .bind(entry.commission.to_canonical_string())
        .bind(&entry.currency)
        .bind(entry.created_ms.as_ms())
        .bind(entry.updated_ms.as_ms())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Ledger rows for an owner at a granularity, ordered by period key.
    pub async fn query_ledger(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
        period: Granularity,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM commission_ledger \
             WHERE owner_type = ? AND owner_id = ? AND period = ? \
               AND created_ms >= ? AND created_ms <= ? \
             ORDER BY period_key ASC",
        )
        .bind(owner_type.as_str())
        .bind(owner_id)
        .bind(period.as_str())
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(ledger_from_row).collect())
    }

    /// Summed commission across ledger rows, optionally scoped to an owner.
    pub async fn sum_commissions(
        &self,
        owner: Option<(OwnerType, &str)>,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Decimal, sqlx::Error> {
        let rows = if let Some((owner_type, owner_id)) = owner {
            sqlx::query(
                "SELECT commission FROM commission_ledger \
                 WHERE owner_type = ? AND owner_id = ? \
                   AND created_ms >= ? AND created_ms <= ?",
            )
            .bind(owner_type.as_str())
            .bind(owner_id)
            .bind(from_ms)
            .bind(to_ms)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT commission FROM commission_ledger \
                 WHERE created_ms >= ? AND created_ms <= ?",
            )
            .bind(from_ms)
            .bind(to_ms)
            .fetch_all(&self.pool)
            .await?
        };

        let mut total = Decimal::zero();
        for row in &rows {
            let commission: String = row.get("commission");
            total = total + Decimal::from_str(&commission).unwrap_or_default();
        }

        Ok(total)
    }

    // ---- withdrawals ----

    /// Insert a withdrawal row inside an open transaction.
    pub async fn insert_withdrawal_tx(
        conn: &mut SqliteConnection,
        withdrawal: &Withdrawal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO withdrawals (
                id, owner_type, owner_id, amount, currency, method,
                status, reference, created_ms, updated_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&withdrawal.id)
        .bind(withdrawal.owner_type.as_str())
        .bind(&withdrawal.owner_id)
        .bind(withdrawal.amount.to_canonical_string())
        .bind(&withdrawal.currency)
        .bind(&withdrawal.method)
        .bind(withdrawal.status.as_str())
        .bind(&withdrawal.reference)
        .bind(withdrawal.created_ms.as_ms())
        .bind(withdrawal.updated_ms.as_ms())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get_withdrawal(&self, id: &str) -> Result<Option<Withdrawal>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM withdrawals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| withdrawal_from_row(&r)))
    }

    /// Fetch a withdrawal inside an open transaction.
    pub async fn get_withdrawal_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Option<Withdrawal>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM withdrawals WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(|r| withdrawal_from_row(&r)))
    }

    /// Set withdrawal status inside an open transaction. A `None` reference
    /// leaves any existing reference untouched.
    pub async fn set_withdrawal_status_tx(
        conn: &mut SqliteConnection,
        id: &str,
        status: WithdrawalStatus,
        reference: Option<&str>,
        updated_ms: TimeMs,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE withdrawals \
             SET status = ?, reference = COALESCE(?, reference), updated_ms = ? \
             WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(reference)
        .bind(updated_ms.as_ms())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Withdrawal history for an owner, newest first.
    pub async fn list_withdrawals(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Withdrawal>, sqlx::Error> {
        let rows = if let Some(status) = status {
            sqlx::query(
                "SELECT * FROM withdrawals \
                 WHERE owner_type = ? AND owner_id = ? AND status = ? \
                 ORDER BY created_ms DESC, id DESC LIMIT ? OFFSET ?",
            )
            .bind(owner_type.as_str())
            .bind(owner_id)
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT * FROM withdrawals \
                 WHERE owner_type = ? AND owner_id = ? \
                 ORDER BY created_ms DESC, id DESC LIMIT ? OFFSET ?",
            )
            .bind(owner_type.as_str())
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows.iter().map(withdrawal_from_row).collect())
    }

    pub async fn count_withdrawals(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
        status: Option<WithdrawalStatus>,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = if let Some(status) = status {
            sqlx::query_as(
                "SELECT COUNT(*) FROM withdrawals \
                 WHERE owner_type = ? AND owner_id = ? AND status = ?",
            )
            .bind(owner_type.as_str())
            .bind(owner_id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM withdrawals WHERE owner_type = ? AND owner_id = ?")
                .bind(owner_type.as_str())
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?
        };

        Ok(row.0)
    }
}

// ---- row mapping ----

fn decimal_col(row: &SqliteRow, col: &str) -> Decimal {
    let s: String = row.get(col);
    Decimal::from_str(&s).unwrap_or_default()
}

fn owner_from_row(row: &SqliteRow) -> Owner {
    let owner_type: String = row.get("owner_type");
    Owner {
        id: row.get("id"),
        // CHECK constraint keeps the column in-domain; fall back defensively
        owner_type: OwnerType::from_str(&owner_type).unwrap_or(OwnerType::Agent),
        code: row.get("code"),
        name: row.get("name"),
        contact: row.get("contact"),
        wallet_balance: decimal_col(row, "wallet_balance"),
        withdrawable_balance: decimal_col(row, "withdrawable_balance"),
        created_ms: TimeMs::new(row.get("created_ms")),
    }
}

fn player_from_row(row: &SqliteRow) -> Player {
    Player {
        id: row.get("id"),
        username: row.get("username"),
        agent_id: row.get("agent_id"),
        status: row.get("status"),
        country: row.get("country"),
        total_deposits: decimal_col(row, "total_deposits"),
        total_losses: decimal_col(row, "total_losses"),
        created_ms: TimeMs::new(row.get("created_ms")),
    }
}

fn campaign_from_row(row: &SqliteRow) -> Campaign {
    let owner_type: String = row.get("owner_type");
    let status: String = row.get("status");
    Campaign {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        owner_type: OwnerType::from_str(&owner_type).unwrap_or(OwnerType::Affiliate),
        owner_id: row.get("owner_id"),
        landing_url: row.get("landing_url"),
        status: CampaignStatus::from_str(&status).unwrap_or(CampaignStatus::Paused),
        created_ms: TimeMs::new(row.get("created_ms")),
    }
}

fn ledger_from_row(row: &SqliteRow) -> LedgerEntry {
    let owner_type: String = row.get("owner_type");
    let period: String = row.get("period");
    LedgerEntry {
        id: row.get("id"),
        owner_type: OwnerType::from_str(&owner_type).unwrap_or(OwnerType::Agent),
        owner_id: row.get("owner_id"),
        period: Granularity::from_str(&period).unwrap_or(Granularity::Daily),
        period_key: row.get("period_key"),
        gross: decimal_col(row, "gross"),
        adjustments: decimal_col(row, "adjustments"),
        commission: decimal_col(row, "commission"),
        currency: row.get("currency"),
        created_ms: TimeMs::new(row.get("created_ms")),
        updated_ms: TimeMs::new(row.get("updated_ms")),
    }
}

fn withdrawal_from_row(row: &SqliteRow) -> Withdrawal {
    let owner_type: String = row.get("owner_type");
    let status: String = row.get("status");
    Withdrawal {
        id: row.get("id"),
        owner_type: OwnerType::from_str(&owner_type).unwrap_or(OwnerType::Agent),
        owner_id: row.get("owner_id"),
        amount: decimal_col(row, "amount"),
        currency: row.get("currency"),
        method: row.get("method"),
        status: WithdrawalStatus::from_str(&status).unwrap_or(WithdrawalStatus::Pending),
        reference: row.get("reference"),
        created_ms: TimeMs::new(row.get("created_ms")),
        updated_ms: TimeMs::new(row.get("updated_ms")),
    }
}
