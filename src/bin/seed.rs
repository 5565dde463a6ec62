//! Demo-data seeder: provisions owners, campaigns and players, then replays
//! a month of deterministic traffic through the real engines.
//!
//! Usage: `DATABASE_PATH=refgrid.db cargo run --bin seed`

use anyhow::{Context, Result};
use refgrid::engine::SettlementEngine;
use refgrid::{
    init_db, Campaign, Config, Decimal, EventType, Owner, OwnerType, Player, Repository, TimeMs,
    TrackingEvent,
};
use std::str::FromStr;
use std::sync::Arc;

const DAY_MS: i64 = 86_400_000;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    let pool = init_db(&config.database_path)
        .await
        .context("database init failed")?;
    let repo = Arc::new(Repository::new(pool));
    let settlement = SettlementEngine::new(repo.clone(), config.commission);

    println!("Seeding database at {}...", config.database_path);
    reset(&repo).await?;

    let now = TimeMs::now();
    let start = TimeMs::new(now.as_ms() - 30 * DAY_MS);

    // Owners
    let mut agents = Vec::new();
    for (code, name) in [("AGT001", "Agent One"), ("AGT002", "Agent Two")] {
        let owner = Owner::new(
            OwnerType::Agent,
            code.to_string(),
            name.to_string(),
            Some(format!("{}@example.com", code.to_lowercase())),
            start,
        );
        repo.insert_owner(&owner).await?;
        agents.push(owner);
    }

    let mut affiliates = Vec::new();
    for (code, name) in [("AFF001", "Affiliate One"), ("AFF002", "Affiliate Two")] {
        let owner = Owner::new(
            OwnerType::Affiliate,
            code.to_string(),
            name.to_string(),
            Some(format!("{}@example.com", code.to_lowercase())),
            start,
        );
        repo.insert_owner(&owner).await?;
        affiliates.push(owner);
    }
    println!("Created {} agents, {} affiliates", agents.len(), affiliates.len());

    // One campaign per owner
    let mut campaigns = Vec::new();
    for owner in agents.iter().chain(affiliates.iter()) {
        let campaign = Campaign::new(
            format!("{}MAIN", owner.code),
            format!("{} main campaign", owner.name),
            owner.owner_type,
            owner.id.clone(),
            Some("https://play.example.com".to_string()),
            start,
        );
        repo.insert_campaign(&campaign).await?;
        campaigns.push(campaign);
    }

    // Players: odd indexes belong to agents, even ones came via affiliates
    let mut players = Vec::new();
    for i in 0..12 {
        let agent_id = if i % 2 == 1 {
            Some(agents[i % agents.len()].id.clone())
        } else {
            None
        };
        let player = Player::new(format!("player{:02}", i), agent_id, None, start);
        repo.insert_player(&player).await?;
        players.push(player);
    }
    println!("Created {} players", players.len());

    let mut clicks = 0u32;
    let mut deposits = 0u32;
    let mut losses = 0u32;

    for day in 0..30i64 {
        let date = TimeMs::new(start.as_ms() + day * DAY_MS + 12 * 3_600_000);

        // Clicks spread across all campaigns
        for (i, campaign) in campaigns.iter().enumerate() {
            for n in 0..(3 + (day as usize + i) % 4) {
                let event = TrackingEvent::new(
                    EventType::Click,
                    None,
                    Some(campaign.id.clone()),
                    campaign.owner_type,
                    campaign.owner_id.clone(),
                    None,
                    None,
                    Some(format!("192.168.1.{}", (day as usize + n) % 255)),
                    Some("Mozilla/5.0".to_string()),
                    TimeMs::new(date.as_ms() + n as i64 * 60_000),
                );
                repo.insert_event(&event).await?;
                clicks += 1;
            }
        }

        // Affiliate deposits, every third one a first deposit
        let affiliate_campaigns: Vec<_> = campaigns
            .iter()
            .filter(|c| c.owner_type == OwnerType::Affiliate)
            .collect();
        for (i, campaign) in affiliate_campaigns.iter().enumerate() {
            let player = &players[(day as usize + i * 2) % players.len()];
            let amount = Decimal::from_str(&format!("{}", 50 + (day % 5) * 25))?;

            let is_ftd = !repo.has_ftd_event(&player.id).await?;
            repo.add_player_deposit(&player.id, amount).await?;
            let event = TrackingEvent::new(
                EventType::Deposit,
                Some(player.id.clone()),
                Some(campaign.id.clone()),
                campaign.owner_type,
                campaign.owner_id.clone(),
                Some(amount),
                Some("USD".to_string()),
                None,
                None,
                date,
            );
            repo.insert_event(&event).await?;
            deposits += 1;

            if is_ftd {
                let ftd = TrackingEvent::new(
                    EventType::Ftd,
                    Some(player.id.clone()),
                    Some(campaign.id.clone()),
                    campaign.owner_type,
                    campaign.owner_id.clone(),
                    Some(amount),
                    Some("USD".to_string()),
                    None,
                    None,
                    date,
                );
                repo.insert_event(&ftd).await?;
                settlement
                    .settle_affiliate(&campaign.owner_id, EventType::Ftd, amount, date)
                    .await?;
            }
            settlement
                .settle_affiliate(&campaign.owner_id, EventType::Deposit, amount, date)
                .await?;
        }

        // Agent players lose money
        for player in players.iter().filter(|p| p.agent_id.is_some()) {
            let Some(agent_id) = &player.agent_id else {
                continue;
            };
            let amount = Decimal::from_str(&format!("{}", 10 + (day % 9) * 10))?;
            repo.add_player_loss(&player.id, amount).await?;
            let event = TrackingEvent::new(
                EventType::Loss,
                Some(player.id.clone()),
                None,
                OwnerType::Agent,
                agent_id.clone(),
                Some(amount),
                Some("USD".to_string()),
                None,
                None,
                date,
            );
            repo.insert_event(&event).await?;
            settlement
                .settle_agent_loss(agent_id, &player.id, amount, date)
                .await?;
            losses += 1;
        }
    }

    println!(
        "Generated {} clicks, {} deposits, {} losses over 30 days",
        clicks, deposits, losses
    );
    println!("Seeding complete");
    Ok(())
}

/// Wipe all rows; the schema is idempotent so tables already exist.
async fn reset(repo: &Repository) -> Result<()> {
    for table in [
        "withdrawals",
        "commission_ledger",
        "tracking_events",
        "campaigns",
        "players",
        "owners",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(repo.pool())
            .await?;
    }
    Ok(())
}
