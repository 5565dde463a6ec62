//! Public tracking endpoints: the thin ingestion layer in front of the
//! settlement engine.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{CampaignStatus, Decimal, EventType, OwnerType, Player, TimeMs, TrackingEvent};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub campaign_code: String,
    pub username: String,
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositBody {
    pub campaign_code: String,
    pub player_id: Option<String>,
    pub amount: Decimal,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub success: bool,
    pub is_ftd: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossBody {
    pub player_id: String,
    pub amount: Decimal,
    pub currency: Option<String>,
}

fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let ua = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    (ip, ua)
}

async fn active_campaign(
    state: &AppState,
    code: &str,
) -> Result<crate::domain::Campaign, AppError> {
    let campaign = state
        .repo
        .get_campaign_by_code(code)
        .await?
        .filter(|c| c.status == CampaignStatus::Active)
        .ok_or_else(|| AppError::NotFound("Campaign not found or inactive".into()))?;
    Ok(campaign)
}

pub async fn track_click(
    Path(campaign_code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TrackResponse>, AppError> {
    let campaign = active_campaign(&state, &campaign_code).await?;
    let (ip, ua) = client_meta(&headers);

    let event = TrackingEvent::new(
        EventType::Click,
        None,
        Some(campaign.id.clone()),
        campaign.owner_type,
        campaign.owner_id.clone(),
        None,
        None,
        ip,
        ua,
        TimeMs::now(),
    );
    state.repo.insert_event(&event).await?;

    Ok(Json(TrackResponse { success: true }))
}

pub async fn track_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> Result<Json<RegisterResponse>, AppError> {
    if body.username.trim().is_empty() {
        return Err(AppError::BadRequest("username must not be empty".into()));
    }

    let campaign = active_campaign(&state, &body.campaign_code).await?;

    if state
        .repo
        .get_player_by_username(&body.username)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Username already exists".into()));
    }

    // Agent campaigns bind the player to the agent at registration time
    let agent_id = match campaign.owner_type {
        OwnerType::Agent => Some(campaign.owner_id.clone()),
        OwnerType::Affiliate => None,
    };
    let player = Player::new(body.username, agent_id, body.country, TimeMs::now());
    state.repo.insert_player(&player).await?;

    let (ip, ua) = client_meta(&headers);
    let event = TrackingEvent::new(
        EventType::Registration,
        Some(player.id.clone()),
        Some(campaign.id.clone()),
        campaign.owner_type,
        campaign.owner_id.clone(),
        None,
        None,
        ip,
        ua,
        TimeMs::now(),
    );
    state.repo.insert_event(&event).await?;

    Ok(Json(RegisterResponse {
        success: true,
        player_id: player.id,
    }))
}

pub async fn track_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DepositBody>,
) -> Result<Json<DepositResponse>, AppError> {
    if !body.amount.is_positive() {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }

    let campaign = active_campaign(&state, &body.campaign_code).await?;
    let currency = body.currency.unwrap_or_else(|| "USD".to_string());
    let (ip, ua) = client_meta(&headers);
    let now = TimeMs::now();

    // Fall back to the campaign's most recent registration when the
    // deposit arrives without a player reference.
    let player_id = match body.player_id {
        Some(id) => Some(id),
        None => state.repo.latest_registered_player(&campaign.id).await?,
    };

    let is_ftd = match &player_id {
        Some(id) => !state.repo.has_ftd_event(id).await?,
        None => true,
    };

    if let Some(id) = &player_id {
        state.repo.add_player_deposit(id, body.amount).await?;
    }

    let event = TrackingEvent::new(
        EventType::Deposit,
        player_id.clone(),
        Some(campaign.id.clone()),
        campaign.owner_type,
        campaign.owner_id.clone(),
        Some(body.amount),
        Some(currency.clone()),
        ip.clone(),
        ua.clone(),
        now,
    );
    state.repo.insert_event(&event).await?;

    if is_ftd {
        if let Some(id) = &player_id {
            let ftd_event = TrackingEvent::new(
                EventType::Ftd,
                Some(id.clone()),
                Some(campaign.id.clone()),
                campaign.owner_type,
                campaign.owner_id.clone(),
                Some(body.amount),
                Some(currency),
                ip,
                ua,
                now,
            );
            state.repo.insert_event(&ftd_event).await?;

            if campaign.owner_type == OwnerType::Affiliate {
                state
                    .settlement
                    .settle_affiliate(&campaign.owner_id, EventType::Ftd, body.amount, now)
                    .await?;
            }
        }
    }

    // Always offered to the engine; the calculator zeroes it unless the
    // REVSHARE model is active.
    if campaign.owner_type == OwnerType::Affiliate {
        state
            .settlement
            .settle_affiliate(&campaign.owner_id, EventType::Deposit, body.amount, now)
            .await?;
    }

    Ok(Json(DepositResponse {
        success: true,
        is_ftd,
    }))
}

pub async fn track_loss(
    State(state): State<AppState>,
    Json(body): Json<LossBody>,
) -> Result<Json<TrackResponse>, AppError> {
    if !body.amount.is_positive() {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }

    let player = state
        .repo
        .get_player(&body.player_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player not found".into()))?;

    let agent_id = player
        .agent_id
        .clone()
        .ok_or_else(|| AppError::BadRequest("Player is not assigned to an agent".into()))?;

    let now = TimeMs::now();
    state.repo.add_player_loss(&player.id, body.amount).await?;

    let event = TrackingEvent::new(
        EventType::Loss,
        Some(player.id.clone()),
        None,
        OwnerType::Agent,
        agent_id.clone(),
        Some(body.amount),
        Some(body.currency.unwrap_or_else(|| "USD".to_string())),
        None,
        None,
        now,
    );
    state.repo.insert_event(&event).await?;

    state
        .settlement
        .settle_agent_loss(&agent_id, &player.id, body.amount, now)
        .await?;

    Ok(Json(TrackResponse { success: true }))
}
