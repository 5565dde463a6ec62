//! Referral link (campaign) creation.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{Campaign, OwnerType, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignBody {
    pub name: String,
    pub owner_type: String,
    pub owner_id: String,
    pub landing_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDto {
    pub id: String,
    pub code: String,
    pub name: String,
    pub owner_type: OwnerType,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_url: Option<String>,
    pub status: String,
}

pub async fn create_campaign(
    State(state): State<AppState>,
    Json(body): Json<CreateCampaignBody>,
) -> Result<Json<CampaignDto>, AppError> {
    let owner_type =
        OwnerType::from_str(&body.owner_type).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let owner = state
        .repo
        .get_owner(owner_type, &body.owner_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("{} {} not found", owner_type, body.owner_id))
        })?;

    // Unique tracking code: owner code plus a random suffix
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    let code = format!("{}{}", owner.code, suffix);

    let campaign = Campaign::new(
        code,
        body.name,
        owner_type,
        owner.id,
        body.landing_url,
        TimeMs::now(),
    );
    state.repo.insert_campaign(&campaign).await?;

    tracing::info!(
        campaign_id = %campaign.id,
        code = %campaign.code,
        owner_type = owner_type.as_str(),
        "campaign created"
    );

    Ok(Json(CampaignDto {
        id: campaign.id,
        code: campaign.code,
        name: campaign.name,
        owner_type: campaign.owner_type,
        owner_id: campaign.owner_id,
        landing_url: campaign.landing_url,
        status: campaign.status.as_str().to_string(),
    }))
}
