//! Reporting endpoints over tracking events and ledger rows.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{EventType, Granularity, LedgerEntry, OwnerType};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsQuery {
    pub granularity: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResponse {
    pub data: Vec<EarningDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningDto {
    pub period: String,
    pub gross: String,
    pub adjustments: String,
    pub commission: String,
    pub currency: String,
}

impl From<LedgerEntry> for EarningDto {
    fn from(e: LedgerEntry) -> Self {
        EarningDto {
            period: e.period_key,
            gross: e.gross.to_canonical_string(),
            adjustments: e.adjustments.to_canonical_string(),
            commission: e.commission.to_canonical_string(),
            currency: e.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    pub owner_type: Option<String>,
    pub owner_id: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub total_clicks: i64,
    pub total_registrations: i64,
    pub total_deposits: i64,
    pub total_deposit_amount: String,
    pub total_commissions: String,
}

fn window(from_ms: Option<i64>, to_ms: Option<i64>) -> Result<(i64, i64), AppError> {
    let from = from_ms.unwrap_or(0);
    let to = to_ms.unwrap_or(i64::MAX);
    if from > to {
        return Err(AppError::BadRequest("fromMs must be <= toMs".into()));
    }
    Ok((from, to))
}

/// Ledger rows for one owner at a granularity.
///
/// Settlement only writes daily rows; weekly/monthly queries return
/// whatever an external rollup may have produced.
pub async fn get_earnings(
    Path((owner_type, owner_id)): Path<(String, String)>,
    Query(params): Query<EarningsQuery>,
    State(state): State<AppState>,
) -> Result<Json<EarningsResponse>, AppError> {
    let owner_type =
        OwnerType::from_str(&owner_type).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let granularity = params
        .granularity
        .as_deref()
        .map(Granularity::from_str)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .unwrap_or(Granularity::Daily);
    let (from, to) = window(params.from_ms, params.to_ms)?;

    let entries = state
        .repo
        .query_ledger(owner_type, &owner_id, granularity, from, to)
        .await?;

    Ok(Json(EarningsResponse {
        data: entries.into_iter().map(EarningDto::from).collect(),
    }))
}

/// Funnel and revenue overview, optionally scoped to one owner.
pub async fn get_overview(
    Query(params): Query<OverviewQuery>,
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, AppError> {
    let owner_type = params
        .owner_type
        .as_deref()
        .map(OwnerType::from_str)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let owner = match (owner_type, params.owner_id.as_deref()) {
        (Some(ot), Some(id)) => Some((ot, id)),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "ownerType and ownerId must be supplied together".into(),
            ))
        }
    };
    let (from, to) = window(params.from_ms, params.to_ms)?;

    let clicks = state
        .repo
        .count_events(owner, EventType::Click, from, to)
        .await?;
    let registrations = state
        .repo
        .count_events(owner, EventType::Registration, from, to)
        .await?;
    let (deposit_count, deposit_amount) = state.repo.deposit_totals(owner, from, to).await?;
    let commissions = state.repo.sum_commissions(owner, from, to).await?;

    Ok(Json(OverviewResponse {
        total_clicks: clicks,
        total_registrations: registrations,
        total_deposits: deposit_count,
        total_deposit_amount: deposit_amount.to_canonical_string(),
        total_commissions: commissions.to_canonical_string(),
    }))
}
