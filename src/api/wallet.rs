//! Wallet balance and withdrawal endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{Decimal, OwnerType, Withdrawal, WithdrawalStatus};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub wallet_balance: String,
    pub withdrawable_balance: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalDto {
    pub id: String,
    pub owner_type: OwnerType,
    pub owner_id: String,
    pub amount: String,
    pub currency: String,
    pub method: String,
    pub status: WithdrawalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub created_ms: i64,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(w: Withdrawal) -> Self {
        WithdrawalDto {
            id: w.id,
            owner_type: w.owner_type,
            owner_id: w.owner_id,
            amount: w.amount.to_canonical_string(),
            currency: w.currency,
            method: w.method,
            status: w.status,
            reference: w.reference,
            created_ms: w.created_ms.as_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithdrawalBody {
    pub amount: Decimal,
    pub method: String,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalsResponse {
    pub data: Vec<WithdrawalDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionBody {
    pub status: String,
    pub reference: Option<String>,
}

fn parse_owner_type(raw: &str) -> Result<OwnerType, AppError> {
    OwnerType::from_str(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

pub async fn get_balance(
    Path((owner_type, owner_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, AppError> {
    let owner_type = parse_owner_type(&owner_type)?;
    let (wallet, withdrawable) = state.wallet.get_balance(owner_type, &owner_id).await?;

    Ok(Json(BalanceResponse {
        wallet_balance: wallet.to_canonical_string(),
        withdrawable_balance: withdrawable.to_canonical_string(),
    }))
}

pub async fn create_withdrawal(
    Path((owner_type, owner_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(body): Json<CreateWithdrawalBody>,
) -> Result<Json<WithdrawalDto>, AppError> {
    let owner_type = parse_owner_type(&owner_type)?;
    if body.method.trim().is_empty() {
        return Err(AppError::BadRequest("method must not be empty".into()));
    }

    let withdrawal = state
        .wallet
        .create_withdrawal(
            owner_type,
            &owner_id,
            body.amount,
            body.method,
            body.currency.unwrap_or_else(|| "USD".to_string()),
        )
        .await?;

    Ok(Json(withdrawal.into()))
}

pub async fn list_withdrawals(
    Path((owner_type, owner_id)): Path<(String, String)>,
    Query(params): Query<WithdrawalsQuery>,
    State(state): State<AppState>,
) -> Result<Json<WithdrawalsResponse>, AppError> {
    let owner_type = parse_owner_type(&owner_type)?;

    let status = params
        .status
        .as_deref()
        .map(WithdrawalStatus::from_str)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let withdrawals = state
        .repo
        .list_withdrawals(owner_type, &owner_id, status, limit, offset)
        .await?;
    let total = state
        .repo
        .count_withdrawals(owner_type, &owner_id, status)
        .await?;

    Ok(Json(WithdrawalsResponse {
        data: withdrawals.into_iter().map(WithdrawalDto::from).collect(),
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        },
    }))
}

pub async fn transition_withdrawal(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<WithdrawalDto>, AppError> {
    let status = WithdrawalStatus::from_str(&body.status)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let withdrawal = state
        .wallet
        .transition_withdrawal(&id, status, body.reference)
        .await?;

    Ok(Json(withdrawal.into()))
}
