use axum::http::StatusCode;
use refgrid::api;
use refgrid::config::{CommissionConfig, CommissionModel};
use refgrid::db::init_db;
use refgrid::engine::{SettlementEngine, WalletEngine};
use refgrid::{Decimal, Owner, OwnerType, Repository, TimeMs};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let commission = CommissionConfig {
        affiliate_model: CommissionModel::Cpa,
        affiliate_cpa_ftd: Decimal::from_str("30").unwrap(),
        affiliate_revshare_pct: Decimal::from_str("0.2").unwrap(),
        agent_revshare_pct: Decimal::from_str("0.1").unwrap(),
    };
    let settlement = Arc::new(SettlementEngine::new(repo.clone(), commission));
    let wallet = Arc::new(WalletEngine::new(repo.clone()));
    let app = api::create_router(api::AppState::new(repo.clone(), settlement, wallet));

    TestApp {
        app,
        repo,
        _temp: temp_dir,
    }
}

/// Insert an affiliate with wallet 100 / withdrawable 60.
async fn insert_funded_owner(repo: &Repository) -> Owner {
    let owner = Owner::new(
        OwnerType::Affiliate,
        "AFF001".to_string(),
        "Affiliate One".to_string(),
        None,
        TimeMs::new(0),
    );
    repo.insert_owner(&owner).await.unwrap();

    let mut tx = repo.pool().begin().await.unwrap();
    Repository::set_owner_balances_tx(
        &mut tx,
        owner.owner_type,
        &owner.id,
        Decimal::from_str("100").unwrap(),
        Decimal::from_str("60").unwrap(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    owner
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_balance_endpoint() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    let (status, json) = request(
        test_app.app,
        "GET",
        &format!("/v1/owners/affiliate/{}/balance", owner.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["walletBalance"], "100");
    assert_eq!(json["withdrawableBalance"], "60");
}

#[tokio::test]
async fn test_balance_unknown_owner_is_404() {
    let test_app = setup_test_app().await;
    let (status, _) = request(
        test_app.app,
        "GET",
        "/v1/owners/affiliate/ghost/balance",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_balance_invalid_owner_type_is_400() {
    let test_app = setup_test_app().await;
    let (status, _) = request(test_app.app, "GET", "/v1/owners/admin/x/balance", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_withdrawal_locks_funds() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
        Some(serde_json::json!({"amount": 25.0, "method": "bank"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["amount"], "25");
    assert_eq!(json["currency"], "USD");

    let (_s, balance) = request(
        test_app.app,
        "GET",
        &format!("/v1/owners/affiliate/{}/balance", owner.id),
        None,
    )
    .await;
    assert_eq!(balance["walletBalance"], "100");
    assert_eq!(balance["withdrawableBalance"], "35");
}

#[tokio::test]
async fn test_insufficient_balance_is_400_and_leaves_no_trace() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    // 75 > 60 withdrawable
    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
        Some(serde_json::json!({"amount": 75.0, "method": "bank"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap_or_default()
        .to_lowercase()
        .contains("insufficient"));

    let (_s, balance) = request(
        test_app.app.clone(),
        "GET",
        &format!("/v1/owners/affiliate/{}/balance", owner.id),
        None,
    )
    .await;
    assert_eq!(balance["withdrawableBalance"], "60");

    let (_s, list) = request(
        test_app.app,
        "GET",
        &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
        None,
    )
    .await;
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_reject_restores_withdrawable() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    let (_s, created) = request(
        test_app.app.clone(),
        "POST",
        &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
        Some(serde_json::json!({"amount": 25.0, "method": "bank"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = request(
        test_app.app.clone(),
        "PATCH",
        &format!("/v1/withdrawals/{}", id),
        Some(serde_json::json!({"status": "rejected"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "rejected");

    let (_s, balance) = request(
        test_app.app,
        "GET",
        &format!("/v1/owners/affiliate/{}/balance", owner.id),
        None,
    )
    .await;
    assert_eq!(balance["walletBalance"], "100");
    assert_eq!(balance["withdrawableBalance"], "60");
}

#[tokio::test]
async fn test_approve_then_pay_full_lifecycle() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    let (_s, created) = request(
        test_app.app.clone(),
        "POST",
        &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
        Some(serde_json::json!({"amount": 25.0, "method": "bank"})),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (_s, approved) = request(
        test_app.app.clone(),
        "PATCH",
        &format!("/v1/withdrawals/{}", id),
        Some(serde_json::json!({"status": "approved", "reference": "REF-7"})),
    )
    .await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["reference"], "REF-7");

    // Approval has no balance effect beyond the creation lock
    let (_s, balance) = request(
        test_app.app.clone(),
        "GET",
        &format!("/v1/owners/affiliate/{}/balance", owner.id),
        None,
    )
    .await;
    assert_eq!(balance["walletBalance"], "100");
    assert_eq!(balance["withdrawableBalance"], "35");

    let (_s, paid) = request(
        test_app.app.clone(),
        "PATCH",
        &format!("/v1/withdrawals/{}", id),
        Some(serde_json::json!({"status": "paid"})),
    )
    .await;
    assert_eq!(paid["status"], "paid");
    // Reference from approval survives the paid transition
    assert_eq!(paid["reference"], "REF-7");

    // Both balances net down by exactly the amount, each once
    let (_s, balance) = request(
        test_app.app,
        "GET",
        &format!("/v1/owners/affiliate/{}/balance", owner.id),
        None,
    )
    .await;
    assert_eq!(balance["walletBalance"], "75");
    assert_eq!(balance["withdrawableBalance"], "35");
}

#[tokio::test]
async fn test_transition_unknown_withdrawal_is_404() {
    let test_app = setup_test_app().await;
    let (status, _) = request(
        test_app.app,
        "PATCH",
        "/v1/withdrawals/ghost",
        Some(serde_json::json!({"status": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transition_invalid_status_is_400() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    let (_s, created) = request(
        test_app.app.clone(),
        "POST",
        &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
        Some(serde_json::json!({"amount": 10.0, "method": "bank"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    for status_value in ["cancelled", "pending"] {
        let (status, _) = request(
            test_app.app.clone(),
            "PATCH",
            &format!("/v1/withdrawals/{}", id),
            Some(serde_json::json!({"status": status_value})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "status {}", status_value);
    }
}

#[tokio::test]
async fn test_list_withdrawals_paginates_newest_first() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    for amount in [5.0, 10.0, 15.0] {
        let (status, _) = request(
            test_app.app.clone(),
            "POST",
            &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
            Some(serde_json::json!({"amount": amount, "method": "bank"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_s, page1) = request(
        test_app.app.clone(),
        "GET",
        &format!(
            "/v1/owners/affiliate/{}/withdrawals?page=1&limit=2",
            owner.id
        ),
        None,
    )
    .await;
    assert_eq!(page1["data"].as_array().unwrap().len(), 2);
    assert_eq!(page1["pagination"]["total"], 3);
    assert_eq!(page1["pagination"]["totalPages"], 2);

    let (_s, page2) = request(
        test_app.app.clone(),
        "GET",
        &format!(
            "/v1/owners/affiliate/{}/withdrawals?page=2&limit=2",
            owner.id
        ),
        None,
    )
    .await;
    assert_eq!(page2["data"].as_array().unwrap().len(), 1);

    // Status filter
    let (_s, pending) = request(
        test_app.app,
        "GET",
        &format!(
            "/v1/owners/affiliate/{}/withdrawals?status=pending",
            owner.id
        ),
        None,
    )
    .await;
    assert_eq!(pending["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_create_withdrawal_rejects_bad_amounts() {
    let test_app = setup_test_app().await;
    let owner = insert_funded_owner(&test_app.repo).await;

    for amount in [0.0, -5.0] {
        let (status, _) = request(
            test_app.app.clone(),
            "POST",
            &format!("/v1/owners/affiliate/{}/withdrawals", owner.id),
            Some(serde_json::json!({"amount": amount, "method": "bank"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
