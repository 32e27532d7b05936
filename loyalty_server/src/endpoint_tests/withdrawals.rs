use actix_web::http::StatusCode;
use loyalty_engine::{
    db_types::Cents,
    reconciliation_queue,
    traits::{LedgerManagement, WithdrawalManagement},
    MemoryDatabase,
};
use super::helpers::{funded_account, get_request, json, memory_app, post_json};

const WITHDRAW: &str = "/api/user/balance/withdraw";
const WITHDRAWALS: &str = "/api/user/withdrawals";

#[actix_web::test]
async fn withdraw_part_of_balance() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let alice = funded_account(&db, "alice", 72950).await;
    let (queue, _receiver) = reconciliation_queue(1);
    let request = serde_json::json!({ "order": "2377225624", "sum": 100.25 });
    let (status, body) =
        post_json(Some("alice"), WITHDRAW, request, memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);
    let account = db.fetch_account(alice.id).await.unwrap().unwrap();
    assert_eq!(account.balance, Cents::from(62925));
}

#[actix_web::test]
async fn withdraw_and_list() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let alice = funded_account(&db, "alice", 100_000).await;
    let (queue, _receiver) = reconciliation_queue(1);
    let (status, body) =
        get_request(Some("alice"), WITHDRAWALS, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let request = serde_json::json!({ "order": "2377225624", "sum": 751.5 });
    let (status, _) =
        post_json(Some("alice"), WITHDRAW, request, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let account = db.fetch_account(alice.id).await.unwrap().unwrap();
    assert_eq!(account.balance, Cents::from(100_000 - 75_150));
    assert_eq!(db.fetch_withdrawn_sum_for_user(alice.id).await.unwrap(), Cents::from(75_150));

    let (status, body) =
        get_request(Some("alice"), WITHDRAWALS, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let history = json(&body);
    assert_eq!(history[0]["order"], "2377225624");
    assert_eq!(history[0]["sum"], 751.5);
    assert!(history[0]["processed_at"].is_string());

    let (status, body) =
        get_request(Some("alice"), "/api/user/balance", memory_app(db, queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let balance = json(&body);
    assert_eq!(balance["current"], 248.5);
    assert_eq!(balance["withdrawn"], 751.5);
}

#[actix_web::test]
async fn withdraw_more_than_balance() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let alice = funded_account(&db, "alice", 500).await;
    let (queue, _receiver) = reconciliation_queue(1);
    let request = serde_json::json!({ "order": "2377225624", "sum": 5.01 });
    let (status, body) =
        post_json(Some("alice"), WITHDRAW, request, memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(json(&body)["error"].as_str().unwrap().contains("Insufficient funds"));
    assert_eq!(db.fetch_account(alice.id).await.unwrap().unwrap().balance, Cents::from(500));
    assert!(db.fetch_withdrawals_for_user(alice.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn withdraw_entire_balance() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let alice = funded_account(&db, "alice", 500).await;
    let (queue, _receiver) = reconciliation_queue(1);
    let request = serde_json::json!({ "order": "2377225624", "sum": 5 });
    let (status, _) =
        post_json(Some("alice"), WITHDRAW, request, memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(db.fetch_account(alice.id).await.unwrap().unwrap().balance, Cents::from(0));
}

#[actix_web::test]
async fn withdraw_invalid_requests() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let alice = funded_account(&db, "alice", 500).await;
    let (queue, _receiver) = reconciliation_queue(1);
    let cases = [
        (serde_json::json!({ "order": "2377225624", "sum": 0 }), StatusCode::BAD_REQUEST),
        (serde_json::json!({ "order": "2377225625", "sum": 1 }), StatusCode::UNPROCESSABLE_ENTITY),
        (serde_json::json!({ "order": "2377225624", "sum": -1 }), StatusCode::UNPROCESSABLE_ENTITY),
        (serde_json::json!({ "order": "2377225624", "sum": 1.005 }), StatusCode::UNPROCESSABLE_ENTITY),
        (serde_json::json!({ "order": "2377225624" }), StatusCode::BAD_REQUEST),
    ];
    for (request, expected) in cases {
        let (status, body) = post_json(Some("alice"), WITHDRAW, request.clone(), memory_app(db.clone(), queue.clone()))
            .await
            .expect("Request failed");
        assert_eq!(status, expected, "{request} gave {body}");
    }
    let (status, _) = post_json(None, WITHDRAW, serde_json::json!({ "order": "2377225624", "sum": 1 }), memory_app(db.clone(), queue))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(db.fetch_account(alice.id).await.unwrap().unwrap().balance, Cents::from(500));
}
