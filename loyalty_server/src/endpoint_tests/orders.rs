use std::time::Duration;

use actix_web::http::StatusCode;
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType},
    reconciliation_queue,
    test_utils::{accrual::processed, valid_order_number, ScriptedAccrualService},
    traits::{LedgerManagement, OrderManagement},
    MemoryDatabase,
    RetryPolicy,
};

use super::helpers::{get_request, json, memory_app, post_text};
use crate::accrual_worker::start_accrual_worker;

const ORDERS: &str = "/api/user/orders";

#[actix_web::test]
async fn upload_without_login() {
    let _ = env_logger::try_init().ok();
    let (queue, _receiver) = reconciliation_queue(10);
    let (status, body) =
        post_text(None, ORDERS, "12345678903", memory_app(MemoryDatabase::new(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json(&body)["error"].as_str().unwrap().contains("X-Authenticated-User"));
}

#[actix_web::test]
async fn upload_new_order() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (queue, mut receiver) = reconciliation_queue(10);
    let (status, body) =
        post_text(Some("alice"), ORDERS, "12345678903", memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    let body = json(&body);
    assert_eq!(body["number"], "12345678903");
    assert_eq!(body["status"], "NEW");
    assert!(body.get("accrual").is_none());

    let order = db.fetch_order_by_number(&OrderNumber::new("12345678903")).await.unwrap().unwrap();
    let alice = db.fetch_account_by_login("alice").await.unwrap().unwrap();
    assert_eq!(order.user_id, alice.id);
    let task = receiver.try_recv().expect("The order was not queued");
    assert_eq!(task.order_number.as_str(), "12345678903");
}

#[actix_web::test]
async fn upload_twice() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (queue, _receiver) = reconciliation_queue(10);
    let number = valid_order_number(1001);
    let (status, _) =
        post_text(Some("alice"), ORDERS, &number, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    // Still waiting for the worker
    let (status, _) =
        post_text(Some("alice"), ORDERS, &number, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);

    db.update_order_status(&OrderNumber::new(number.clone()), OrderStatusType::Processing).await.unwrap();
    let (status, body) =
        post_text(Some("alice"), ORDERS, &number, memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "PROCESSING");
}

#[actix_web::test]
async fn upload_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (queue, _receiver) = reconciliation_queue(10);
    let number = valid_order_number(1002);
    let (status, _) =
        post_text(Some("alice"), ORDERS, &number, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, body) =
        post_text(Some("bob"), ORDERS, &number, memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json(&body)["error"].as_str().unwrap().contains(&number));
    let order = db.fetch_order_by_number(&OrderNumber::new(number)).await.unwrap().unwrap();
    let alice = db.fetch_account_by_login("alice").await.unwrap().unwrap();
    assert_eq!(order.user_id, alice.id);
}

#[actix_web::test]
async fn upload_bad_order_numbers() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (queue, _receiver) = reconciliation_queue(10);
    let (status, _) =
        post_text(Some("alice"), ORDERS, "", memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) =
        post_text(Some("alice"), ORDERS, "12345678901", memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) =
        post_text(Some("alice"), ORDERS, "1234abc", memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let alice = db.fetch_account_by_login("alice").await.unwrap().unwrap();
    assert!(db.fetch_orders_for_user(alice.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (queue, _receiver) = reconciliation_queue(10);
    let (status, body) =
        get_request(Some("alice"), ORDERS, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    for payload in [1001, 1002] {
        let number = valid_order_number(payload);
        post_text(Some("alice"), ORDERS, &number, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    }
    post_text(Some("bob"), ORDERS, &valid_order_number(1003), memory_app(db.clone(), queue.clone()))
        .await
        .expect("Request failed");

    let (status, body) = get_request(Some("alice"), ORDERS, memory_app(db, queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let orders = json(&body);
    let numbers = orders.as_array().unwrap().iter().map(|o| o["number"].as_str().unwrap().to_string()).collect::<Vec<_>>();
    assert_eq!(numbers, vec![valid_order_number(1001), valid_order_number(1002)]);
}

#[actix_web::test]
async fn uploaded_order_is_credited() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let client = ScriptedAccrualService::new();
    client.push("12345678903", processed("12345678903", 500));
    let policy = RetryPolicy {
        poll_interval: Duration::from_millis(1),
        persistence_retry_delay: Duration::from_millis(1),
        ..RetryPolicy::default()
    };
    let (queue, receiver) = reconciliation_queue(10);
    let worker = start_accrual_worker(db.clone(), client, receiver, policy).await.unwrap();
    let (status, _) =
        post_text(Some("alice"), ORDERS, "12345678903", memory_app(db.clone(), queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    // The app was the last holder of the queue, so the worker stops once the order is done
    worker.join().await;

    let (queue, _receiver) = reconciliation_queue(1);
    let (status, body) =
        get_request(Some("alice"), ORDERS, memory_app(db.clone(), queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let orders = json(&body);
    assert_eq!(orders[0]["status"], "PROCESSED");
    assert_eq!(orders[0]["accrual"], 5.0);

    let (status, body) =
        get_request(Some("alice"), "/api/user/balance", memory_app(db, queue)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["current"], 5.0);
}
