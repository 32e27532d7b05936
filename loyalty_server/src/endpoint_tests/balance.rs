use actix_web::{http::StatusCode, web, web::ServiceConfig};
use loyalty_engine::{db_types::Cents, traits::AccountApiError, AccountApi};

use super::{
    helpers::{account, get_request, json},
    mocks::MockLedgerStore,
};
use crate::routes::MyBalanceRoute;

const BALANCE: &str = "/api/user/balance";

fn configure(store: MockLedgerStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AccountApi::new(store)))
            .service(web::scope("/api/user").service(MyBalanceRoute::<MockLedgerStore>::new()));
    }
}

#[actix_web::test]
async fn fetch_my_balance() {
    let _ = env_logger::try_init().ok();
    let mut store = MockLedgerStore::new();
    store
        .expect_fetch_or_create_account()
        .withf(|login| login.to_string() == "alice")
        .returning(|_| Ok(account(7, "alice", 72950)));
    store.expect_fetch_account().withf(|id| *id == 7).returning(|_| Ok(Some(account(7, "alice", 72950))));
    store.expect_fetch_withdrawn_sum_for_user().withf(|id| *id == 7).returning(|_| Ok(Cents::from(1000)));
    let (status, body) = get_request(Some("alice"), BALANCE, configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["current"], 729.5);
    assert_eq!(body["withdrawn"], 10.0);
}

#[actix_web::test]
async fn fetch_balance_without_login() {
    let _ = env_logger::try_init().ok();
    let mut store = MockLedgerStore::new();
    store.expect_fetch_or_create_account().never();
    let (status, body) = get_request(None, BALANCE, configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json(&body)["error"].is_string());
}

#[actix_web::test]
async fn fetch_balance_with_blank_login() {
    let _ = env_logger::try_init().ok();
    let store = MockLedgerStore::new();
    let (status, _) = get_request(Some("   "), BALANCE, configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_balance_database_down() {
    let _ = env_logger::try_init().ok();
    let mut store = MockLedgerStore::new();
    store
        .expect_fetch_or_create_account()
        .returning(|_| Err(AccountApiError::DatabaseError("connection refused".into())));
    let (status, body) = get_request(Some("alice"), BALANCE, configure(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("connection refused"));
}
