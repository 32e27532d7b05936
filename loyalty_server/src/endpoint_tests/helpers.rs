use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use loyalty_engine::{
    db_types::{Cents, UserAccount},
    traits::{LedgerManagement, LedgerTransaction, TransactionRunner},
    AccountApi,
    EnrollmentApi,
    MemoryDatabase,
    ReconciliationQueue,
    WithdrawApi,
};

use crate::{auth::AuthHeader, server::configure_user_routes};

pub const LOGIN_HEADER: &str = "X-Authenticated-User";

pub async fn send_request<F>(
    req: TestRequest,
    login: Option<&str>,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let req = match login {
        Some(login) => req.insert_header((LOGIN_HEADER, login)),
        None => req,
    };
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?;
    let status = res.status();
    let body = test::read_body(res).await;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

pub async fn get_request<F>(login: Option<&str>, path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), login, configure).await
}

pub async fn post_text<F>(
    login: Option<&str>,
    path: &str,
    body: &str,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let req = TestRequest::post().uri(path).insert_header(("Content-Type", "text/plain")).set_payload(body.to_string());
    send_request(req, login, configure).await
}

pub async fn post_json<F>(
    login: Option<&str>,
    path: &str,
    body: serde_json::Value,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    send_request(TestRequest::post().uri(path).set_json(body), login, configure).await
}

/// Registers the user routes over a memory backend, the same way the server does.
pub fn memory_app(db: MemoryDatabase, queue: ReconciliationQueue) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(EnrollmentApi::new(db.clone(), queue)))
            .app_data(web::Data::new(AccountApi::new(db.clone())))
            .app_data(web::Data::new(WithdrawApi::new(db)))
            .app_data(web::Data::new(AuthHeader::default()));
        configure_user_routes::<MemoryDatabase>(cfg);
    }
}

/// Creates the account for `login` with the given balance.
pub async fn funded_account(db: &MemoryDatabase, login: &str, cents: i64) -> UserAccount {
    let account = db.fetch_or_create_account(login).await.unwrap();
    let mut tx = db.begin().await.unwrap();
    let account = tx.update_balance(account.id, Cents::from(cents)).await.unwrap();
    tx.commit().await.unwrap();
    account
}

pub fn account(id: i64, login: &str, balance: i64) -> UserAccount {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    UserAccount {
        id,
        login: login.to_string(),
        balance: Cents::from(balance),
        credential_hash: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
