use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{
    reconciliation_queue,
    traits::{LedgerManagement, OrderManagement, TransactionRunner, WithdrawalManagement},
    AccountApi,
    AccrualClient,
    EnrollmentApi,
    ReconciliationQueue,
    SqliteDatabase,
    WithdrawApi,
};

use crate::{
    accrual_worker::start_accrual_worker,
    auth::AuthHeader,
    config::ServerConfig,
    errors::ServerError,
    routes::{health, MyBalanceRoute, MyOrdersRoute, MyWithdrawalsRoute, UploadOrderRoute, WithdrawRoute},
};

/// Runs the loyalty gateway until it is shut down.
///
/// Startup happens in two phases. First the store is opened, unresolved orders are recovered and the reconciliation
/// worker is started. Only then is the HTTP server bound, so recovered orders are always ahead of new submissions.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
        info!("🚀️ Database migrations are up to date");
    }
    let client = AccrualClient::new(&config.accrual_system_url, config.accrual_timeout)
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let (queue, receiver) = reconciliation_queue(config.queue_capacity);
    let worker = start_accrual_worker(db.clone(), client, receiver, config.retry_policy()).await?;
    info!("🚀️ Reconciliation worker is running against {}", config.accrual_system_url);
    let srv = create_server_instance(config, db, queue)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    info!("🚀️ Server has stopped. Shutting down the reconciliation worker");
    worker.shutdown().await;
    result
}

pub fn create_server_instance<B>(config: ServerConfig, db: B, queue: ReconciliationQueue) -> Result<Server, ServerError>
where B: OrderManagement + LedgerManagement + WithdrawalManagement + TransactionRunner + Clone + Send + 'static {
    let auth_header = AuthHeader(config.auth_header.clone());
    let srv = HttpServer::new(move || {
        let enrollment_api = EnrollmentApi::new(db.clone(), queue.clone());
        let accounts_api = AccountApi::new(db.clone());
        let withdraw_api = WithdrawApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .app_data(web::Data::new(enrollment_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(withdraw_api))
            .app_data(web::Data::new(auth_header.clone()))
            .configure(configure_user_routes::<B>)
            .service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the `/api/user` scope. The APIs and the [`AuthHeader`] must already be registered as app data.
pub fn configure_user_routes<B>(cfg: &mut web::ServiceConfig)
where B: OrderManagement + LedgerManagement + WithdrawalManagement + TransactionRunner + 'static {
    cfg.service(
        web::scope("/api/user")
            .service(UploadOrderRoute::<B>::new())
            .service(MyOrdersRoute::<B>::new())
            .service(MyBalanceRoute::<B>::new())
            .service(WithdrawRoute::<B>::new())
            .service(MyWithdrawalsRoute::<B>::new()),
    );
}
