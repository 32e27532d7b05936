//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions.
//!
//! Every `/api/user` handler identifies the caller with [`AuthenticatedLogin`]. The first request from a login creates
//! an empty account for it.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    db_types::{OrderStatusType, UserAccount},
    traits::{LedgerManagement, OrderManagement, TransactionRunner, WithdrawalManagement},
    AccountApi,
    EnrollmentApi,
    WithdrawApi,
};
use lpg_common::parse_balance;

use crate::{
    auth::AuthenticatedLogin,
    data_objects::{BalanceResponse, JsonResponse, OrderResponse, WithdrawRequest, WithdrawalResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// The bounds are matched as paths, since a `ty` fragment cannot be spliced into a `+` bound list.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

async fn caller_account<A>(login: &AuthenticatedLogin, api: &AccountApi<A>) -> Result<UserAccount, ServerError>
where A: LedgerManagement + WithdrawalManagement {
    api.fetch_or_create_account(login.as_str()).await.map_err(|e| {
        debug!("💻️ Could not resolve the account for {}. {e}", login.as_str());
        ServerError::from(e)
    })
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(upload_order => Post "/orders" impl OrderManagement, LedgerManagement, WithdrawalManagement);
/// Route handler for order uploads
///
/// The body is the bare order number as plain text. Responds with
/// * 202 if the order was accepted and is waiting for reconciliation,
/// * 200 if the caller uploaded this order before and it has already been picked up,
/// * 409 if another user uploaded the order first,
/// * 400 for an empty body and 422 if the number fails the Luhn check.
pub async fn upload_order<A>(
    login: AuthenticatedLogin,
    body: String,
    accounts: web::Data<AccountApi<A>>,
    enrollment: web::Data<EnrollmentApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: OrderManagement + LedgerManagement + WithdrawalManagement,
{
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("The order number is missing".into()));
    }
    let account = caller_account(&login, accounts.as_ref()).await?;
    debug!("💻️ POST order {number} for {}", account.login);
    let order = enrollment.require_order(number, account.id).await?;
    if !order.is_owned_by(account.id) {
        return Err(ServerError::OrderConflict(order.order_number.to_string()));
    }
    let response = match order.status {
        OrderStatusType::New => HttpResponse::Accepted().json(OrderResponse::from(order)),
        _ => HttpResponse::Ok().json(OrderResponse::from(order)),
    };
    Ok(response)
}

route!(my_orders => Get "/orders" impl OrderManagement, LedgerManagement, WithdrawalManagement);
pub async fn my_orders<A>(
    login: AuthenticatedLogin,
    accounts: web::Data<AccountApi<A>>,
    enrollment: web::Data<EnrollmentApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: OrderManagement + LedgerManagement + WithdrawalManagement,
{
    let account = caller_account(&login, accounts.as_ref()).await?;
    debug!("💻️ GET orders for {}", account.login);
    let orders = enrollment.orders_for_user(account.id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/balance" impl LedgerManagement, WithdrawalManagement);
/// The caller's current balance and everything they have withdrawn so far, as decimal amounts.
pub async fn my_balance<A>(
    login: AuthenticatedLogin,
    accounts: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: LedgerManagement + WithdrawalManagement,
{
    let account = caller_account(&login, accounts.as_ref()).await?;
    debug!("💻️ GET balance for {}", account.login);
    let summary = accounts.balance_for_user(account.id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(summary)))
}

//----------------------------------------------   Withdrawals  ------------------------------------------------
route!(withdraw => Post "/balance/withdraw" impl LedgerManagement, WithdrawalManagement, TransactionRunner);
/// Spends part of the caller's balance against a new order.
///
/// The body is `{"order": "<number>", "sum": <decimal>}`. A zero sum is a 400, insufficient funds a 402 and an
/// invalid order number or sum a 422.
pub async fn withdraw<A>(
    login: AuthenticatedLogin,
    body: web::Json<WithdrawRequest>,
    accounts: web::Data<AccountApi<A>>,
    withdrawals: web::Data<WithdrawApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: LedgerManagement + WithdrawalManagement + TransactionRunner,
{
    let request = body.into_inner();
    let sum = parse_balance(&request.sum.to_string()).map_err(|e| {
        debug!("💻️ Withdrawal for order {} has an invalid sum. {e}", request.order);
        ServerError::InvalidAmount(e.to_string())
    })?;
    let account = caller_account(&login, accounts.as_ref()).await?;
    debug!("💻️ POST withdrawal of {sum} against order {} for {}", request.order, account.login);
    let withdrawal = withdrawals.create_withdrawal(account.id, &request.order, sum).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!(
        "Withdrew {} against order {}",
        withdrawal.sum, withdrawal.order_number
    ))))
}

route!(my_withdrawals => Get "/withdrawals" impl LedgerManagement, WithdrawalManagement, TransactionRunner);
pub async fn my_withdrawals<A>(
    login: AuthenticatedLogin,
    accounts: web::Data<AccountApi<A>>,
    withdrawals: web::Data<WithdrawApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: LedgerManagement + WithdrawalManagement + TransactionRunner,
{
    let account = caller_account(&login, accounts.as_ref()).await?;
    debug!("💻️ GET withdrawals for {}", account.login);
    let history = withdrawals.withdrawals_for_user(account.id).await?;
    if history.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let history = history.into_iter().map(WithdrawalResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(history))
}

#[cfg(test)]
mod test {
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    async fn describe_default<A>() -> HttpResponse
    where A: std::fmt::Debug + Default + Send + Sync {
        HttpResponse::Ok().body(format!("{:?}", A::default()))
    }

    route!(describe_default => Get "/default" impl std::fmt::Debug, Default, Send, Sync);

    #[actix_web::test]
    async fn routes_accept_qualified_bounds() {
        let app = test::init_service(App::new().service(DescribeDefaultRoute::<Vec<u8>>::new())).await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/default").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "[]");

        let res = test::call_service(&app, test::TestRequest::post().uri("/default").to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
