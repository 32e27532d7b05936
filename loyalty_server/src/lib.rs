//! # Loyalty gateway server
//! This crate hosts the HTTP front end of the loyalty gateway. It is responsible for:
//! * Accepting order uploads from authenticated users and handing them to the reconciliation queue.
//! * Running the reconciliation worker, which confirms orders with the accrual service and credits balances.
//! * Serving balances, order lists and withdrawals.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/user/orders`: Upload an order number.
//! * `GET /api/user/orders`: The caller's orders.
//! * `GET /api/user/balance`: The caller's balance and total withdrawals.
//! * `POST /api/user/balance/withdraw`: Spend part of the balance against a new order.
//! * `GET /api/user/withdrawals`: The caller's withdrawals.
pub mod accrual_worker;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
