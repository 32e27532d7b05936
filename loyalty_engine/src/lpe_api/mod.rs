//! # Loyalty engine public API
//!
//! The `lpe_api` module exposes the programmatic API of the loyalty engine. The API is modular, so that clients can
//! pick the parts they need.
//!
//! * [`EnrollmentApi`] accepts order submissions and feeds them to the reconciliation queue.
//! * [`WithdrawApi`] debits balances and records withdrawals.
//! * [`AccountApi`] looks up accounts and balances.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs. Backends are cheap to clone, so
//! the same database can be shared by all of them.
//!
//! ```rust,ignore
//! use loyalty_engine::{reconciliation_queue, AccountApi, EnrollmentApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/loyalty.db", 5).await?;
//! let (queue, receiver) = reconciliation_queue(10);
//! let enrollment = EnrollmentApi::new(db.clone(), queue);
//! let accounts = AccountApi::new(db);
//! let account = accounts.fetch_or_create_account("alice").await?;
//! let order = enrollment.require_order("12345678903", account.id).await?;
//! ```
pub mod accounts_api;
pub mod enrollment_api;
pub mod errors;
pub mod withdraw_api;

pub use accounts_api::AccountApi;
pub use enrollment_api::EnrollmentApi;
pub use errors::{EnrollmentError, WithdrawError};
pub use withdraw_api::WithdrawApi;
