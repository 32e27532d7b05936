//! SQLite backend for the loyalty engine.
//!
//! [`SqliteDatabase`] implements every storage trait in [`crate::traits`]. Multi-step balance mutations run inside a
//! [`SqliteLedgerTransaction`], which wraps a plain `sqlx` transaction. SQLite serialises writers, so re-reading a
//! balance inside the transaction before writing it back cannot lose a concurrent update.
mod sqlite_impl;
mod transaction;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
pub use transaction::SqliteLedgerTransaction;
