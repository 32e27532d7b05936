mod cents;
mod helpers;

pub mod op;

pub use cents::{parse_balance, BalanceParseError, Cents, CURRENCY_MINOR_UNITS};
pub use helpers::parse_boolean_flag;
