//! Helpers for tests that exercise the engine against a real SQLite file or a scripted accrual service.
pub mod accrual;
#[cfg(feature = "sqlite")]
pub mod prepare_env;

pub use accrual::ScriptedAccrualService;

/// Appends a Luhn check digit to `payload`, producing an order number that passes validation.
pub fn valid_order_number(payload: u64) -> String {
    let digits = payload.to_string();
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            match i % 2 {
                0 if digit * 2 >= 10 => digit * 2 - 9,
                0 => digit * 2,
                _ => digit,
            }
        })
        .sum();
    format!("{digits}{}", (10 - sum % 10) % 10)
}
