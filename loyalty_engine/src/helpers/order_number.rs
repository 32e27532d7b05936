//! Luhn check-digit validation for order numbers.
//!
//! Digits are scanned from the right. Every second digit (positions 1, 3, 5, ... counting from zero at the rightmost
//! digit) is doubled, and doubled values of 10 or more have 9 subtracted. The number is valid when the total is a
//! multiple of 10.

/// Returns `true` if `number` is a non-empty string of ASCII digits that passes the Luhn check.
pub fn is_valid_order_number(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, b) in number.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(b - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit >= 10 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
