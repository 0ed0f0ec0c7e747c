//! Human-facing identifiers: order and quote numbers, gateway receipts,
//! password reset tokens.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const UPPER_ALPHANUMERIC: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a password reset token.
pub const RESET_TOKEN_LENGTH: usize = 32;

/// Lowercase base-36 rendering of `n`.
#[must_use]
pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        let digit = usize::try_from(n % 36)
            .ok()
            .and_then(|i| BASE36_DIGITS.get(i))
            .copied()
            .unwrap_or(b'0');
        digits.push(char::from(digit));
        n /= 36;
    }
    digits.iter().rev().collect()
}

fn random_from(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .filter_map(|_| alphabet.get(rng.random_range(0..alphabet.len())))
        .map(|&b| char::from(b))
        .collect()
}

fn unix_millis(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp_millis()).unwrap_or_default()
}

/// `AKR-<base36 millis>-<4 random>`, all upper case.
#[must_use]
pub fn order_number_at(at: DateTime<Utc>) -> String {
    format!(
        "AKR-{}-{}",
        to_base36(unix_millis(at)).to_uppercase(),
        random_from(BASE36_DIGITS, 4).to_uppercase()
    )
}

/// Order number for an order being created now.
#[must_use]
pub fn order_number() -> String {
    order_number_at(Utc::now())
}

/// `QT-` followed by ten upper-case alphanumerics.
#[must_use]
pub fn quote_number() -> String {
    format!("QT-{}", random_from(UPPER_ALPHANUMERIC, 10))
}

/// Receipt attached to a gateway order: `order_<millis>_<9 base36>`.
#[must_use]
pub fn payment_receipt() -> String {
    format!(
        "order_{}_{}",
        unix_millis(Utc::now()),
        random_from(BASE36_DIGITS, 9)
    )
}

/// Random alphanumeric password reset token.
#[must_use]
pub fn reset_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
