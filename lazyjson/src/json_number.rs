// SPDX-License-Identifier: Apache-2.0

use core::str::FromStr;

use crate::error::Malformed;
use crate::Value;

/// Detects if a number byte slice represents an integer (no decimal point or exponent).
/// JSON numbers are pure ASCII, so this avoids unnecessary UTF-8 string processing.
pub fn is_integer(bytes: &[u8]) -> bool {
    !bytes.iter().any(|&b| matches!(b, b'.' | b'e' | b'E'))
}

/// Converts the bytes of a number literal, already checked against the JSON
/// number grammar, into a [`Value`].
///
/// Integers that do not fit in an `i64` fall back to `f64`.
pub fn parse_number(bytes: &[u8]) -> Result<Value, Malformed> {
    let s = core::str::from_utf8(bytes).map_err(|_| Malformed::InvalidNumber)?;
    if is_integer(bytes) {
        if let Ok(val) = i64::from_str(s) {
            return Ok(Value::Int(val));
        }
        log::debug!("integer literal {s} overflows i64, using f64");
    }
    f64::from_str(s)
        .map(Value::Float)
        .map_err(|_| Malformed::InvalidNumber)
}
