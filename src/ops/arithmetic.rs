//! `ADD`, `SUB`, `MUL`, `IDIV`.

use crate::errors::InterpreterError;

/// Two's-complement wrapping addition, matching the overflow policy
/// documented in DESIGN.md (spec.md leaves this an implementer's choice).
pub fn add(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

pub fn sub(a: i64, b: i64) -> i64 {
    a.wrapping_sub(b)
}

pub fn mul(a: i64, b: i64) -> i64 {
    a.wrapping_mul(b)
}

/// Floor (truncated-toward-negative-infinity) integer division, matching
/// the reference's Python `//` semantics for negative dividends.
pub fn idiv(a: i64, b: i64, opcode: &str, pc: usize) -> Result<i64, InterpreterError> {
    if b == 0 {
        return Err(InterpreterError::BadValue {
            opcode: opcode.to_string(),
            pc,
            detail: "division by zero".to_string(),
        });
    }
    let q = a / b;
    let r = a % b;
    Ok(if r != 0 && (r < 0) != (b < 0) { q - 1 } else { q })
}
