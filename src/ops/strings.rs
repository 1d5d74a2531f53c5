//! `INT2CHAR`, `STRI2INT`, `CONCAT`, `STRLEN`, `GETCHAR`, `SETCHAR`.

use crate::errors::InterpreterError;

fn string_error(opcode: &str, pc: usize, detail: impl Into<String>) -> InterpreterError {
    InterpreterError::StringError { opcode: opcode.to_string(), pc, detail: detail.into() }
}

/// `INT2CHAR`: the one-character string of the given code point.
pub fn int2char(code: i64, pc: usize) -> Result<String, InterpreterError> {
    let code = u32::try_from(code).map_err(|_| string_error("INT2CHAR", pc, format!("{code} is not a valid code point")))?;
    char::from_u32(code)
        .map(|c| c.to_string())
        .ok_or_else(|| string_error("INT2CHAR", pc, format!("{code} is not a valid code point")))
}

/// `STRI2INT`: the code point of `s`'s character at `index`.
pub fn stri2int(s: &str, index: i64, pc: usize) -> Result<i64, InterpreterError> {
    let chars: Vec<char> = s.chars().collect();
    let idx = usize::try_from(index).ok().filter(|&i| i < chars.len());
    match idx {
        Some(i) => Ok(chars[i] as i64),
        None => Err(string_error("STRI2INT", pc, format!("index {index} out of range for string of length {}", chars.len()))),
    }
}

pub fn concat(a: &str, b: &str) -> String {
    format!("{a}{b}")
}

pub fn strlen(s: &str) -> i64 {
    s.chars().count() as i64
}

/// `GETCHAR`: the one-character string at `index`.
pub fn getchar(s: &str, index: i64, pc: usize) -> Result<String, InterpreterError> {
    let chars: Vec<char> = s.chars().collect();
    let idx = usize::try_from(index).ok().filter(|&i| i < chars.len());
    match idx {
        Some(i) => Ok(chars[i].to_string()),
        None => Err(string_error("GETCHAR", pc, format!("index {index} out of range for string of length {}", chars.len()))),
    }
}

/// `SETCHAR`: `target` with the character at `index` replaced by the first
/// character of `replacement`. Requires `0 <= index < len(target)` and a
/// non-empty `replacement` (spec.md §9's resolution of the empty-`C` case).
pub fn setchar(target: &str, index: i64, replacement: &str, pc: usize) -> Result<String, InterpreterError> {
    let mut chars: Vec<char> = target.chars().collect();
    let idx = usize::try_from(index).ok().filter(|&i| i < chars.len());
    let Some(idx) = idx else {
        return Err(string_error("SETCHAR", pc, format!("index {index} out of range for string of length {}", chars.len())));
    };
    let Some(replacement_char) = replacement.chars().next() else {
        return Err(string_error("SETCHAR", pc, "replacement string is empty"));
    };
    chars[idx] = replacement_char;
    Ok(chars.into_iter().collect())
}
