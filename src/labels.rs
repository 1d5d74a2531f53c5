//! Label table: label name -> instruction index, built once during the
//! document-integrity check (spec.md §4.5, §9 — never built lazily during
//! execution, so duplicate-label diagnostics fire before any side effect).

use std::collections::HashMap;

use crate::errors::{DocumentError, InterpreterError};

/// Either of the two error families that can surface while building the
/// label table: a structural problem with the `LABEL` instruction itself
/// (32), or a duplicate label name (52).
#[derive(Debug, thiserror::Error)]
pub enum LabelTableError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Duplicate(#[from] InterpreterError),
}

#[derive(Debug, Default)]
pub struct LabelTable {
    positions: HashMap<String, usize>,
}

impl LabelTable {
    /// Scan the already order-sorted instruction list for `LABEL` opcodes.
    pub fn build<'a, I>(instructions: I) -> Result<Self, LabelTableError>
    where
        I: IntoIterator<Item = (usize, &'a str, Option<&'a str>)>,
    {
        let mut positions = HashMap::new();
        for (pc, opcode, label_arg) in instructions {
            if opcode.eq_ignore_ascii_case("LABEL") {
                let name = label_arg.ok_or_else(|| {
                    DocumentError::Syntactic(format!("LABEL at instruction {pc} missing its argument"))
                })?;
                if positions.contains_key(name) {
                    return Err(InterpreterError::DuplicateLabel(name.to_string()).into());
                }
                positions.insert(name.to_string(), pc);
            }
        }
        Ok(LabelTable { positions })
    }

    pub fn resolve(&self, name: &str) -> Result<usize, InterpreterError> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| InterpreterError::UndefinedLabel(name.to_string()))
    }
}
