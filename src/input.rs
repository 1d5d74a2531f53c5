//! Input source for `READ`: a line-oriented reader over a file or stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use crate::errors::CliError;

/// Abstracts over a file or interactive stream so `READ` doesn't care
/// which one is backing it. Acquired once before execution begins and
/// held for the lifetime of the run (spec.md §5).
pub enum InputSource {
    File(BufReader<File>),
    Stdin(io::Stdin),
}

impl InputSource {
    pub fn from_path(path: &str) -> Result<Self, CliError> {
        let file = File::open(path).map_err(|e| CliError::Io(format!("cannot open '{path}': {e}")))?;
        Ok(InputSource::File(BufReader::new(file)))
    }

    pub fn stdin() -> Self {
        InputSource::Stdin(io::stdin())
    }

    /// Read one line, stripping the trailing newline. `Ok(None)` at EOF.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        let bytes_read = match self {
            InputSource::File(reader) => reader.read_line(&mut buf)?,
            InputSource::Stdin(stdin) => stdin.lock().read_line(&mut buf)?,
        };
        if bytes_read == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }
}
