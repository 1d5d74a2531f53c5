//! Error taxonomy for the IR interpreter.
//!
//! Every variant carries the exit code from the spec's table directly, so
//! `exit_code()` is a plain match with no room for the mapping to drift
//! out of sync with the variant that produced it.

use thiserror::Error;

/// Frame prefix named in a variable reference (`GF@x`, `LF@x`, `TF@x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Global,
    Local,
    Temporary,
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frame::Global => "GF",
            Frame::Local => "LF",
            Frame::Temporary => "TF",
        };
        write!(f, "{}", s)
    }
}

/// Failures that occur loading and validating the program document,
/// before any instruction executes.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is not well-formed: {0}")]
    NotWellFormed(String),

    #[error("syntactic error: {0}")]
    Syntactic(String),
}

impl DocumentError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DocumentError::NotWellFormed(_) => 31,
            DocumentError::Syntactic(_) => 32,
        }
    }
}

/// Failures that occur while executing instructions.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("unknown opcode '{0}' at instruction {1}")]
    UnknownOpcode(String, usize),

    #[error("wrong argument count for '{opcode}' at instruction {pc}: expected {expected}, got {actual}")]
    ArgCount {
        opcode: String,
        expected: usize,
        actual: usize,
        pc: usize,
    },

    #[error("bad argument shape for '{opcode}' at instruction {pc}: {detail}")]
    BadArgShape {
        opcode: String,
        pc: usize,
        detail: String,
    },

    #[error("label '{0}' is undefined")]
    UndefinedLabel(String),

    #[error("label '{0}' is defined more than once")]
    DuplicateLabel(String),

    #[error("variable '{name}' already defined in frame {frame}")]
    VariableRedefined { frame: Frame, name: String },

    #[error("wrong operand types for '{opcode}' at instruction {pc}: {detail}")]
    WrongType {
        opcode: String,
        pc: usize,
        detail: String,
    },

    #[error("variable '{name}' undefined in frame {frame}")]
    VariableUndefined { frame: Frame, name: String },

    #[error("frame {0} does not exist")]
    FrameMissing(Frame),

    #[error("missing value: {0}")]
    MissingValue(String),

    #[error("bad operand value for '{opcode}' at instruction {pc}: {detail}")]
    BadValue {
        opcode: String,
        pc: usize,
        detail: String,
    },

    #[error("string manipulation error in '{opcode}' at instruction {pc}: {detail}")]
    StringError {
        opcode: String,
        pc: usize,
        detail: String,
    },
}

impl InterpreterError {
    pub fn exit_code(&self) -> i32 {
        match self {
            InterpreterError::UnknownOpcode(..) => 32,
            InterpreterError::ArgCount { .. } => 32,
            InterpreterError::BadArgShape { .. } => 32,
            InterpreterError::UndefinedLabel(_) => 52,
            InterpreterError::DuplicateLabel(_) => 52,
            InterpreterError::VariableRedefined { .. } => 52,
            InterpreterError::WrongType { .. } => 53,
            InterpreterError::VariableUndefined { .. } => 54,
            InterpreterError::FrameMissing(_) => 55,
            InterpreterError::MissingValue(_) => 56,
            InterpreterError::BadValue { .. } => 57,
            InterpreterError::StringError { .. } => 58,
        }
    }
}

/// Failures in the CLI shell itself, before the interpreter ever runs.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    BadParameters(String),

    #[error("{0}")]
    Io(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::BadParameters(_) => 10,
            CliError::Io(_) => 11,
        }
    }
}
