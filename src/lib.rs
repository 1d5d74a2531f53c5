//! Library crate for the IR interpreter: document loading, the three-frame
//! variable model, the value system, and the instruction dispatcher.

pub mod callstack;
pub mod errors;
pub mod frame;
pub mod input;
pub mod interpreter;
pub mod labels;
pub mod ops;
pub mod program;
pub mod stack;
pub mod value;

pub use errors::{CliError, DocumentError, InterpreterError};
pub use input::InputSource;
pub use interpreter::Interpreter;
pub use program::{load_program, Program};
