//! Command-line entry point for the IR interpreter.

use std::fs;
use std::io::{self, Read as _};
use std::process::ExitCode;

use clap::Parser;
use ippcode_interpreter::errors::{CliError, DocumentError};
use ippcode_interpreter::labels::LabelTableError;
use ippcode_interpreter::{load_program, InputSource, Interpreter};

/// IPPcode-style intermediate representation interpreter.
#[derive(Parser)]
#[command(name = "ippcode-interpreter")]
#[command(about = "Interpreter for IPPcode-style intermediate representation programs", long_about = None)]
struct Cli {
    /// Path to the XML source document. Reads stdin if omitted.
    #[arg(long)]
    source: Option<String>,

    /// Path to the file supplying `READ`'s input. Reads stdin if omitted.
    #[arg(long)]
    input: Option<String>,

    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.verbose {
        0 => log::set_max_level(log::LevelFilter::Warn),
        1 => log::set_max_level(log::LevelFilter::Info),
        2 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match run(cli) {
        Ok(code) => exit_code(code),
        Err(code) => exit_code(code),
    }
}

fn run(cli: Cli) -> Result<i32, i32> {
    if cli.source.is_none() && cli.input.is_none() {
        log::error!("at least one of --source or --input must be given");
        return Err(CliError::BadParameters("at least one of --source or --input must be given".to_string()).exit_code());
    }

    let xml_text = read_source(cli.source.as_deref()).map_err(|e| {
        log::error!("{e}");
        e.exit_code()
    })?;

    let program = load_program(&xml_text).map_err(|e: DocumentError| {
        log::error!("{e}");
        e.exit_code()
    })?;
    log::debug!("loaded {} instructions", program.instructions.len());

    let input = match cli.input.as_deref() {
        Some(path) => InputSource::from_path(path).map_err(|e| {
            log::error!("{e}");
            e.exit_code()
        })?,
        None => InputSource::stdin(),
    };

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut interpreter = Interpreter::new(program, input, stdout.lock(), stderr.lock()).map_err(|e: LabelTableError| {
        log::error!("{e}");
        match e {
            LabelTableError::Document(e) => e.exit_code(),
            LabelTableError::Duplicate(e) => e.exit_code(),
        }
    })?;

    interpreter.run().map_err(|e| {
        log::error!("{e}");
        e.exit_code()
    })
}

fn read_source(path: Option<&str>) -> Result<String, CliError> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| CliError::Io(format!("cannot read '{path}': {e}"))),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map_err(|e| CliError::Io(format!("cannot read stdin: {e}")))?;
            Ok(buf)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}
