//! The scrapscript CLI.
//!
//! Subcommands:
//!
//! - `scrap repl` - interactive session (the default with no subcommand)
//! - `scrap eval <file>` - evaluate a program file and print the result
//! - `scrap apply <program>` - evaluate a program given as an argument
//! - `scrap check <file>` - infer and print a program's type
//! - `scrap flat` - serialize a program from stdin to bytes on stdout

mod diagnostics;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use scrap_parser::ast::ExprRef;

#[derive(Parser)]
#[command(name = "scrap", version, about = "The scrapscript interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Repl,
    /// Evaluate a program file and print the result
    Eval {
        /// Path to the program file
        file: PathBuf,
    },
    /// Evaluate a program given on the command line
    Apply {
        /// The program text
        program: String,
    },
    /// Infer and print the type of a program file
    Check {
        /// Path to the program file
        file: PathBuf,
    },
    /// Read a program from stdin and write its serialized bytes to stdout
    Flat,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        None | Some(Commands::Repl) => repl(),
        Some(Commands::Eval { file }) => eval_file(&file),
        Some(Commands::Apply { program }) => eval_source(&program),
        Some(Commands::Check { file }) => check_file(&file),
        Some(Commands::Flat) => flat(),
    };
    if let Err(message) = result {
        eprintln!("{message}");
        process::exit(1);
    }
}

fn repl() -> Result<(), String> {
    scrap_repl::run().map_err(|e| format!("readline error: {e}"))
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))
}

/// Parse source, printing a diagnostic report on failure.
fn parse_source(source: &str) -> Result<ExprRef, String> {
    scrap_parser::parse(source).map_err(|e| {
        diagnostics::report_syntax_error(source, &e);
        "exiting due to the syntax error above".to_string()
    })
}

fn eval_file(path: &Path) -> Result<(), String> {
    eval_source(&read_file(path)?)
}

fn eval_source(source: &str) -> Result<(), String> {
    let program = parse_source(source)?;
    let env = scrap_eval::boot_env();
    let result = scrap_eval::eval(&env, &program).map_err(|e| format!("error: {e}"))?;
    println!("{result}");
    Ok(())
}

fn check_file(path: &Path) -> Result<(), String> {
    let source = read_file(path)?;
    let program = parse_source(&source)?;
    let rendered =
        scrap_typeck::infer_program(&program).map_err(|e| format!("type error: {e}"))?;
    println!("{rendered}");
    Ok(())
}

fn flat() -> Result<(), String> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    let program = parse_source(&source)?;
    let bytes = scrap_wire::serialize(&program).map_err(|e| format!("serialize error: {e}"))?;
    std::io::stdout()
        .write_all(&bytes)
        .map_err(|e| format!("failed to write stdout: {e}"))?;
    Ok(())
}
