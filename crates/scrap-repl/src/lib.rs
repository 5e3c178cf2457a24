//! The scrapscript REPL: a readline loop over a [`ReplSession`].
//!
//! History persists to `~/.scrap-history`. Interrupts drop pending
//! continuation lines; end-of-input exits.

mod session;

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub use session::{ReplSession, Response};

const HISTORY_FILE: &str = ".scrap-history";

fn history_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(HISTORY_FILE),
        None => PathBuf::from(HISTORY_FILE),
    }
}

/// Run the interactive loop until end-of-input.
pub fn run() -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let history = history_path();
    let _ = editor.load_history(&history);

    let mut session = ReplSession::new();
    loop {
        let prompt = if session.is_continuing() { "... " } else { ">>> " };
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                match session.feed(&line) {
                    Response::Incomplete | Response::Bound => {}
                    Response::Value(value) => println!("{value}"),
                    Response::Error(message) => eprintln!("{message}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                session.cancel();
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }

    let _ = editor.save_history(&history);
    Ok(())
}
