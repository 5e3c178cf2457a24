//! REPL session state.
//!
//! A session owns the evaluation environment (boot bindings plus
//! everything the user has defined) and a buffer of pending input.
//! Feeding a line either asks for more input, binds names, or produces a
//! printable value or error. Binding results merge into the session
//! environment; any other value is bound to `_` and rendered.

use scrap_common::error::LexErrorKind;
use scrap_eval::{boot_env, eval};
use scrap_parser::ast::{Env, Expr};
use scrap_parser::error::ParseError;
use scrap_parser::SyntaxError;

/// What the session did with a line of input.
#[derive(Debug, PartialEq)]
pub enum Response {
    /// The input is incomplete; feed another line.
    Incomplete,
    /// The input bound names into the session; nothing to print.
    Bound,
    /// A rendered value to print.
    Value(String),
    /// A rendered error to print.
    Error(String),
}

pub struct ReplSession {
    env: Env,
    buffer: String,
}

impl ReplSession {
    /// A fresh session over the boot environment.
    pub fn new() -> Self {
        ReplSession {
            env: boot_env(),
            buffer: String::new(),
        }
    }

    /// Whether the session is waiting for continuation lines.
    pub fn is_continuing(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Drop any pending input (after an interrupt).
    pub fn cancel(&mut self) {
        self.buffer.clear();
    }

    /// Feed one line of input.
    pub fn feed(&mut self, line: &str) -> Response {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);

        let program = match scrap_parser::parse(&self.buffer) {
            // Input that ran out mid-token or mid-expression is not an
            // error yet; keep reading.
            Err(SyntaxError::Lex(e)) if matches!(e.kind, LexErrorKind::UnexpectedEof(_)) => {
                return Response::Incomplete;
            }
            Err(SyntaxError::Parse(ParseError::UnexpectedEof)) => {
                return Response::Incomplete;
            }
            Err(other) => {
                self.buffer.clear();
                return Response::Error(format!("parse error: {other}"));
            }
            Ok(program) => program,
        };

        // The user might be mid-way through typing further match
        // alternatives; finish on an empty line.
        if matches!(&*program, Expr::MatchFunction(_)) && !line.trim().is_empty() {
            return Response::Incomplete;
        }

        self.buffer.clear();
        match eval(&self.env, &program) {
            Ok(result) => match &*result {
                Expr::EnvObject(bound) => {
                    for (name, value) in bound {
                        self.env.insert(name.clone(), value.clone());
                    }
                    Response::Bound
                }
                _ => {
                    let rendered = result.to_string();
                    self.env.insert("_".to_string(), result);
                    Response::Value(rendered)
                }
            },
            Err(e) => Response::Error(format!("error: {e}")),
        }
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_expressions() {
        let mut session = ReplSession::new();
        assert_eq!(session.feed("1 + 2"), Response::Value("3".to_string()));
    }

    #[test]
    fn bindings_persist_across_lines() {
        let mut session = ReplSession::new();
        assert_eq!(session.feed("x = 1"), Response::Bound);
        assert_eq!(session.feed("x + 1"), Response::Value("2".to_string()));
    }

    #[test]
    fn underscore_holds_the_last_value() {
        let mut session = ReplSession::new();
        session.feed("41 + 1");
        assert_eq!(session.feed("_"), Response::Value("42".to_string()));
    }

    #[test]
    fn prelude_is_available() {
        let mut session = ReplSession::new();
        assert_eq!(
            session.feed("quicksort [3, 1, 2]"),
            Response::Value("[1, 2, 3]".to_string())
        );
    }

    #[test]
    fn incomplete_expressions_continue() {
        let mut session = ReplSession::new();
        assert_eq!(session.feed("1 +"), Response::Incomplete);
        assert!(session.is_continuing());
        assert_eq!(session.feed("2"), Response::Value("3".to_string()));
        assert!(!session.is_continuing());
    }

    #[test]
    fn unterminated_strings_continue() {
        let mut session = ReplSession::new();
        assert_eq!(session.feed("\"abc"), Response::Incomplete);
        assert_eq!(session.feed("def\""), Response::Value("\"abc\\ndef\"".to_string()));
    }

    #[test]
    fn match_functions_wait_for_an_empty_line() {
        let mut session = ReplSession::new();
        assert_eq!(session.feed("| 1 -> 2"), Response::Incomplete);
        assert_eq!(session.feed("| 2 -> 3"), Response::Incomplete);
        match session.feed("") {
            Response::Value(rendered) => {
                assert!(rendered.contains("| 1 -> 2"), "{rendered}");
                assert!(rendered.contains("| 2 -> 3"), "{rendered}");
            }
            other => panic!("expected a value, got {other:?}"),
        }
    }

    #[test]
    fn cancel_drops_pending_input() {
        let mut session = ReplSession::new();
        session.feed("1 +");
        session.cancel();
        assert!(!session.is_continuing());
        assert_eq!(session.feed("5"), Response::Value("5".to_string()));
    }

    #[test]
    fn errors_are_rendered() {
        let mut session = ReplSession::new();
        match session.feed("nope") {
            Response::Error(message) => assert!(message.contains("nope"), "{message}"),
            other => panic!("expected an error, got {other:?}"),
        }
    }
}
