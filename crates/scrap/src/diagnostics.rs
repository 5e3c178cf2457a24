//! Diagnostic rendering for syntax errors.

use ariadne::{Label, Report, ReportKind, Source};
use scrap_parser::SyntaxError;

/// Print an ariadne report for a lex or parse error, labeling the
/// offending source extent when one is known.
pub fn report_syntax_error(source: &str, error: &SyntaxError) {
    let (message, range) = match error {
        SyntaxError::Lex(e) => (e.to_string(), Some(e.extent.byte_range())),
        SyntaxError::Parse(e) => (e.to_string(), e.extent().map(|x| x.byte_range())),
    };
    if source.is_empty() {
        eprintln!("error: {message}");
        return;
    }
    // Errors with no extent (unexpected end of input) point at the end of
    // the source.
    let end = source.len();
    let mut range = range.unwrap_or(end - 1..end);
    if range.end > end {
        range = end - 1..end;
    }
    let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, range.clone())
        .with_message("Syntax error")
        .with_label(Label::new(range).with_message(&message))
        .finish()
        .eprint(Source::from(source));
}
