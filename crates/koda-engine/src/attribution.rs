//! Error attribution: map a raw failure to one authored source line.
//!
//! Two passes:
//!
//! 1. Read the line the failure reports (first `:LINE:COL` in the stack,
//!    else the explicit line field) and undo the wrapper offset.
//! 2. For syntax errors whose reported line is missing or past the end,
//!    recompile growing prefixes of the source until one fails for a reason
//!    other than "input ended too early".
//!
//! The result is clamped into `[0, last non-blank line]`.

use std::sync::OnceLock;

use regex::Regex;

use koda_types::{ErrorKind, ScriptError, SourceText};

/// Compile-error phrasings that only mean the prefix is incomplete.
pub const INCOMPLETE_INPUT_PHRASES: &[&str] = &[
    "unexpected end of input",
    "unexpected token }",
    "unexpected token '}'",
];

fn stack_location() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":([0-9]+):([0-9]+)").expect("stack location pattern is valid"))
}

/// The first `:LINE:COL` line in a stack trace.
pub fn stack_line(stack: &str) -> Option<i64> {
    stack_location()
        .captures(stack)
        .and_then(|caps| caps.get(1))
        .and_then(|line| line.as_str().parse().ok())
}

/// First-pass candidate: reported line minus the wrapper, 0-based.
/// `-1` when nothing usable is reported.
pub fn reported_candidate(error: &ScriptError, line_offset: usize) -> i64 {
    let shift = 1 + line_offset as i64;
    let from_stack = error
        .stack
        .as_deref()
        .and_then(stack_line)
        .map(|line| line - shift);
    match from_stack {
        Some(candidate) if candidate != -1 => candidate,
        _ => error
            .line_number
            .map_or(-1, |line| i64::from(line) - shift),
    }
}

/// `true` if a prefix failed only because the input stopped mid-construct.
pub fn is_incomplete_input(error: &ScriptError) -> bool {
    let message = error.message.to_lowercase();
    INCOMPLETE_INPUT_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}

/// Attribute `error` to a 0-based line of `source`.
///
/// `compile_prefix` compiles a prefix of the source the same way the full
/// program was compiled (same wrapper and parameters). It is only called
/// for syntax errors that the first pass cannot place.
pub fn attribute<F>(
    error: &ScriptError,
    source: &SourceText,
    line_offset: usize,
    mut compile_prefix: F,
) -> usize
where
    F: FnMut(&str) -> Result<(), ScriptError>,
{
    let Some(last) = source.last_non_empty_line() else {
        return 0;
    };
    let last_line = last as i64;

    let mut candidate = reported_candidate(error, line_offset);
    log::debug!(target: "koda::attribution", "reported candidate {candidate} (last line {last})");

    if (candidate == -1 || candidate > last_line) && error.kind == ErrorKind::SyntaxError {
        candidate = bisect(source, last, &mut compile_prefix) as i64;
        log::debug!(target: "koda::attribution", "prefix recompilation chose line {candidate}");
    }

    candidate.clamp(0, last_line) as usize
}

/// The first prefix that fails for a genuine reason, else `last`.
fn bisect<F>(source: &SourceText, last: usize, compile_prefix: &mut F) -> usize
where
    F: FnMut(&str) -> Result<(), ScriptError>,
{
    for i in 0..=last {
        match compile_prefix(source.prefix(i)) {
            Ok(()) => continue,
            Err(err) if is_incomplete_input(&err) => continue,
            Err(err) => {
                log::trace!(target: "koda::attribution", "prefix {i} failed: {err}");
                return i;
            }
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never_compiles(_: &str) -> Result<(), ScriptError> {
        panic!("prefix recompilation should not run");
    }

    #[test]
    fn test_stack_line_takes_first_pair() {
        let stack = "TypeError: x\n    at f (<anonymous>:5:3)\n    at anonymous (<anonymous>:9:1)";
        assert_eq!(stack_line(stack), Some(5));
        assert_eq!(stack_line("no location here"), None);
    }

    #[test]
    fn test_candidate_from_stack() {
        let err = ScriptError::reference("cirle is not defined")
            .with_stack("ReferenceError: cirle is not defined\n    at anonymous (<anonymous>:4:1)");
        assert_eq!(reported_candidate(&err, 1), 2);
    }

    #[test]
    fn test_candidate_from_line_field() {
        let err = ScriptError::syntax("Unexpected number").at(koda_types::Span::point(3, 9));
        assert_eq!(reported_candidate(&err, 1), 1);
        assert_eq!(reported_candidate(&ScriptError::syntax("x"), 1), -1);
    }

    #[test]
    fn test_stack_pointing_at_prologue_falls_back_to_line_field() {
        let err = ScriptError::syntax("x")
            .with_stack("SyntaxError: x\n    at <anonymous>:1:1")
            .at(koda_types::Span::point(5, 1));
        assert_eq!(reported_candidate(&err, 1), 3);
    }

    #[test]
    fn test_runtime_error_uses_reported_line_only() {
        let source = SourceText::new("clear();\nfoo();\n");
        let err = ScriptError::reference("foo is not defined")
            .with_stack("ReferenceError: foo is not defined\n    at anonymous (<anonymous>:3:1)");
        assert_eq!(attribute(&err, &source, 1, never_compiles), 1);
    }

    #[test]
    fn test_runtime_error_without_location_clamps_to_zero() {
        let source = SourceText::new("a();\nb();");
        let err = ScriptError::type_error("boom");
        assert_eq!(attribute(&err, &source, 1, never_compiles), 0);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let source = SourceText::new("a\nb\n\n\n");
        let err = ScriptError::type_error("boom").at(koda_types::Span::point(40, 1));
        assert_eq!(attribute(&err, &source, 1, never_compiles), 1);
    }

    #[test]
    fn test_blank_source_attributes_to_zero() {
        let source = SourceText::new("\n   \n");
        let err = ScriptError::syntax("Unexpected end of input");
        assert_eq!(attribute(&err, &source, 1, never_compiles), 0);
    }

    #[test]
    fn test_prefix_recompilation_skips_incomplete_prefixes() {
        let source = SourceText::new("a\nb {\nc }\nd )\ne");
        let mut seen = Vec::new();
        let err = ScriptError::syntax("Unexpected end of input");
        let line = attribute(&err, &source, 1, |prefix| {
            seen.push(prefix.to_string());
            match prefix.lines().count() {
                2 | 3 => Err(ScriptError::syntax("Unexpected end of input")),
                4 => Err(ScriptError::syntax("Unexpected token ')'")),
                _ => Ok(()),
            }
        });
        assert_eq!(line, 3);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3], "a\nb {\nc }\nd )");
    }

    #[test]
    fn test_prefix_recompilation_exhausted_picks_last_line() {
        let source = SourceText::new("f(1)\n{\n\n");
        let err = ScriptError::syntax("Unexpected end of input").at(koda_types::Span::point(5, 1));
        let line = attribute(&err, &source, 1, |prefix| {
            if prefix.ends_with('{') {
                Err(ScriptError::syntax("Unexpected end of input"))
            } else {
                Ok(())
            }
        });
        assert_eq!(line, 1);
    }

    #[test]
    fn test_closing_brace_phrasings_are_incomplete() {
        assert!(is_incomplete_input(&ScriptError::syntax("Unexpected token '}'")));
        assert!(is_incomplete_input(&ScriptError::syntax("Unexpected token }")));
        assert!(is_incomplete_input(&ScriptError::syntax("Unexpected end of input")));
        assert!(!is_incomplete_input(&ScriptError::syntax("Invalid or unexpected token")));
        assert!(!is_incomplete_input(&ScriptError::syntax("Unexpected identifier 'x'")));
    }

    #[test]
    fn test_non_syntax_errors_never_recompile() {
        let source = SourceText::new("a\nb");
        let err = ScriptError::range("Maximum call stack size exceeded");
        assert_eq!(attribute(&err, &source, 1, never_compiles), 0);
    }
}
