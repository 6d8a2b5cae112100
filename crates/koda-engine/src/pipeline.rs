//! Execution pipeline: guard → wrap → compile → bind → invoke.

use koda_surface::CapabilitySet;
use koda_types::{ScriptError, SourceText};

use crate::attribution;
use crate::compiler::Compiler;
use crate::guard::AccessGuard;
use crate::outcome::ExecutionOutcome;

/// Line placed before the student's code.
pub const DEFAULT_PROLOGUE: &str = "\"use strict\";";

/// Wraps source text as `<prologue>\n<source>`.
///
/// Authored line `k` (1-based) becomes line `k + line_offset()` of the
/// compiled body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    prologue: String,
}

impl Wrapper {
    pub fn new(prologue: impl Into<String>) -> Self {
        Self {
            prologue: prologue.into(),
        }
    }

    pub fn wrap(&self, source: &str) -> String {
        format!("{}\n{}", self.prologue, source)
    }

    /// Lines the wrapper adds before the first authored line.
    pub fn line_offset(&self) -> usize {
        self.prologue.matches('\n').count() + 1
    }

    pub fn prologue(&self) -> &str {
        &self.prologue
    }
}

impl Default for Wrapper {
    fn default() -> Self {
        Self::new(DEFAULT_PROLOGUE)
    }
}

/// Runs one program per call. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct Pipeline<C> {
    guard: AccessGuard,
    wrapper: Wrapper,
    compiler: C,
}

impl<C: Compiler> Pipeline<C> {
    pub fn new(guard: AccessGuard, wrapper: Wrapper, compiler: C) -> Self {
        Self {
            guard,
            wrapper,
            compiler,
        }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    /// Guard, compile and invoke `source` with `capabilities` bound.
    pub fn run(&self, source: &str, capabilities: &CapabilitySet) -> ExecutionOutcome {
        log::debug!(
            target: "koda::pipeline",
            "run: {} bytes, {} capabilities",
            source.len(),
            capabilities.len()
        );
        if let Some(outcome) = self.reject(source) {
            return outcome;
        }

        let names = capabilities.names();
        let result = self
            .compiler
            .compile(&names, &self.wrapper.wrap(source))
            .and_then(|unit| self.compiler.invoke(&unit, capabilities.values()));

        match result {
            Ok(()) => ExecutionOutcome::Success,
            Err(err) => self.fail(err, source, &names),
        }
    }

    /// Guard and compile without invoking.
    pub fn check(&self, source: &str, names: &[&str]) -> ExecutionOutcome {
        log::debug!(target: "koda::pipeline", "check: {} bytes", source.len());
        if let Some(outcome) = self.reject(source) {
            return outcome;
        }
        match self.compiler.compile(names, &self.wrapper.wrap(source)) {
            Ok(_) => ExecutionOutcome::Success,
            Err(err) => self.fail(err, source, names),
        }
    }

    fn reject(&self, source: &str) -> Option<ExecutionOutcome> {
        let identifier = self.guard.check(source)?;
        log::warn!(target: "koda::pipeline", "rejected: uses {identifier:?}");
        Some(ExecutionOutcome::SecurityRejected {
            violating_identifier: identifier,
        })
    }

    fn fail(&self, raw_error: ScriptError, source: &str, names: &[&str]) -> ExecutionOutcome {
        let text = SourceText::new(source);
        let attributed_line =
            attribution::attribute(&raw_error, &text, self.wrapper.line_offset(), |prefix| {
                self.compiler
                    .compile(names, &self.wrapper.wrap(prefix))
                    .map(|_| ())
            });
        log::info!(
            target: "koda::pipeline",
            "failed on line {}: {raw_error}",
            attributed_line + 1
        );
        ExecutionOutcome::Failed {
            raw_error,
            attributed_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Interpreter;

    fn pipeline() -> Pipeline<Interpreter> {
        Pipeline::new(
            AccessGuard::standard().unwrap(),
            Wrapper::default(),
            Interpreter::new(),
        )
    }

    #[test]
    fn test_wrap_adds_one_line() {
        let wrapper = Wrapper::default();
        assert_eq!(wrapper.wrap("clear();"), "\"use strict\";\nclear();");
        assert_eq!(wrapper.line_offset(), 1);
    }

    #[test]
    fn test_offset_follows_prologue_lines() {
        let wrapper = Wrapper::new("\"use strict\";\nlet unused = 0;");
        assert_eq!(wrapper.line_offset(), 2);
        assert_eq!(Wrapper::new("// two\n\n").line_offset(), 3);

        let pipeline = Pipeline::new(AccessGuard::standard().unwrap(), wrapper, Interpreter::new());
        let outcome = pipeline.run("let a = 1;\nboom();", &CapabilitySet::new());
        assert_eq!(outcome.attributed_line(), Some(1));
        let outcome = pipeline.check("let a = 1;\n\nlet b = ;", &[]);
        assert_eq!(outcome.attributed_line(), Some(2));
    }

    #[test]
    fn test_check_compiles_without_running() {
        let outcome = pipeline().check("undefinedFunction();", &[]);
        assert_eq!(outcome, ExecutionOutcome::Success);
    }

    #[test]
    fn test_check_reports_syntax_errors() {
        let outcome = pipeline().check("let a = 1;\nlet b = ;", &[]);
        assert_eq!(outcome.attributed_line(), Some(1));
    }

    #[test]
    fn test_rejection_skips_compilation() {
        let outcome = pipeline().run("document.body", &CapabilitySet::new());
        assert_eq!(
            outcome,
            ExecutionOutcome::SecurityRejected {
                violating_identifier: "document".to_string()
            }
        );
    }

    #[test]
    fn test_prologue_makes_body_strict() {
        let outcome = pipeline().run("undeclared = 1;", &CapabilitySet::new());
        let err = outcome.error().expect("strict mode should reject");
        assert_eq!(err.message, "undeclared is not defined");
        assert_eq!(outcome.attributed_line(), Some(0));
    }
}
