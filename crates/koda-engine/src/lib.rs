//! Koda engine: runs untrusted student drawing programs and attributes
//! failures to an authored source line.
//!
//! ```text
//! Source → Access Guard → wrap → Compiler → invoke with capabilities
//!                                   │ throw
//!                                   ▼
//!                          Error attribution → ExecutionOutcome → Reporter
//! ```

pub mod attribution;
pub mod compiler;
pub mod config;
pub mod guard;
pub mod outcome;
pub mod pipeline;
pub mod reporter;
pub mod suggest;

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use koda_surface::{
    clear_all, standard_capabilities, CapabilitySet, ConsoleBuffer, ConsoleLine, DrawCommand,
    RecordingSurface, SharedSurface,
};

pub use attribution::attribute;
pub use compiler::{CompiledBody, Compiler, Interpreter};
pub use config::{ConfigError, EngineConfig, ReporterConfig, SurfaceConfig};
pub use guard::{AccessGuard, DEFAULT_DENYLIST};
pub use outcome::ExecutionOutcome;
pub use pipeline::{Pipeline, Wrapper, DEFAULT_PROLOGUE};
pub use reporter::{EditorState, Reporter, Tone};

/// Everything one recorded run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedRun {
    pub outcome: ExecutionOutcome,
    pub commands: Vec<DrawCommand>,
    pub console: Vec<ConsoleLine>,
}

/// A configured engine. Immutable between runs.
#[derive(Debug)]
pub struct Engine<C = Interpreter> {
    config: EngineConfig,
    pipeline: Pipeline<C>,
    reporter: Reporter,
    capability_names: Vec<String>,
}

impl Engine<Interpreter> {
    /// An engine using the built-in interpreter.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let compiler = Interpreter::with_call_depth(config.max_call_depth);
        Self::with_compiler(config, compiler)
    }
}

impl<C: Compiler> Engine<C> {
    /// An engine compiling through `compiler`.
    pub fn with_compiler(config: EngineConfig, compiler: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let guard = AccessGuard::new(config.denylist.as_slice())
            .map_err(|err| ConfigError::Invalid(format!("denylist: {err}")))?;
        let wrapper = Wrapper::new(config.prologue.as_str());

        // Names only; the throwaway surface is never drawn on
        let scratch: SharedSurface = Rc::new(RefCell::new(RecordingSurface::new(1.0, 1.0, 1.0)));
        let capability_names: Vec<String> = standard_capabilities(scratch, &ConsoleBuffer::new())
            .names()
            .into_iter()
            .map(String::from)
            .collect();

        let reporter = Reporter::new(&config.reporter).with_suggestions(capability_names.clone());
        Ok(Self {
            pipeline: Pipeline::new(guard, wrapper, compiler),
            reporter,
            capability_names,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline<C> {
        &self.pipeline
    }

    /// Names of the standard capabilities, in binding order.
    pub fn capability_names(&self) -> &[String] {
        &self.capability_names
    }

    /// Run `source` against caller-provided capabilities.
    pub fn run(&self, source: &str, capabilities: &CapabilitySet) -> ExecutionOutcome {
        self.pipeline.run(source, capabilities)
    }

    /// Guard and compile `source` against the standard capability names.
    pub fn check(&self, source: &str) -> ExecutionOutcome {
        let names: Vec<&str> = self.capability_names.iter().map(String::as_str).collect();
        self.pipeline.check(source, &names)
    }

    /// Run `source` on a fresh recording surface sized from the config.
    ///
    /// The surface is cleared first, like a canvas before each run.
    pub fn run_recorded(&self, source: &str) -> RecordedRun {
        let size = &self.config.surface;
        let recording = Rc::new(RefCell::new(RecordingSurface::new(
            size.width,
            size.height,
            size.device_pixel_ratio,
        )));
        clear_all(&mut *recording.borrow_mut());

        let console = ConsoleBuffer::new();
        let surface: SharedSurface = recording.clone();
        let capabilities = standard_capabilities(surface, &console);
        let outcome = self.run(source, &capabilities);

        let commands = recording.borrow_mut().take_commands();
        RecordedRun {
            outcome,
            commands,
            console: console.take(),
        }
    }

    /// Editor state after `outcome`, starting from `previous`.
    pub fn report(&self, previous: EditorState, outcome: &ExecutionOutcome) -> EditorState {
        self.reporter.report(previous, outcome)
    }
}
