//! The restricted `console` object exposed to student code.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use koda_eval::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Log,
    Error,
}

/// One `console.log` / `console.error` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Per-run console output, shared between the capability and the host.
#[derive(Debug, Clone, Default)]
pub struct ConsoleBuffer(Rc<RefCell<Vec<ConsoleLine>>>);

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: ConsoleLevel, text: String) {
        match level {
            ConsoleLevel::Log => log::info!(target: "koda::console", "{text}"),
            ConsoleLevel::Error => log::warn!(target: "koda::console", "{text}"),
        }
        self.0.borrow_mut().push(ConsoleLine { level, text });
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.0.borrow().clone()
    }

    pub fn take(&self) -> Vec<ConsoleLine> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Arguments rendered the way a developer console prints them.
pub fn format_args(args: &[Value]) -> String {
    args.iter().map(Value::inspect).collect::<Vec<_>>().join(" ")
}

/// Build the `console` object writing into `buffer`.
pub fn console_object(buffer: &ConsoleBuffer) -> Value {
    let method = |name: &'static str, level: ConsoleLevel| {
        let buffer = buffer.clone();
        let func = Value::native(name, move |args| {
            buffer.push(level, format_args(args));
            Ok(Value::Undefined)
        });
        (name.to_string(), func)
    };
    Value::object([
        method("log", ConsoleLevel::Log),
        method("error", ConsoleLevel::Error),
    ])
}
