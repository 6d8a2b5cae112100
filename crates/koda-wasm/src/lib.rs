//! Koda engine as a WASM module for the browser editor.
//!
//! Every entry point returns a JSON string; the host page replays the draw
//! commands onto its canvas and applies the editor state.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { run } from 'koda-wasm';
//!
//! await init();
//!
//! const result = JSON.parse(run("circle(250, 250, 30, 'red');", 500, 500, devicePixelRatio));
//! // { outcome: { kind: "success" }, commands: [...], console: [], state: { status: ... } }
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;

use koda_engine::{EditorState, Engine, EngineConfig, ExecutionOutcome, RecordedRun, DEFAULT_DENYLIST};

#[derive(Serialize)]
struct RunResult {
    #[serde(flatten)]
    run: RecordedRun,
    state: EditorState,
}

#[derive(Serialize)]
struct CheckResult {
    outcome: ExecutionOutcome,
    state: EditorState,
}

/// Run a program on a `width` × `height` surface.
///
/// Returns a JSON `RunResult`:
/// ```json
/// {
///   "outcome": { "kind": "failed", "raw_error": { ... }, "attributed_line": 2 },
///   "commands": [{ "op": "clear_rect", ... }],
///   "console": [],
///   "state": { "status": "Error on line 3.", "tone": "danger", "active_error_line": 2, "scroll_top": 0.0 }
/// }
/// ```
#[wasm_bindgen]
pub fn run(source: &str, width: f64, height: f64, device_pixel_ratio: f64) -> String {
    let mut config = EngineConfig::default();
    config.surface.width = width;
    config.surface.height = height;
    config.surface.device_pixel_ratio = device_pixel_ratio;
    run_configured(source, config)
}

/// Like [`run`], with a full JSON engine config.
#[wasm_bindgen]
pub fn run_with_config(source: &str, config_json: &str) -> String {
    match EngineConfig::from_json_str(config_json) {
        Ok(config) => run_configured(source, config),
        Err(e) => error_json(&format!("Config error: {e}")),
    }
}

/// Compile a program without running it.
#[wasm_bindgen]
pub fn check(source: &str) -> String {
    let engine = match Engine::new(EngineConfig::default()) {
        Ok(engine) => engine,
        Err(e) => return error_json(&format!("Config error: {e}")),
    };
    let outcome = engine.check(source);
    let state = engine.report(EditorState::default(), &outcome);
    to_json(&CheckResult { outcome, state })
}

/// The default denylist as a JSON array.
#[wasm_bindgen]
pub fn denylist() -> String {
    to_json(&DEFAULT_DENYLIST)
}

/// Return the engine version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn run_configured(source: &str, config: EngineConfig) -> String {
    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => return error_json(&format!("Config error: {e}")),
    };
    let run = engine.run_recorded(source);
    let state = engine.report(EditorState::running(), &run.outcome);
    to_json(&RunResult { run, state })
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| error_json(&format!("Serialization error: {e}")))
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
