use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use koda_engine::{EditorState, Engine, EngineConfig, ExecutionOutcome, RecordedRun};
use koda_surface::{ConsoleLevel, DrawCommand};

#[derive(Parser)]
#[command(name = "koda")]
#[command(about = "Run student drawing programs and locate their errors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON engine config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program on a recording surface
    Run {
        /// Program file, or - for stdin
        file: String,

        /// Print the whole run as JSON
        #[arg(long)]
        json: bool,

        /// List the draw commands
        #[arg(long)]
        commands: bool,

        /// Surface width in CSS pixels
        #[arg(long)]
        width: Option<f64>,

        /// Surface height in CSS pixels
        #[arg(long)]
        height: Option<f64>,

        /// Device pixel ratio
        #[arg(long)]
        dpr: Option<f64>,
    },

    /// Compile a program without running it
    Check {
        /// Program file, or - for stdin
        file: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    run: &'a RecordedRun,
    state: EditorState,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    outcome: &'a ExecutionOutcome,
    state: EditorState,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_module("koda", log::LevelFilter::Debug);
    }
    logger.init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Run {
            file,
            json,
            commands,
            width,
            height,
            dpr,
        } => {
            apply_overrides(&mut config, width, height, dpr);
            let engine = Engine::new(config).context("Invalid engine config")?;
            let source = read_source(&file)?;

            let run = engine.run_recorded(&source);
            let state = engine.report(EditorState::running(), &run.outcome);

            if json {
                let report = JsonReport { run: &run, state };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in &run.console {
                    match line.level {
                        ConsoleLevel::Log => println!("{}", line.text),
                        ConsoleLevel::Error => eprintln!("{}", line.text),
                    }
                }
                if commands {
                    print_commands(&run.commands);
                }
                print_status(&source, &run.outcome, &state);
            }
            Ok(ExitCode::from(exit_status(&run.outcome)))
        }

        Commands::Check { file, json } => {
            let engine = Engine::new(config).context("Invalid engine config")?;
            let source = read_source(&file)?;

            let outcome = engine.check(&source);
            let state = engine.report(EditorState::default(), &outcome);

            if json {
                let report = JsonCheck {
                    outcome: &outcome,
                    state,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_status(&source, &outcome, &state);
            }
            Ok(ExitCode::from(exit_status(&outcome)))
        }
    }
}

/// Command-line surface flags win over the config file.
fn apply_overrides(
    config: &mut EngineConfig,
    width: Option<f64>,
    height: Option<f64>,
    dpr: Option<f64>,
) {
    if let Some(width) = width {
        config.surface.width = width;
    }
    if let Some(height) = height {
        config.surface.height = height;
    }
    if let Some(dpr) = dpr {
        config.surface.device_pixel_ratio = dpr;
    }
}

fn read_source(file: &str) -> Result<String> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read program from stdin")?;
        return Ok(source);
    }
    let path = Path::new(file);
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_commands(commands: &[DrawCommand]) {
    for command in commands {
        match serde_json::to_string(command) {
            Ok(line) => println!("{line}"),
            Err(err) => log::warn!("unprintable draw command: {err}"),
        }
    }
}

fn print_status(source: &str, outcome: &ExecutionOutcome, state: &EditorState) {
    match state.active_error_line {
        Some(line) => {
            eprintln!("{}", state.status);
            if let Some(error) = outcome.error() {
                eprintln!("  {error}");
            }
            if let Some(text) = source.lines().nth(line) {
                eprintln!("  {:>4} | {text}", line + 1);
            }
        }
        None if outcome.is_success() => println!("{}", state.status),
        None => eprintln!("{}", state.status),
    }
}

/// 0 on success, 1 on a failed run, 2 on a rejected one.
fn exit_status(outcome: &ExecutionOutcome) -> u8 {
    match outcome {
        ExecutionOutcome::Success => 0,
        ExecutionOutcome::Failed { .. } => 1,
        ExecutionOutcome::SecurityRejected { .. } => 2,
    }
}
