//! xpathcut entrypoint.
//!
//! Startup shape (`configure_logging`/`install_panic_hook`, run-then-report)
//! follows `AppStartup` in the teacher pack's `ox-bin/src/main.rs`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use xpathcut::automaton::Automaton;
use xpathcut::config::{self, Mode};
use xpathcut::engine;
use xpathcut::error::RunError;

/// Evaluate an absolute child-axis XPath over an XML file, splitting the
/// work across chunks when the config asks for it.
#[derive(Parser, Debug)]
#[command(name = "xpathcut", version, about = "Data-parallel XPath text extractor")]
struct Args {
    /// Path to the run config file.
    #[arg(default_value = "config")]
    config: PathBuf,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        AppStartup { log_guard: None }
    }

    fn configure_logging(&mut self) {
        let log_dir = Path::new(".");
        let file_appender = tracing_appender::rolling::never(log_dir, "xpathcut.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        let result = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(writer)
            .try_init();
        if result.is_ok() {
            self.log_guard = Some(guard);
        }
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging();
    AppStartup::install_panic_hook();

    let args = Args::parse();
    let config = config::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    tracing::info!(xpath = %config.xpath, file = %config.file_name.display(), "starting run");

    let automaton = Automaton::compile(&config.xpath)
        .with_context(|| format!("compiling XPath `{}`", config.xpath))?;

    let input = std::fs::read(&config.file_name).map_err(|source| RunError::Io {
        path: config.file_name.clone(),
        source,
    })?;

    print_automaton(&automaton);

    let parse_start = Instant::now();
    let outcome = match config.mode {
        Mode::Sequential => engine::run_sequential(&automaton, &input),
        Mode::Parallel { threads } => engine::run_parallel(&automaton, &input, threads),
    };
    let parse_duration = parse_start.elapsed();

    print_result(&outcome);
    println!("The duration for parsing and merging is {:.6} seconds", parse_duration.as_secs_f64());

    Ok(())
}

fn print_automaton(automaton: &Automaton) {
    for edge in automaton.edges_forward() {
        println!(
            "{} ({}:{}[{}]) {}",
            edge.from,
            String::from_utf8_lossy(&edge.label),
            if edge.to > edge.from { "open" } else { "close" },
            edge.emits,
            edge.to
        );
    }
    for edge in automaton.edges_reverse() {
        println!(
            "{} ({}:{}[{}]) {}",
            edge.from,
            String::from_utf8_lossy(&edge.label),
            if edge.to > edge.from { "open" } else { "close" },
            edge.emits,
            edge.to
        );
    }
}

fn print_result(outcome: &engine::RunOutcome) {
    match (&outcome.result, &outcome.first_error) {
        (Some(result), _) => {
            println!(
                "The mapping for this part is: {}, {:?}, {}, {:?}, {:?}",
                result.begin, result.begin_stack, result.end, result.end_stack, result.outputs
            );
        }
        (None, Some(error)) => {
            println!("The mapping for this part is null, please check the XPath command.");
            println!("Reason: {error}");
        }
        (None, None) => {
            println!("The mapping for this part is null, please check the XPath command.");
        }
    }
}
