mod render;
mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use pmm_core::{Mode, PmmConfig, StdRandom};
use pmm_limbic::{EmotionEngine, HeartbeatConfig};
use pmm_memory::{Session, SessionHandle, Simulator};
use repl::{ReplCommand, HELP};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pmm",
    author,
    version,
    about = "Dynamic Brain PMM: a self-expanding plastic memory module simulation",
    long_about = None
)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "PMM_CONFIG", default_value = "pmm.toml")]
    config: PathBuf,

    /// Seed the random source for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Starting mode (inference or training)
    #[arg(short, long, default_value = "inference")]
    mode: Mode,

    /// Write logs to daily rolling files in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Run ';'-separated commands and exit instead of starting the REPL
    #[arg(short, long)]
    exec: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref())?;

    let config = PmmConfig::load_or_default(&args.config);
    let rng = match args.seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_entropy(),
    };
    let simulator = Simulator::new(Box::new(rng))
        .with_emotion_engine(EmotionEngine::new(config.emotion.learning_rate));
    let session = Session::new(config.brain.clone(), simulator)
        .context("Invalid brain configuration")?
        .with_mode(args.mode);

    info!(
        "Starting PMM session: {} slots (max {}), mode {}",
        config.brain.start_mem_slots, config.brain.max_mem_slots, args.mode
    );
    let handle = SessionHandle::spawn(session, HeartbeatConfig::from(&config.heartbeat));

    let outcome = match &args.exec {
        Some(script) => run_script(&handle, script).await,
        None => run_interactive(&handle).await,
    };

    handle.shutdown().await?;
    outcome
}

fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // The REPL owns stdout, so default to quiet stderr logging
    let default_level = if log_dir.is_some() { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "pmm.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

async fn run_script(handle: &SessionHandle, script: &str) -> Result<()> {
    for line in script.split(';').map(str::trim).filter(|l| !l.is_empty()) {
        let command = line
            .parse::<ReplCommand>()
            .map_err(|msg| anyhow::anyhow!("{msg}"))?;
        if execute(handle, command).await? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

async fn run_interactive(handle: &SessionHandle) -> Result<()> {
    let mut editor = DefaultEditor::new().context("Failed to initialize line editor")?;
    let history = history_path();
    if let Some(path) = &history {
        // Missing on first run
        let _ = editor.load_history(path);
    }

    let snapshot = handle.snapshot();
    println!(
        "Dynamic Brain PMM online. {} slots, {} mode. Type 'help' for commands.",
        snapshot.memory_capacity,
        handle.status().mode
    );

    loop {
        match editor.readline("pmm> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                match line.parse::<ReplCommand>() {
                    Ok(command) => match execute(handle, command).await {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => {
                            error!("Command failed: {:#}", e);
                            println!("[error] {e:#}");
                        }
                    },
                    Err(msg) => println!("{msg}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => anyhow::bail!("Failed to read input: {e}"),
        }
    }

    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = editor.save_history(path) {
            warn!("Failed to save REPL history to {}: {}", path.display(), e);
        }
    }
    Ok(())
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("pmm").join("history.txt"))
}

async fn execute(handle: &SessionHandle, command: ReplCommand) -> Result<Flow> {
    match command {
        ReplCommand::Step(count) => {
            let snapshot = handle.step(count).await?;
            println!("{}", render::status(&snapshot, &handle.status()));
        }
        ReplCommand::Run => {
            handle.set_running(true).await?;
            println!("Heartbeat running ({} mode).", handle.status().mode);
        }
        ReplCommand::Pause => {
            let snapshot = handle.set_running(false).await?;
            println!("Paused at tick {}.", snapshot.tick);
        }
        ReplCommand::Stress => {
            handle.toggle_stress().await?;
            let state = if handle.status().stress {
                "ENGAGED"
            } else {
                "released"
            };
            println!("Stress test {state}.");
        }
        ReplCommand::Mode(mode) => {
            handle.set_mode(mode).await?;
            println!("Mode set to {mode}. Heartbeat paused.");
        }
        ReplCommand::Flush(indices) => {
            let capacity = handle.snapshot().memory_capacity;
            if indices.iter().all(|i| *i >= capacity) {
                println!("No slot in range (capacity {capacity}).");
            } else {
                let snapshot = handle.flush_slots(indices).await?;
                print_latest_log(&snapshot);
            }
        }
        ReplCommand::Compress => {
            if handle.snapshot().idle_slots().is_empty() {
                println!("No idle slots to compress.");
            } else {
                let snapshot = handle.compress().await?;
                print_latest_log(&snapshot);
            }
        }
        ReplCommand::Expand => {
            let before = handle.snapshot().memory_capacity;
            let snapshot = handle.force_expand().await?;
            if snapshot.memory_capacity == before {
                println!("Capacity {before} is already at the ceiling.");
            } else {
                print_latest_log(&snapshot);
            }
        }
        ReplCommand::Say(text) => {
            let snapshot = handle.send_message(text).await?;
            if let Some(reply) = snapshot.chat_history.last() {
                println!("CORTEX: {}", reply.text);
            }
        }
        ReplCommand::Emotion(component, value) => {
            let snapshot = handle.override_emotion(component, value).await?;
            println!(
                "{component} = {:+.2} [{}]",
                snapshot.emotion.get(component),
                snapshot.emotion.mood()
            );
        }
        ReplCommand::Decode(index) => match handle.decode_slot(index).await? {
            Some(memory) => println!("{}", render::decoded(index, &memory)),
            None => println!(
                "Slot {index} is out of range ({} slots).",
                handle.snapshot().memory_capacity
            ),
        },
        ReplCommand::Status => {
            println!("{}", render::status(&handle.snapshot(), &handle.status()));
        }
        ReplCommand::Slots => println!("{}", render::slots(&handle.snapshot())),
        ReplCommand::Logs => println!("{}", render::logs(&handle.snapshot())),
        ReplCommand::Chat => println!("{}", render::chat(&handle.snapshot())),
        ReplCommand::Dump => {
            let json = serde_json::to_string_pretty(handle.snapshot().as_ref())
                .context("Failed to serialize snapshot")?;
            println!("{json}");
        }
        ReplCommand::Reset => {
            let snapshot = handle.reset().await?;
            println!("Cortex reinitialized: {} slots.", snapshot.memory_capacity);
        }
        ReplCommand::Load(path) => {
            let config = PmmConfig::load(&path)?;
            let snapshot = handle.apply_config(config.brain).await?;
            println!(
                "Loaded {}: {} slots (max {}).",
                path.display(),
                snapshot.memory_capacity,
                handle.status().config.max_mem_slots
            );
        }
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn print_latest_log(snapshot: &pmm_core::Snapshot) {
    if let Some(line) = snapshot.logs.latest() {
        println!("{line}");
    }
}
