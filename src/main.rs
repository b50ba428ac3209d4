//! Rep Counter CLI
//!
//! Replays recorded motion data through the counting pipeline and manages
//! the persisted workout settings.

use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::RecvTimeoutError;
use rep_counter::{
    config::Config,
    core::MotionEnergyClassifier,
    sensor::ReplaySource,
    session::{
        CompletedSet, HapticKind, HapticSink, SessionController, SessionEvent, SinkError,
        SyncSink,
    },
    stats::create_shared_stats_with_persistence,
    VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rep-counter")]
#[command(version = VERSION)]
#[command(about = "Count exercise repetitions from inertial sensor data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count reps in a recorded session (logger CSV format)
    Replay {
        /// Recording to replay
        #[arg(long, short)]
        input: PathBuf,

        /// Override the stored target rep count
        #[arg(long)]
        target_reps: Option<u32>,

        /// Play samples back at the sensor rate instead of as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Disable the per-rep haptic
        #[arg(long)]
        no_haptics: bool,
    },

    /// Set the target rep count
    Target {
        /// Reps per set
        reps: u32,
    },

    /// Turn per-rep haptics on or off
    Haptics {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Show settings and cumulative statistics
    Status,

    /// Show configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            input,
            target_reps,
            realtime,
            no_haptics,
        } => cmd_replay(input, target_reps, realtime, no_haptics),
        Commands::Target { reps } => cmd_target(reps),
        Commands::Haptics { state } => cmd_haptics(state),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Haptic sink for a terminal: prints the feedback instead of vibrating.
struct ConsoleHaptics;

impl HapticSink for ConsoleHaptics {
    fn trigger(&self, kind: HapticKind) -> Result<(), SinkError> {
        match kind {
            HapticKind::Rep => println!("  *tap*"),
            HapticKind::Goal => println!("  *success*"),
        }
        Ok(())
    }
}

/// Sync sink for a terminal: prints the record a paired phone would receive.
struct ConsoleSync;

impl SyncSink for ConsoleSync {
    fn notify_completed_set(&self, set: &CompletedSet) -> Result<(), SinkError> {
        let json =
            serde_json::to_string(set).map_err(|e| SinkError::Rejected(e.to_string()))?;
        println!("[Sync] {json}");
        Ok(())
    }
}

fn cmd_replay(input: PathBuf, target_reps: Option<u32>, realtime: bool, no_haptics: bool) {
    println!("Rep Counter v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {e}");
        Config::default()
    });
    if let Some(reps) = target_reps {
        config.target_reps = reps;
    }
    if no_haptics {
        config.haptics_enabled = false;
    }

    let source = match ReplaySource::from_csv_file(&input, realtime) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {input:?}: {e}");
            std::process::exit(1);
        }
    };

    println!("Replaying {} samples from {:?}", source.len(), input);
    println!(
        "  Window: {} samples ({:.1}s), classify every {:.2}s",
        config.counter.window_size,
        config.counter.window_duration_secs(),
        config.counter.classification_interval_secs()
    );
    println!("  Target: {} reps", config.target_reps);
    println!(
        "  Haptics: {}",
        if config.haptics_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();

    let stats = create_shared_stats_with_persistence(config.stats_path());
    let classifier = Arc::new(MotionEnergyClassifier::from_config(&config.counter));

    let mut session = match SessionController::with_stats(
        &config,
        classifier,
        Box::new(source),
        Arc::new(ConsoleHaptics),
        Arc::new(ConsoleSync),
        Arc::clone(&stats),
    ) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(Arc::clone(&running));

    if let Err(e) = session.start() {
        eprintln!("Error starting session: {e}");
        std::process::exit(1);
    }

    let events = session.events().clone();
    while running.load(Ordering::SeqCst) {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(SessionEvent::StreamEnded) => break,
            Ok(event) => print_event(&event),
            // StreamEnded may have been dropped by a full queue
            Err(RecvTimeoutError::Timeout) if session.stream_ended() => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    println!("Stopping session...");
    let completed = session.stop();
    for event in events.try_iter() {
        print_event(&event);
    }

    match completed {
        Some(set) => println!("Set complete: {} reps", set.rep_count),
        None => println!("No reps counted."),
    }

    // Let the notifier deliver the completed set before reporting
    drop(session);

    if let Err(e) = stats.save() {
        tracing::warn!("Could not save statistics: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::RepCompleted { count } => println!("Rep {count}"),
        SessionEvent::GoalReached { count } => println!("Goal reached at {count} reps!"),
        SessionEvent::StatusChanged { message } => tracing::debug!(%message, "status"),
        other => tracing::debug!(?other, "session event"),
    }
}

fn cmd_target(reps: u32) {
    let mut config = Config::load().unwrap_or_default();
    config.target_reps = reps;
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Target set to {reps} reps.");
}

fn cmd_haptics(state: Toggle) {
    let mut config = Config::load().unwrap_or_default();
    config.haptics_enabled = matches!(state, Toggle::On);
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!(
        "Haptics {}.",
        if config.haptics_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Rep Counter Status");
    println!("==================");
    println!();
    println!("Settings:");
    println!("  Target reps: {}", config.target_reps);
    println!(
        "  Haptics: {}",
        if config.haptics_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Confidence threshold: {:.2}",
        config.counter.confidence_threshold
    );
    println!(
        "  Confirmation: {} of {} windows",
        config.counter.confirmation_threshold, config.counter.history_size
    );
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        let stats = create_shared_stats_with_persistence(stats_path);
        let snapshot = stats.snapshot();
        println!("Cumulative Statistics:");
        println!("  Samples ingested: {}", snapshot.samples_ingested);
        println!("  Windows classified: {}", snapshot.windows_classified);
        println!("  Reps completed: {}", snapshot.reps_completed);
        println!("  Sets synced: {}", snapshot.sets_synced);
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        tracing::warn!("Could not install Ctrl+C handler: {e}");
    }
}
