use clap::Parser;
use log::info;
use value_controller::config;
use value_controller::game::{Game, GameOptions};
use value_controller::logging;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seconds of wall-clock time to simulate.
    #[arg(long, default_value_t = config::DEFAULT_RUN_SECONDS)]
    seconds: f64,

    /// Seed for the frame time generator.
    #[arg(long, default_value_t = config::DEFAULT_SEED)]
    seed: u64,

    /// Frame time jitter as a fraction of the target frame time (0 to 0.9).
    #[arg(long, default_value_t = config::DEFAULT_FRAME_JITTER)]
    jitter: f64,

    /// Suspend the village at this many seconds.
    #[arg(long)]
    pause_at: Option<f64>,

    /// Resume the village at this many seconds, ignoring the idle time.
    #[arg(long)]
    resume_at: Option<f64>,

    /// Debug filter to specify log topics (e.g., "controller,value,village")
    #[arg(long)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Err(e) = logging::init_logger(logging::parse_level(&args.log_level), args.debug_filter) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    info!("Initializing village...");
    let mut game = Game::new(GameOptions {
        seconds: args.seconds,
        seed: args.seed,
        jitter: args.jitter,
        pause_at: args.pause_at,
        resume_at: args.resume_at,
    })?;

    let report = game.run();
    println!("{}", report);
    Ok(())
}
