use clap::{Parser, Subcommand};
use reelguard_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "reelguard", version, about = "ReelGuard CLI")]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's usage and history
    Usage {
        #[command(subcommand)]
        action: commands::usage::UsageAction,
    },
    /// Daily limit
    Limit {
        #[command(subcommand)]
        action: commands::limit::LimitAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Classify a UI snapshot
    Classify(commands::classify::ClassifyArgs),
    /// Feed recorded events through the enforcement pipeline
    Replay(commands::replay::ReplayArgs),
    /// Print usage status as it changes
    Watch(commands::watch::WatchArgs),
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            let configured = Config::load_or_default().logging.filter;
            EnvFilter::try_new(&configured).unwrap_or_else(|_| EnvFilter::new("info"))
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Usage { action } => commands::usage::run(action),
        Commands::Limit { action } => commands::limit::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Classify(args) => commands::classify::run(args),
        Commands::Replay(args) => commands::replay::run(args),
        Commands::Watch(args) => commands::watch::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
