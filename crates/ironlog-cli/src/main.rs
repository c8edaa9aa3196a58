use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;
mod notifier;
mod watch;

#[derive(Parser)]
#[command(name = "ironlog", version, about = "Rest timer and drill sequencer for ironlog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rest timer between sets
    Rest {
        #[command(subcommand)]
        action: commands::rest::RestAction,
    },
    /// Auto-advancing drill sequence
    Drill {
        #[command(subcommand)]
        action: commands::drill::DrillAction,
    },
    /// Active workout and set completion
    Workout {
        #[command(subcommand)]
        action: commands::workout::WorkoutAction,
    },
    /// Rest timer presets
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("IRONLOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Rest { action } => commands::rest::run(action),
        Commands::Drill { action } => commands::drill::run(action),
        Commands::Workout { action } => commands::workout::run(action),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "ironlog", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
