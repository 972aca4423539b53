use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use riverwood::cli::commands::{self, RunOptions};
use riverwood::config::simulation::SimulationConfig;

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser)]
#[command(name = "riverwood")]
#[command(about = "A forest and river landscape where deforestation invites natural disasters")]
#[command(version)]
struct Cli {
    /// Path to the configuration file. Defaults to config.toml when present.
    #[arg(short, long)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation headless for a number of ticks
    Run {
        /// Number of ticks to advance
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,

        /// Mass-cut this fraction of the forest (0-1]
        #[arg(long)]
        cut_fraction: Option<f32>,

        /// Tick at which the mass cut happens
        #[arg(long, default_value_t = 0)]
        cut_at: u64,

        /// Log statistics every N ticks (0 disables)
        #[arg(short, long, default_value_t = 60)]
        every: u64,
    },

    /// Print the initial landscape
    Inspect {
        /// Print the full snapshot as JSON instead of a map
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&str>) -> Result<SimulationConfig, String> {
    match path {
        Some(path) => SimulationConfig::from_file(Path::new(path)),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            SimulationConfig::from_file(Path::new(DEFAULT_CONFIG))
        }
        None => Ok(SimulationConfig::default()),
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level, cli.log_json);

    match cli.command {
        Commands::Run {
            ticks,
            cut_fraction,
            cut_at,
            every,
        } => {
            let options = RunOptions {
                ticks,
                cut_fraction,
                cut_at,
                every,
            };
            match commands::run_simulation(&config, &options) {
                Ok(stats) => commands::print_summary(&stats),
                Err(e) => {
                    eprintln!("Simulation error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Inspect { json } => {
            if let Err(e) = commands::inspect(&config, json) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
