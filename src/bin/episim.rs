//! Command-line entry point: run a scenario file and export the series.
use std::path::PathBuf;

use ::log::info;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use episim::io::debug_log::write_run_log;
use episim::io::series_csv::{save_series_csv, write_series_csv};
use episim::Scenario;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log level (off, error, warn, info, debug, trace); EPISIM_LOG_LEVEL takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and write the series as CSV.
    Run {
        /// Path to the scenario TOML file.
        scenario: PathBuf,
        /// CSV output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory for the log file and the run log
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Print the default scenario as TOML.
    Defaults,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { scenario, output, log_dir } => {
            // Keep stdout clean when the CSV goes there.
            let default_level = if output.is_some() { "info" } else { "warn" };
            episim::log::init(Some(cli.log_level.as_deref().unwrap_or(default_level)), log_dir.as_deref())?;

            let sc = Scenario::from_path(&scenario)?;
            let series = episim::run(&sc).with_context(|| format!("simulation of {} failed", scenario.display()))?;

            match &output {
                Some(path) => {
                    save_series_csv(path, &series)?;
                    info!("wrote {} days to {}", series.days(), path.display());
                }
                None => write_series_csv(std::io::stdout().lock(), &series)?,
            }

            if let Some(dir) = log_dir {
                let stem = scenario.file_stem().and_then(|s| s.to_str()).unwrap_or("scenario");
                let run_id = format!("{}-{}", stem, Local::now().format("%Y%m%d%H%M%S"));
                let path = write_run_log(&dir, &run_id, &sc, &series)?;
                info!("run log written to {}", path.display());
            }
        }
        Commands::Defaults => print!("{}", Scenario::default().to_toml()?),
    }
    Ok(())
}
