//! Calor CLI: run, generate and verify heat diffusion simulations.
//!
//! # Commands
//!
//! - `calor run <input.json>` - simulate and write the final state
//! - `calor generate --n 64` - write a random input grid
//! - `calor verify <input.json>` - compare a device run with the host reference
//! - `calor devices` - list platforms and devices
//!
//! # Examples
//!
//! ```bash
//! calor generate --n 128 --seed 7 -o grid.json
//! calor run grid.json --steps 500 -o result.json -vv
//! CALOR_DEVICE=1 calor verify grid.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use calor_engine::RunError;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod io;

use commands::HostArgs;

/// Grid-parallel explicit heat diffusion
#[derive(Parser)]
#[command(name = "calor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output (-v info, -vv debug with grid dumps, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an input grid and write the final temperatures
    Run {
        /// Input JSON file, or - for stdin
        input: PathBuf,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print phase timings to stderr
        #[arg(long)]
        metrics: bool,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Write a random input grid
    Generate {
        /// Grid dimension
        #[arg(long, default_value_t = 64)]
        n: usize,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Diffusion rate
        #[arg(long, default_value_t = calor_engine::puzzle::DEFAULT_ALPHA)]
        alpha: f32,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run on the selected device and the host reference and compare
    Verify {
        /// Input JSON file, or - for stdin
        input: PathBuf,

        /// Largest accepted per-cell difference
        #[arg(long, default_value_t = 0.0)]
        tolerance: f32,

        #[command(flatten)]
        host: HostArgs,
    },

    /// List platforms and devices
    Devices {
        #[command(flatten)]
        host: HostArgs,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            metrics,
            host,
        } => commands::run(&host, &input, output.as_deref(), metrics),
        Commands::Generate {
            n,
            seed,
            alpha,
            output,
        } => commands::generate(n, seed, alpha, output.as_deref()),
        Commands::Verify {
            input,
            tolerance,
            host,
        } => commands::verify(&host, &input, tolerance),
        Commands::Devices { host } => commands::devices(&host),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<RunError>() {
                Some(run) => eprintln!("fatal: {} failed: {run}", run.stage()),
                None => eprintln!("fatal: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
