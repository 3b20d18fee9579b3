//! BBS CLI - front-end development gateway.
//!
//! Provides commands for:
//! - `serve`: Start the gateway (SPA, navigation gate, API proxy)
//! - `routes`: Print the route table
//! - `check`: Show how a navigation would be handled

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, RoutesArgs, ServeArgs};
use output::Output;

/// BBS - front-end development gateway.
#[derive(Parser)]
#[command(name = "bbs", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the development gateway.
    Serve(ServeArgs),
    /// Print the route table.
    Routes(RoutesArgs),
    /// Resolve a path and run the navigation gate on it.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Serve(args) => match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(args.execute()),
            Err(err) => Err(err.into()),
        },
        Commands::Routes(args) => args.execute(),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
