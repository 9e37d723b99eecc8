mod cli;
mod cmd;
mod config_gen;
mod table;

use clap::Parser;

use gfsbak_core::config;
use gfsbak_core::error::GfsbakError;

use cli::{Cli, Commands};

/// Pre-flight failures (config, guard) exit 2 — nothing was mutated.
/// Operation failures exit 1 — a mutation was attempted but didn't finish.
fn exit_code(error: &GfsbakError) -> i32 {
    if error.is_preflight() {
        2
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // `config` needs no config file.
    if let Commands::Config { dest } = &cli.command {
        if let Err(e) = config_gen::run(dest.as_deref()) {
            eprintln!("Error: {e}");
            std::process::exit(exit_code(&e));
        }
        return;
    }

    let source = match config::resolve_config_path(cli.config.as_deref()) {
        Some(s) => s,
        None => {
            eprintln!("Error: no configuration file found.");
            eprintln!("Searched:");
            for (path, level) in config::default_config_search_paths() {
                eprintln!("  {} ({level})", path.display());
            }
            eprintln!();
            eprintln!("Run `gfsbak config` to generate a starter config file.");
            std::process::exit(2);
        }
    };
    tracing::info!("Using config: {source}");

    let config = match config::load_config(source.path()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(exit_code(&e));
        }
    };

    let result = match &cli.command {
        Commands::Backup { tier } => cmd::backup::run(&config, tier),
        Commands::Restore { target } => cmd::restore::run(&config, target),
        Commands::List => cmd::list::run(&config),
        Commands::Config { .. } => unreachable!("handled above"),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(exit_code(&e));
    }
}
