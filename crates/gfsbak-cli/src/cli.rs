use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gfsbak",
    version,
    about = "Tiered GFS backup rotation for database hot copies",
    after_help = "\
Configuration file lookup order:
  1. --config <path>             (explicit flag)
  2. $GFSBAK_CONFIG              (environment variable)
  3. ./gfsbak.yaml               (project)
  4. Platform user config dir + /gfsbak/config.yaml (e.g. ~/.config)
  5. /etc/gfsbak/config.yaml     (system)

Environment variables:
  GFSBAK_CONFIG      Path to configuration file (overrides default search)
  GFSBAK_CREDENTIAL  Credential handed to the engine commands"
)]
pub(crate) struct Cli {
    /// Path to configuration file (overrides GFSBAK_CONFIG and default search)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Produce one backup of the given tier, cascading through missing
    /// coarser tiers first
    Backup {
        /// Retention tier: daily, weekly, monthly or annually
        tier: String,
    },

    /// Restore a backup instance by replaying its dependency chain
    Restore {
        /// Target instance: an absolute payload path, or `<tier>/<name>`
        target: String,
    },

    /// List backup instances and their chain parents
    List,

    /// Write a starter configuration file
    Config {
        /// Destination path (default: ./gfsbak.yaml)
        dest: Option<String>,
    },
}
