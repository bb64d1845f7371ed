use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DATA_DIR, ENV_DB, ENV_MAX_PAGE_SIZE, ENV_NULL_SAFE_FUNCTION,
};

#[derive(Parser)]
#[command(name = "userquery")]
#[command(version, about = "Filtered user listings over SQLite", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Data directory (holds the SQLite database)
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    /// SQLite database file (overrides the data directory default)
    #[arg(long, global = true, env = ENV_DB)]
    pub db: Option<PathBuf>,

    /// Function used for null-safe ordering (e.g. IFNULL, COALESCE)
    #[arg(long, global = true, env = ENV_NULL_SAFE_FUNCTION)]
    pub null_safe_function: Option<String>,

    /// Largest accepted page size (0 = unlimited)
    #[arg(long, global = true, env = ENV_MAX_PAGE_SIZE)]
    pub max_page_size: Option<u32>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the SQL clause and arguments a filter compiles to
    Compile {
        /// Filter document (JSON)
        #[arg(long, short = 'f', default_value = "{}")]
        filter: String,
    },
    /// List users matching a filter
    List {
        /// Filter document (JSON)
        #[arg(long, short = 'f', default_value = "{}")]
        filter: String,
    },
    /// Insert a user
    Insert {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        education: Option<String>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub null_safe_function: Option<String>,
    pub max_page_size: Option<u32>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        data_dir: cli.data_dir,
        db: cli.db,
        null_safe_function: cli.null_safe_function,
        max_page_size: cli.max_page_size,
    };
    (config, cli.command)
}
