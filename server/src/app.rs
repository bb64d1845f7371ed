//! Core application

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::storage::AppStorage;
use crate::data::SqliteService;
use crate::data::filters::{Filter, FilterCompiler, columns, parse_filter};
use crate::data::sqlite::BaseQueries;
use crate::data::sqlite::repositories::{insert_user, list_users};
use crate::data::types::NewUser;

pub struct CoreApp {
    pub config: AppConfig,
    pub storage: AppStorage,
    pub database: SqliteService,
    pub queries: BaseQueries,
    pub compiler: FilterCompiler,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Commands::Compile { filter } => Self::compile_command(&cli_config, &filter),
            Commands::List { filter } => {
                let app = Self::init(&cli_config).await?;
                let result = app.list_command(&filter).await;
                app.database.close().await;
                result
            }
            Commands::Insert {
                name,
                address,
                education,
            } => {
                let app = Self::init(&cli_config).await?;
                let new_user = NewUser {
                    name,
                    address,
                    education,
                };
                let result = app.insert_command(&new_user).await;
                app.database.close().await;
                result
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init(&config).await?;

        let db_path = config
            .database
            .path
            .clone()
            .unwrap_or_else(|| storage.database_path());
        let database = SqliteService::init(&db_path, config.database.max_connections)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        let compiler = FilterCompiler::new(config.query.compiler_config());

        Ok(Self {
            config,
            storage,
            database,
            queries: BaseQueries::default(),
            compiler,
        })
    }

    /// Print the clause a filter compiles to; needs no database
    fn compile_command(cli: &CliConfig, filter_json: &str) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let filter: Filter =
            serde_json::from_str(filter_json).context("Failed to parse filter JSON")?;

        let clause = FilterCompiler::new(config.query.compiler_config()).compile(&filter)?;
        print_json(&clause)
    }

    async fn list_command(&self, filter_json: &str) -> Result<()> {
        let filter = parse_filter(
            filter_json,
            columns::USER_FILTERABLE,
            columns::USER_SORTABLE,
        )?;

        let rows = list_users(self.database.pool(), &self.queries, &self.compiler, &filter).await?;
        tracing::debug!(rows = rows.len(), "Listed users");
        print_json(&rows)
    }

    async fn insert_command(&self, new_user: &NewUser) -> Result<()> {
        let user = insert_user(self.database.pool(), new_user).await?;
        tracing::info!(id = %user.id, "User created");
        print_json(&user)
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries command output
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
