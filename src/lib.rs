//! rTimeclock library root.
//! Exposes CLI parser, high-level run() function, and internal modules.

pub mod cli;
pub mod clock;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod store;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use std::env;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr, filtered by `RTIMECLOCK_LOG` (default: warn).
pub fn init_logging() {
    let filter = env::var("RTIMECLOCK_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    // già inizializzato (es. nei test): nessun problema
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg, cli.test),
        Commands::In { .. } | Commands::Out => cli::commands::clock::handle(&cli.command, cfg),
        Commands::Break { .. } => cli::commands::brk::handle(&cli.command, cfg),
        Commands::Status => cli::commands::status::handle(cfg),
        Commands::Watch => cli::commands::watch::handle(cfg),
        Commands::List { .. } => cli::commands::list::handle(&cli.command, cfg),
        Commands::Stats => cli::commands::stats::handle(cfg),
        Commands::Export { .. } => cli::commands::export::handle(&cli.command, cfg),
        Commands::Reconcile { .. } => cli::commands::reconcile::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
    }
}

/// Entry point usato da main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    init_logging();

    // 2️⃣ carica config UNA sola volta
    let mut cfg = Config::load()?;

    // 3️⃣ applica eventuali override da riga di comando
    if let Some(custom_db) = &cli.db {
        cfg.database = utils::path::expand_tilde_str(custom_db);
    }
    if let Some(user) = &cli.user {
        cfg.user_id = user.clone();
    }

    // 4️⃣ passa tutto al dispatcher
    dispatch(&cli, &cfg)
}
