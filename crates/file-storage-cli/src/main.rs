//! fstor - operator CLI for the broker's database-backed file storage
//!
//! Reads configuration from the environment (`DATABASE_URL`, `FILE_STORAGE`,
//! `FILE_CACHE`, `FILE_STORAGE_OWNER`). Logs go to stderr so file content can
//! be streamed to stdout.

mod args;
mod commands;
mod error;

use crate::args::{Cli, Command};
use crate::error::Result;
use clap::Parser;
use file_storage::{Config, FileStorage, PgRecordStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Directives applied on top of `RUST_LOG`
const DEFAULT_DIRECTIVES: [&str; 2] = ["file_storage=info", "fstor=info"];

fn env_filter() -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = env_filter()?;

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let mut config = Config::from_env();
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    debug!(base_url = %config.base_url, owner = %config.owner, "Loaded configuration");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;

    if cli.command == Command::Migrate {
        file_storage_db::migrate::migrate(&pool).await?;
        return Ok(());
    }

    let storage = FileStorage::new(Arc::new(PgRecordStore::new(pool)), &config).await;
    let mut stdout = tokio::io::stdout();
    commands::run(&storage, cli.command, &mut stdout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_logs_storage_at_info() {
        let filter = env_filter().unwrap().to_string();
        assert!(filter.contains("file_storage=info"));
        assert!(filter.contains("fstor=info"));
    }
}
