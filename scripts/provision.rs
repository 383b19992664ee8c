#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cockpit_lib::config::AppConfig;
use cockpit_lib::repo::Repo;
use cockpit_lib::schema;

/// Idempotently create every sheet the application expects, writing the
/// header rows where they are missing. Existing data is never touched:
/// a table whose column count differs from the contract is skipped with
/// a warning.
#[derive(Parser)]
#[command(name = "provision", about = "Cockpit sheet provisioning helper")]
struct Cli {
    /// Optional explicit config path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("COCKPIT_LOG").unwrap_or_else(|_| "cockpit=info".into()))
        .json()
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init();

    let cli = Cli::parse();
    let path = AppConfig::resolve_path(cli.config).context("resolve config path")?;
    let config = AppConfig::load(&path).context("load configuration")?;
    let store = config.store_handle().context("build store client")?;
    let repo = Repo::new(store);

    for (table, headers) in schema::ALL_TABLES {
        repo.ensure_sheet_exists(table, headers)
            .await
            .with_context(|| format!("provision table {table}"))?;
        println!("{table:<26} ok ({} columns)", headers.len());
    }
    Ok(())
}
