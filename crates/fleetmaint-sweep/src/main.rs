//! fleetmaint sweeper binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `FLEETMAINT_*` environment variables, opens the SQLite store and sweeps
//! every configured tenant, once or every `interval_secs`.
//!
//! ```sh
//! FLEETMAINT_TENANTS=<uuid>,<uuid> cargo run -p fleetmaint-sweep --bin sweeper -- --once
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use fleetmaint_store_sqlite::SqliteStore;
use fleetmaint_sweep::{MaintenanceEngine, SweepConfig, run_sweep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Fleet preventive-maintenance sweeper")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run a single sweep and exit, regardless of `run_once` in the config.
  #[arg(long)]
  once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("FLEETMAINT")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("tenants"),
    )
    .build()
    .context("failed to read config file")?;

  let cfg: SweepConfig = settings
    .try_deserialize()
    .context("failed to deserialise SweepConfig")?;

  if cfg.tenants.is_empty() {
    warn!("no tenants configured; nothing to sweep");
  }

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let engine = Arc::new(MaintenanceEngine::new(Arc::new(store)));

  let cancel = install_signal_handler();
  let run_once = cli.once || cfg.run_once;

  loop {
    for &tenant in &cfg.tenants {
      if cancel.is_cancelled() {
        break;
      }
      match run_sweep(Arc::clone(&engine), tenant, Utc::now(), cfg.max_concurrency, cancel.clone())
        .await
      {
        Ok(report) => {
          let json = serde_json::to_string(&report).context("failed to serialise sweep report")?;
          println!("{json}");
        }
        Err(e) => error!(%tenant, error = %e, "sweep failed"),
      }
    }

    if run_once || cancel.is_cancelled() {
      break;
    }

    tokio::select! {
      _ = cancel.cancelled() => break,
      _ = tokio::time::sleep(cfg.interval()) => {}
    }
  }

  info!("sweeper stopped");
  Ok(())
}

/// Cancel the returned token on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
  let token = CancellationToken::new();
  let trigger = token.clone();

  tokio::spawn(async move {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
      use tokio::signal::unix::{SignalKind, signal};
      match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
          tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
          }
        }
        Err(e) => {
          warn!(error = %e, "failed to install SIGTERM handler");
          let _ = ctrl_c.await;
          info!("received SIGINT, shutting down");
        }
      }
    }

    #[cfg(not(unix))]
    {
      let _ = ctrl_c.await;
      info!("received Ctrl+C, shutting down");
    }

    trigger.cancel();
  });

  token
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
