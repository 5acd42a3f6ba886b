//! tesserad: the Tessera daemon.
//!
//! Compiles a blueprint and reconciles the local state store against it:
//! - `inspect` compiles a blueprint and prints the model
//! - `apply` runs one reconciliation pass
//! - `show` dumps the stored tables
//! - `run` keeps reconciling while the blueprint file changes
//!
//! # Usage
//!
//! ```text
//! tesserad run --config /etc/tessera/tessera.toml
//! tesserad apply --blueprint cluster.toml --role master --data-dir /var/lib/tessera
//! ```

mod daemon;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use tessera_core::{Blueprint, DaemonConfig, Role};
use tessera_policy::apply_policy;
use tessera_state::{Connection, Container, Placement, StateStore};

use crate::daemon::Reconciler;

const DEFAULT_LOG_FILTER: &str = "info,tessera=debug";

#[derive(Parser)]
#[command(name = "tesserad", about = "Tessera policy daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a blueprint and print the resulting model as JSON.
    Inspect {
        /// Blueprint file.
        blueprint: PathBuf,
    },

    /// Run a single reconciliation pass.
    Apply {
        /// Blueprint file.
        #[arg(long)]
        blueprint: PathBuf,

        /// Role of this node (`master` or `worker`).
        #[arg(long, default_value = "worker")]
        role: Role,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/tessera")]
        data_dir: PathBuf,
    },

    /// Print the stored connections, placements and containers as JSON.
    Show {
        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/tessera")]
        data_dir: PathBuf,
    },

    /// Reconcile on start and whenever the blueprint file changes.
    Run {
        /// Daemon configuration file (tessera.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overrides `role` from the config file.
        #[arg(long)]
        role: Option<Role>,

        /// Overrides `blueprint` from the config file.
        #[arg(long)]
        blueprint: Option<PathBuf>,

        /// Overrides `data_dir` from the config file.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { blueprint } => {
            init_tracing(cli.log_format, None);
            inspect(&blueprint)
        }
        Command::Apply {
            blueprint,
            role,
            data_dir,
        } => {
            init_tracing(cli.log_format, None);
            apply(&blueprint, role, &data_dir)
        }
        Command::Show { data_dir } => {
            init_tracing(cli.log_format, None);
            show(&data_dir)
        }
        Command::Run {
            config,
            role,
            blueprint,
            data_dir,
        } => {
            let config = daemon::load_config(config.as_deref(), role, blueprint, data_dir)?;
            init_tracing(cli.log_format, config.log_filter.as_deref());
            run(config).await
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `filter`.
fn init_tracing(format: LogFormat, filter: Option<&str>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter.unwrap_or(DEFAULT_LOG_FILTER)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)?;
    let blueprint = Blueprint::compile(&source)?;
    println!("{}", serde_json::to_string_pretty(&blueprint)?);
    Ok(())
}

fn open_store(data_dir: &Path) -> anyhow::Result<StateStore> {
    let config = DaemonConfig {
        data_dir: data_dir.to_path_buf(),
        ..DaemonConfig::default()
    };
    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = config.db_path();
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");
    Ok(store)
}

fn apply(blueprint: &Path, role: Role, data_dir: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(blueprint)?;
    let store = open_store(data_dir)?;
    let stats = apply_policy(&store, role, &source)?;
    println!("{}", serde_json::to_string_pretty(&daemon::stats_json(&stats))?);
    Ok(())
}

fn show(data_dir: &Path) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let tables = serde_json::json!({
        "connections": store.list::<Connection>()?,
        "placements": store.list::<Placement>()?,
        "containers": store.list::<Container>()?,
    });
    println!("{}", serde_json::to_string_pretty(&tables)?);
    Ok(())
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    info!(role = %config.role, blueprint = ?config.blueprint, "tessera daemon starting");

    let interval = config.poll_interval()?;
    let store = open_store(&config.data_dir)?;
    let mut reconciler = Reconciler::new(store, config.role, config.blueprint.clone());

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let reconcile_handle = tokio::spawn(async move {
        reconciler.run(interval, shutdown_rx).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = reconcile_handle.await;

    info!("tessera daemon stopped");
    Ok(())
}
