//! Long-running reconcile loop.
//!
//! The blueprint file is re-read every poll interval and a pass runs only
//! when its content differs from the last source that was reconciled or
//! rejected. Storage failures leave the source unrecorded so the next tick
//! retries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use tessera_core::{DaemonConfig, Role};
use tessera_policy::{PolicyError, UpdateStats, apply_policy};
use tessera_state::StateStore;

/// Build the `run` configuration: the config file (or defaults), then any
/// flags given on the command line.
pub fn load_config(
    path: Option<&Path>,
    role: Option<Role>,
    blueprint: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<DaemonConfig> {
    let mut config = match path {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(role) = role {
        config.role = role;
    }
    if let Some(blueprint) = blueprint {
        config.blueprint = blueprint;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    Ok(config)
}

pub fn stats_json(stats: &UpdateStats) -> serde_json::Value {
    let table = |t: &tessera_policy::TableStats| {
        serde_json::json!({
            "inserted": t.inserted,
            "removed": t.removed,
            "committed": t.committed,
        })
    };
    serde_json::json!({
        "connections": table(&stats.connections),
        "placements": table(&stats.placements),
        "containers": table(&stats.containers),
    })
}

pub struct Reconciler {
    store: StateStore,
    role: Role,
    blueprint: PathBuf,
    last_source: Option<String>,
}

impl Reconciler {
    pub fn new(store: StateStore, role: Role, blueprint: PathBuf) -> Self {
        Self {
            store,
            role,
            blueprint,
            last_source: None,
        }
    }

    /// Reconcile if the blueprint changed since the last tick.
    ///
    /// Returns `Ok(None)` when the content is unchanged. A rejected
    /// blueprint is not retried until the file changes again.
    pub fn tick(&mut self) -> anyhow::Result<Option<UpdateStats>> {
        let source = std::fs::read_to_string(&self.blueprint)?;
        if self.last_source.as_deref() == Some(source.as_str()) {
            return Ok(None);
        }

        match apply_policy(&self.store, self.role, &source) {
            Ok(stats) => {
                self.last_source = Some(source);
                Ok(Some(stats))
            }
            Err(e @ PolicyError::InvalidBlueprint(_)) => {
                self.last_source = Some(source);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn run(&mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            blueprint = ?self.blueprint,
            "reconciler started"
        );

        self.tick_logged();

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => self.tick_logged(),
                _ = shutdown.changed() => {
                    info!("reconciler shutting down");
                    break;
                }
            }
        }
    }

    fn tick_logged(&mut self) {
        if let Err(e) = self.tick() {
            error!(error = %e, blueprint = ?self.blueprint, "reconcile pass failed");
        }
    }
}
