//! tessera.toml daemon configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Settings for one `tesserad` process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub role: Role,
    /// Directory holding the state database.
    pub data_dir: PathBuf,
    /// Blueprint file to reconcile against.
    pub blueprint: PathBuf,
    /// How often the blueprint file is checked for changes (e.g. "5s", "1m").
    pub poll_interval: String,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub log_filter: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            role: Role::Worker,
            data_dir: PathBuf::from("/var/lib/tessera"),
            blueprint: PathBuf::from("blueprint.toml"),
            poll_interval: "5s".to_string(),
            log_filter: None,
        }
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&content)?;
        config.poll_interval()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn poll_interval(&self) -> anyhow::Result<Duration> {
        parse_duration(&self.poll_interval)
    }

    /// Location of the state database inside `data_dir`.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tessera.redb")
    }
}

/// Parse a duration string like "30s", "5m", or bare seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let (digits, scale) = if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60)
    } else {
        (s, 1)
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration `{s}`"))?;
    if value == 0 {
        anyhow::bail!("duration `{s}` must be positive");
    }
    let secs = value
        .checked_mul(scale)
        .ok_or_else(|| anyhow::anyhow!("duration `{s}` is too large"))?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(5));
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/tessera/tessera.redb"));
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
role = "master"
data_dir = "/tmp/tessera"
blueprint = "/etc/tessera/cluster.toml"
poll_interval = "2m"
log_filter = "debug"
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.role, Role::Master);
        assert_eq!(config.blueprint, PathBuf::from("/etc/tessera/cluster.toml"));
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(120));
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_from_file_rejects_bad_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera.toml");
        std::fs::write(&path, "poll_interval = \"soon\"\n").unwrap();

        assert!(DaemonConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera.toml");
        let mut config = DaemonConfig::default();
        config.role = Role::Master;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(DaemonConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn test_oversized_interval_is_an_error() {
        let err = parse_duration("400000000000000000m").unwrap_err();
        assert!(err.to_string().contains("too large"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera.toml");
        std::fs::write(&path, "poll_interval = \"400000000000000000m\"\n").unwrap();
        assert!(DaemonConfig::from_file(&path).is_err());
    }
}
