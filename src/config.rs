// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, path::PathBuf, time::Duration};
use tracing::info;

use crate::fetch::urls::DEFAULT_PAGE_TEMPLATE;
use crate::plan::Bounds;
use crate::process::ReshapePolicy;
use crate::schema::{SchemaRegistry, TableSchema};

/// Runtime configuration, read from YAML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Page URL with `{period}` and `{region}` placeholders.
    pub base_url: String,
    pub staging_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Pause between two units of work.
    pub unit_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub reshape_policy: ReshapePolicy,
    pub periods: Bounds,
    pub regions: Bounds,
    /// Extra or replacement table schemas, keyed by table identifier.
    pub schemas: HashMap<String, TableSchema>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PAGE_TEMPLATE.to_string(),
            staging_dir: PathBuf::from("data/staging"),
            output_dir: PathBuf::from("data/final"),
            unit_delay_ms: 1_000,
            request_timeout_secs: 30,
            reshape_policy: ReshapePolicy::Strict,
            periods: Bounds::new(2016, 2022),
            regions: Bounds::new(1, 57),
            schemas: HashMap::new(),
        }
    }
}

impl Config {
    /// Load `path`, or fall back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text)?;
        if cfg.periods.min > cfg.periods.max || cfg.regions.min > cfg.regions.max {
            anyhow::bail!("bounds must satisfy min <= max");
        }
        Ok(cfg)
    }

    pub fn unit_delay(&self) -> Duration {
        Duration::from_millis(self.unit_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Built-in schemas with the configured overrides applied.
    pub fn schema_registry(&self) -> SchemaRegistry {
        SchemaRegistry::builtin().with_overrides(self.schemas.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueKind;

    #[test]
    fn empty_yaml_is_default() -> Result<()> {
        assert_eq!(Config::from_yaml("{}")?, Config::default());
        Ok(())
    }

    #[test]
    fn parses_overrides() -> Result<()> {
        let cfg = Config::from_yaml(
            r#"
staging_dir: /tmp/stage
unit_delay_ms: 0
reshape_policy: drop_remainder
periods: { min: 2018, max: 2023 }
schemas:
  ic3__crime_type_by_victim_count:
    - { name: Crime Type, kind: text }
    - { name: Victim Count, kind: integer }
"#,
        )?;
        assert_eq!(cfg.staging_dir, PathBuf::from("/tmp/stage"));
        assert_eq!(cfg.unit_delay(), Duration::ZERO);
        assert_eq!(cfg.reshape_policy, ReshapePolicy::DropRemainder);
        assert_eq!(cfg.periods, Bounds::new(2018, 2023));
        assert_eq!(cfg.regions, Bounds::new(1, 57));

        let reg = cfg.schema_registry();
        let schema = reg.resolve("ic3__crime_type_by_victim_count");
        assert_eq!(schema.columns[1].kind, ValueKind::Integer);
        Ok(())
    }

    #[test]
    fn rejects_unknown_keys_and_inverted_bounds() {
        assert!(Config::from_yaml("stagin_dir: x").is_err());
        assert!(Config::from_yaml("regions: { min: 9, max: 1 }").is_err());
    }

    #[test]
    fn missing_file_is_default() -> Result<()> {
        let tmp = tempfile::TempDir::new()?;
        assert_eq!(Config::load(tmp.path().join("nope.yaml"))?, Config::default());
        Ok(())
    }
}
