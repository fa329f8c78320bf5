// src/staging/store.rs

use anyhow::{bail, Context, Result};
use chrono::Utc;
use glob::{glob, Pattern};
use serde::Serialize;
use std::{
    collections::BTreeSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use super::{StagedTable, StagingManifest, UnitKey};
use crate::process::sanitize::is_storage_name;
use crate::process::{ColumnSet, NormalizedRecord};

const STAGED_EXT: &str = "json";
const MANIFEST_FILE: &str = "_unit.manifest";

/// Durable checkpoint between extraction and transform: one JSON file per
/// table under `<root>/<period>/<region>/`, plus a manifest once the unit
/// is completely staged.
#[derive(Debug, Clone)]
pub struct StagingStore {
    root: PathBuf,
}

impl StagingStore {
    /// Open the store at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating staging directory {:?}", &root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every staged table of `key`. Fails for a region
    /// that is not a single path entry.
    pub fn namespace(&self, key: &UnitKey) -> Result<PathBuf> {
        if !is_storage_name(&key.region) {
            bail!("region {:?} is not a valid storage name", key.region);
        }
        Ok(self.root.join(key.period.to_string()).join(&key.region))
    }

    fn table_path(&self, key: &UnitKey, table: &str) -> Result<PathBuf> {
        if !is_storage_name(table) {
            bail!("table {:?} is not a valid storage name", table);
        }
        Ok(self.namespace(key)?.join(format!("{}.{}", table, STAGED_EXT)))
    }

    /// Serialize `value` next to `path` and rename it into place.
    fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let dir = path
            .parent()
            .with_context(|| format!("{:?} has no parent directory", path))?;
        fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let tmp_path = dir.join(format!(".{}.tmp", name));
        let mut tmp = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {:?}", &tmp_path))?;
        serde_json::to_writer_pretty(&mut tmp, value)
            .with_context(|| format!("serializing {:?}", path))?;
        tmp.write_all(b"\n")?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, path)
            .with_context(|| format!("renaming {:?} -> {:?}", &tmp_path, path))
    }

    /// Persist one table, replacing any earlier staging of the same table.
    pub fn write(
        &self,
        key: &UnitKey,
        table: &str,
        columns: &ColumnSet,
        records: &[NormalizedRecord],
    ) -> Result<PathBuf> {
        let path = self.table_path(key, table)?;
        let staged = StagedTable {
            period: key.period,
            region: key.region.clone(),
            table: table.to_string(),
            columns: columns.clone(),
            records: records.to_vec(),
            staged_at: Utc::now(),
        };
        Self::write_atomic(&path, &staged)?;

        debug!(unit = %key, table = %table, records = records.len(), "staged table");
        Ok(path)
    }

    /// Mark `key` as completely staged with exactly `tables`.
    pub fn seal(&self, key: &UnitKey, tables: &BTreeSet<String>) -> Result<PathBuf> {
        let path = self.namespace(key)?.join(MANIFEST_FILE);
        let manifest = StagingManifest {
            period: key.period,
            region: key.region.clone(),
            tables: tables.clone(),
            sealed_at: Utc::now(),
        };
        Self::write_atomic(&path, &manifest)?;

        debug!(unit = %key, tables = tables.len(), "sealed staging");
        Ok(path)
    }

    /// The manifest of `key`, or `None` when the unit was never sealed.
    pub fn manifest(&self, key: &UnitKey) -> Result<Option<StagingManifest>> {
        let path = self.namespace(key)?.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let file = fs::File::open(&path).with_context(|| format!("opening {:?}", &path))?;
        let manifest =
            serde_json::from_reader(file).with_context(|| format!("parsing {:?}", &path))?;
        Ok(Some(manifest))
    }

    /// Identifiers of every table staged under `key`. Empty when nothing is staged.
    pub fn list(&self, key: &UnitKey) -> Result<BTreeSet<String>> {
        let dir = self.namespace(key)?;
        let pattern = format!(
            "{}/*.{}",
            Pattern::escape(&dir.to_string_lossy()),
            STAGED_EXT
        );

        let mut tables = BTreeSet::new();
        for entry in glob(&pattern)? {
            let path = entry?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tables.insert(stem.to_string());
            }
        }
        Ok(tables)
    }

    pub fn read(&self, key: &UnitKey, table: &str) -> Result<StagedTable> {
        let path = self.table_path(key, table)?;
        let file = fs::File::open(&path).with_context(|| format!("opening {:?}", &path))?;
        serde_json::from_reader(file).with_context(|| format!("parsing {:?}", &path))
    }

    /// Delete the whole namespace of `key`. Callers only do this once every
    /// staged table has been transformed.
    pub fn retire(&self, key: &UnitKey) -> Result<()> {
        self.remove_namespace(key)?;
        info!(unit = %key, "retired staging");
        Ok(())
    }

    /// Drop whatever is staged for `key` without committing it.
    pub fn discard(&self, key: &UnitKey) -> Result<()> {
        self.remove_namespace(key)?;
        debug!(unit = %key, "discarded staging");
        Ok(())
    }

    fn remove_namespace(&self, key: &UnitKey) -> Result<()> {
        let dir = self.namespace(key)?;
        if dir.exists() {
            // symlinks could still point elsewhere
            let root = fs::canonicalize(&self.root)
                .with_context(|| format!("resolving {:?}", &self.root))?;
            let resolved =
                fs::canonicalize(&dir).with_context(|| format!("resolving {:?}", &dir))?;
            if resolved == root || !resolved.starts_with(&root) {
                bail!("{:?} resolves outside staging root {:?}", dir, root);
            }
            fs::remove_dir_all(&dir).with_context(|| format!("removing {:?}", &dir))?;
        }

        // drop the period directory once its last region is gone
        let period_dir = self.root.join(key.period.to_string());
        if let Ok(mut entries) = fs::read_dir(&period_dir) {
            if entries.next().is_none() {
                if let Err(e) = fs::remove_dir(&period_dir) {
                    warn!("failed to remove {:?}: {}", period_dir, e);
                }
            }
        }
        Ok(())
    }

    /// Every unit that still has staged tables or a manifest, e.g. after an
    /// interrupted run.
    pub fn pending(&self) -> Result<Vec<UnitKey>> {
        let mut keys = Vec::new();
        for period_entry in fs::read_dir(&self.root)
            .with_context(|| format!("reading {:?}", &self.root))?
        {
            let period_entry = period_entry?;
            if !period_entry.file_type()?.is_dir() {
                continue;
            }
            let period = match period_entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                Some(p) => p,
                None => continue,
            };

            for region_entry in fs::read_dir(period_entry.path())? {
                let region_entry = region_entry?;
                if !region_entry.file_type()?.is_dir() {
                    continue;
                }
                let region = match region_entry.file_name().to_str() {
                    Some(r) if is_storage_name(r) => r.to_string(),
                    _ => continue,
                };
                let key = UnitKey { period, region };
                if !self.list(&key)?.is_empty() || region_entry.path().join(MANIFEST_FILE).exists()
                {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
