// src/transform/store.rs

use anyhow::{bail, Context, Result};
use arrow::record_batch::RecordBatch;
use glob::{glob, Pattern};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::process::sanitize::is_storage_name;
use crate::staging::UnitKey;

/// Final columnar storage: one parquet file per table under
/// `<root>/<period>/<region>/`. Writes overwrite.
#[derive(Debug, Clone)]
pub struct ParquetStore {
    root: PathBuf,
}

impl ParquetStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating output directory {:?}", &root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, key: &UnitKey) -> Result<PathBuf> {
        if !is_storage_name(&key.region) {
            bail!("region {:?} is not a valid storage name", key.region);
        }
        Ok(self.root.join(key.period.to_string()).join(&key.region))
    }

    pub fn path(&self, key: &UnitKey, table: &str) -> Result<PathBuf> {
        if !is_storage_name(table) {
            bail!("table {:?} is not a valid storage name", table);
        }
        Ok(self.dir(key)?.join(format!("{}.parquet", table)))
    }

    pub fn write(&self, key: &UnitKey, table: &str, batch: &RecordBatch) -> Result<PathBuf> {
        let path = self.path(key, table)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }

        // write to a temporary path first, then move into place
        let tmp = path.with_extension("parquet.tmp");
        let file = File::create(&tmp).with_context(|| format!("creating {:?}", &tmp))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
            .context("creating Arrow writer")?;
        writer.write(batch).context("writing record batch")?;
        writer.close().context("closing parquet writer")?;
        fs::rename(&tmp, &path).with_context(|| format!("renaming {:?} -> {:?}", &tmp, &path))?;

        debug!(unit = %key, table = %table, rows = batch.num_rows(), "wrote parquet");
        Ok(path)
    }

    pub fn read(&self, key: &UnitKey, table: &str) -> Result<Vec<RecordBatch>> {
        read_parquet(&self.path(key, table)?)
    }

    /// Tables already written for `key`.
    pub fn list(&self, key: &UnitKey) -> Result<BTreeSet<String>> {
        let dir = self.dir(key)?;
        let pattern = format!("{}/*.parquet", Pattern::escape(&dir.to_string_lossy()));
        let mut tables = BTreeSet::new();
        for entry in glob(&pattern)? {
            let path = entry?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tables.insert(stem.to_string());
            }
        }
        Ok(tables)
    }
}

/// Read every record batch of a parquet file.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(1024)
        .build()?;
    reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("reading `{}`", path.display()))
}
