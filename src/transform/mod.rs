// src/transform/mod.rs
pub mod cast;
pub mod store;

use arrow::record_batch::RecordBatch;
use std::path::PathBuf;
use tracing::{error, info, instrument};

use crate::error::{TransformError, UnitError};
use crate::schema::SchemaRegistry;
use crate::staging::{StagingStore, UnitKey};

pub use cast::cast_records;
pub use store::{read_parquet, ParquetStore};

/// A schema-cast table as written to final storage.
#[derive(Debug, Clone)]
pub struct FinalTable {
    pub key: UnitKey,
    pub table: String,
    pub path: PathBuf,
    pub batch: RecordBatch,
}

/// Reads staged tables, casts them with the registered schema and writes
/// them to final storage. Staging is retired per unit, all or nothing.
pub struct SchemaTransformer {
    schemas: SchemaRegistry,
    staging: StagingStore,
    store: ParquetStore,
}

impl SchemaTransformer {
    pub fn new(schemas: SchemaRegistry, staging: StagingStore, store: ParquetStore) -> Self {
        Self {
            schemas,
            staging,
            store,
        }
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    pub fn store(&self) -> &ParquetStore {
        &self.store
    }

    /// Cast one staged table and write it. Staging is left untouched.
    #[instrument(level = "debug", skip(self), fields(unit = %key))]
    pub fn transform(&self, key: &UnitKey, table: &str) -> Result<FinalTable, TransformError> {
        let schema = self.schemas.resolve(table);
        let staged = self.staging.read(key, table)?;
        let batch = cast_records(&staged.columns, &staged.records, schema)?;
        let path = self.store.write(key, table, &batch)?;

        info!(table = %table, rows = batch.num_rows(), "transformed");
        Ok(FinalTable {
            key: key.clone(),
            table: table.to_string(),
            path,
            batch,
        })
    }

    /// Transform every table the manifest of `key` names, then retire the
    /// staging namespace only if all of them succeeded. A unit with nothing
    /// staged is a no-op.
    #[instrument(level = "info", skip(self), fields(unit = %key))]
    pub fn transform_all(&self, key: &UnitKey) -> Result<Vec<FinalTable>, UnitError> {
        let staged = self.staging.list(key).map_err(UnitError::Staging)?;
        let tables = match self.staging.manifest(key).map_err(UnitError::Staging)? {
            Some(manifest) => manifest.tables,
            None if staged.is_empty() => return Ok(Vec::new()),
            None => return Err(UnitError::Unsealed),
        };

        let missing: Vec<String> = tables.difference(&staged).cloned().collect();
        if !missing.is_empty() {
            return Err(UnitError::Incomplete { missing });
        }
        let total = tables.len();

        let mut done = Vec::with_capacity(total);
        let mut failed = Vec::new();
        for table in tables {
            match self.transform(key, &table) {
                Ok(t) => done.push(t),
                Err(e) => {
                    error!(table = %table, "transform failed: {}", e);
                    failed.push((table, e));
                }
            }
        }

        if !failed.is_empty() {
            return Err(UnitError::Commit { failed, total });
        }

        self.staging.retire(key).map_err(UnitError::Staging)?;
        Ok(done)
    }
}
