// src/schema/registry.rs

use std::collections::HashMap;
use tracing::debug;

use super::types::{ColumnSpec, TableSchema, ValueKind};

/// Immutable table-name → schema lookup with a default entry for
/// unrecognized tables.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableSchema>,
    fallback: TableSchema,
}

impl SchemaRegistry {
    pub fn new(tables: HashMap<String, TableSchema>, fallback: TableSchema) -> Self {
        Self { tables, fallback }
    }

    /// The schemas of the tables published on the state report pages.
    pub fn builtin() -> Self {
        use ValueKind::{Integer, Text};

        let mut tables = HashMap::new();
        tables.insert(
            "ic3__victims_by_age_group".to_string(),
            TableSchema::new(vec![
                ColumnSpec::new("Age Range", Text),
                ColumnSpec::new("Count", Integer),
                ColumnSpec::new("Amount Loss", Integer),
            ]),
        );
        tables.insert(
            "ic3__crime_type_by_subject_count".to_string(),
            TableSchema::new(vec![
                ColumnSpec::new("Crime Type", Text),
                ColumnSpec::new("Subject Count", Integer),
            ]),
        );
        tables.insert(
            "ic3__crime_type_by_victim_count".to_string(),
            TableSchema::new(vec![
                ColumnSpec::new("Crime Type", Text),
                ColumnSpec::new("Victim Count", Integer),
            ]),
        );

        let fallback = TableSchema::new(vec![
            ColumnSpec::new("Crime Type", Text),
            ColumnSpec::new("Loss Amount", Integer),
        ]);

        Self::new(tables, fallback)
    }

    /// Return a registry where `overrides` replace or extend the existing entries.
    pub fn with_overrides(mut self, overrides: HashMap<String, TableSchema>) -> Self {
        for (table, schema) in overrides {
            debug!(table = %table, columns = schema.width(), "schema override");
            self.tables.insert(table, schema);
        }
        self
    }

    /// Schema for `table`, or the fallback entry when the name is unknown.
    pub fn resolve(&self, table: &str) -> &TableSchema {
        match self.tables.get(table) {
            Some(schema) => schema,
            None => {
                debug!(table = %table, "no schema registered, using fallback");
                &self.fallback
            }
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
