// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared value kind of a final column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Text => f.write_str("text"),
            ValueKind::Integer => f.write_str("integer"),
        }
    }
}

/// A single column definition of a table schema.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ValueKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered column → kind mapping for one table. Order is positional.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
#[serde(transparent)]
pub struct TableSchema {
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ValueKind> + '_ {
        self.columns.iter().map(|c| c.kind)
    }
}
