// src/error.rs

use thiserror::Error;

use crate::plan::Dimension;
use crate::schema::ValueKind;

/// A malformed range request, rejected before any work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} set is empty")]
    EmptySet(Dimension),

    #[error("{dimension} value {token:?} is not an integer")]
    NotIntegral { dimension: Dimension, token: String },

    #[error("{dimension} value {value} is outside {min}..={max}")]
    OutOfBounds {
        dimension: Dimension,
        value: i64,
        min: u32,
        max: u32,
    },

    #[error("{dimension} range {start}-{end} is inverted")]
    InvertedRange {
        dimension: Dimension,
        start: i64,
        end: i64,
    },
}

/// A filtered row whose length is not a multiple of the column-group width.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("row {row} has {len} cells, not a multiple of column-group width {width}")]
pub struct ReshapeError {
    pub row: usize,
    pub len: usize,
    pub width: usize,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("table {table:?}: {source}")]
    Reshape {
        table: String,
        #[source]
        source: ReshapeError,
    },

    #[error("table {table:?} has no column headers")]
    EmptyHeader { table: String },
}

/// Failure of a single table's transform. The table stays staged.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("column {column:?} row {row}: cannot cast {value:?} to {kind}")]
    Cast {
        column: String,
        row: usize,
        value: String,
        kind: ValueKind,
    },

    #[error("staged table has {staged} columns but schema declares {declared}")]
    Width { staged: usize, declared: usize },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Failure of one (period, region) unit of work. Other units are unaffected.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("fetch failed: {0:#}")]
    Fetch(anyhow::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("staging failed: {0:#}")]
    Staging(anyhow::Error),

    #[error("staging was never sealed, re-run the unit")]
    Unsealed,

    #[error("staged tables missing: {}", .missing.join(", "))]
    Incomplete { missing: Vec<String> },

    #[error("{} of {total} tables failed to transform, staging kept", .failed.len())]
    Commit {
        failed: Vec<(String, TransformError)>,
        total: usize,
    },
}
