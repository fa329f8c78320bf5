// src/transform/cast.rs

use arrow::array::{ArrayRef, Int64Builder, StringBuilder};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tracing::warn;

use crate::error::TransformError;
use crate::process::{ColumnSet, NormalizedRecord};
use crate::schema::{build_arrow_schema, TableSchema, ValueKind};

/// Cast staged text records into typed Arrow columns, kind by position.
/// Column names are taken from the staged `ColumnSet`.
pub fn cast_records(
    columns: &ColumnSet,
    records: &[NormalizedRecord],
    schema: &TableSchema,
) -> Result<RecordBatch, TransformError> {
    // 1) Widths must line up, for the header and for every record
    let declared = schema.width();
    if columns.width() != declared {
        return Err(TransformError::Width {
            staged: columns.width(),
            declared,
        });
    }
    if let Some(bad) = records.iter().find(|r| r.len() != declared) {
        return Err(TransformError::Width {
            staged: bad.len(),
            declared,
        });
    }

    for (staged, spec) in columns.iter().zip(&schema.columns) {
        if staged != spec.name {
            warn!(staged = %staged, declared = %spec.name, "column name differs from schema");
        }
    }

    // 2) One builder per column
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(declared);
    for (idx, (name, kind)) in columns.iter().zip(schema.kinds()).enumerate() {
        let array: ArrayRef = match kind {
            ValueKind::Text => {
                let mut b = StringBuilder::with_capacity(records.len(), records.len() * 16);
                for record in records {
                    b.append_value(&record[idx]);
                }
                Arc::new(b.finish())
            }
            ValueKind::Integer => {
                let mut b = Int64Builder::with_capacity(records.len());
                for (row, record) in records.iter().enumerate() {
                    let raw = &record[idx];
                    let v = raw.trim().parse::<i64>().map_err(|_| TransformError::Cast {
                        column: name.to_string(),
                        row,
                        value: raw.clone(),
                        kind,
                    })?;
                    b.append_value(v);
                }
                Arc::new(b.finish())
            }
        };
        arrays.push(array);
    }

    // 3) Assemble
    let arrow_schema = build_arrow_schema(columns.iter(), schema.kinds());
    RecordBatch::try_new(arrow_schema, arrays).map_err(|e| TransformError::Storage(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSpec;
    use arrow::array::{Int64Array, StringArray};

    fn fallback() -> TableSchema {
        TableSchema::new(vec![
            ColumnSpec::new("Crime Type", ValueKind::Text),
            ColumnSpec::new("Loss Amount", ValueKind::Integer),
        ])
    }

    fn rec(vals: &[&str]) -> NormalizedRecord {
        vals.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn casts_positionally() {
        let cols: ColumnSet = ["Crime Type", "Loss Amount"].into_iter().collect();
        let batch = cast_records(
            &cols,
            &[rec(&["Phishing", "1000"]), rec(&["Extortion", " 500 "])],
            &fallback(),
        )
        .unwrap();

        assert_eq!(batch.num_rows(), 2);
        let labels = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        let amounts = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(labels.value(1), "Extortion");
        assert_eq!(amounts.value(0), 1000);
        assert_eq!(amounts.value(1), 500);
    }

    #[test]
    fn unparsable_integer_is_cast_error() {
        let cols: ColumnSet = ["Crime Type", "Loss Amount"].into_iter().collect();
        let err = cast_records(
            &cols,
            &[rec(&["Phishing", "1000"]), rec(&["Extortion", "$5,00x"])],
            &fallback(),
        )
        .unwrap_err();
        match err {
            TransformError::Cast {
                column, row, kind, ..
            } => {
                assert_eq!(column, "Loss Amount");
                assert_eq!(row, 1);
                assert_eq!(kind, ValueKind::Integer);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let cols: ColumnSet = ["Age Range", "Count", "Amount Loss"].into_iter().collect();
        assert!(matches!(
            cast_records(&cols, &[], &fallback()),
            Err(TransformError::Width {
                staged: 3,
                declared: 2
            })
        ));
    }

    #[test]
    fn empty_table_casts_to_empty_batch() {
        let cols: ColumnSet = ["Crime Type", "Loss Amount"].into_iter().collect();
        let batch = cast_records(&cols, &[], &fallback()).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }
}
