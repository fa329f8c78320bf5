// src/process/reshape.rs

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::sanitize::sanitize_record;
use super::{NormalizedRecord, RawRow};
use crate::error::ReshapeError;

/// What to do with a row whose length is not a multiple of the group width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReshapePolicy {
    /// Fail the table.
    #[default]
    Strict,
    /// Keep the full groups and drop the trailing partial one.
    DropRemainder,
}

/// Split each filtered row into consecutive `width`-sized groups, one
/// record per group, then sanitize the positional amount/count fields.
///
/// A row `[a, 1, b, 2]` with width 2 becomes `[a, 1]` and `[b, 2]`.
pub fn reshape(
    rows: &[RawRow],
    width: usize,
    policy: ReshapePolicy,
) -> Result<Vec<NormalizedRecord>, ReshapeError> {
    if width == 0 {
        return match rows.first() {
            Some(row) => Err(ReshapeError {
                row: 0,
                len: row.len(),
                width,
            }),
            None => Ok(Vec::new()),
        };
    }

    let mut records = Vec::with_capacity(rows.iter().map(|r| r.len() / width).sum());

    for (idx, row) in rows.iter().enumerate() {
        let remainder = row.len() % width;
        if remainder != 0 {
            let err = ReshapeError {
                row: idx,
                len: row.len(),
                width,
            };
            match policy {
                ReshapePolicy::Strict => return Err(err),
                ReshapePolicy::DropRemainder => {
                    warn!(dropped = remainder, "{}", err);
                }
            }
        }

        let groups = row.chunks_exact(width);
        trace!(row = idx, groups = groups.len(), "reshaping row");
        records.extend(groups.map(|g| g.to_vec()));
    }

    for record in records.iter_mut() {
        sanitize_record(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vals: &[&str]) -> RawRow {
        vals.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn splits_concatenated_groups() {
        let rows = vec![row(&["Phishing", "10", "Extortion", "20", "Spoofing", "30"])];
        let records = reshape(&rows, 2, ReshapePolicy::Strict).unwrap();
        assert_eq!(
            records,
            vec![
                row(&["Phishing", "10"]),
                row(&["Extortion", "20"]),
                row(&["Spoofing", "30"]),
            ]
        );
    }

    #[test]
    fn record_count_and_concatenation_preserved() {
        // values chosen so sanitizing is a no-op
        for width in 1..=4 {
            for groups in 1..=5 {
                let flat: RawRow = (0..width * groups).map(|i| format!("v{i}")).collect();
                let records = reshape(&[flat.clone()], width, ReshapePolicy::Strict).unwrap();
                assert_eq!(records.len(), groups);
                assert!(records.iter().all(|r| r.len() == width));
                assert_eq!(records.concat(), flat);
            }
        }
    }

    #[test]
    fn sanitizes_last_and_grouped_count_fields() {
        let rows = vec![row(&["0-10", "1,200", "$5,000", "11-20", "300", "$1,000,000"])];
        let records = reshape(&rows, 3, ReshapePolicy::Strict).unwrap();
        assert_eq!(
            records,
            vec![row(&["0-10", "1200", "5000"]), row(&["11-20", "300", "1000000"])]
        );
    }

    #[test]
    fn strict_rejects_misaligned_row() {
        let rows = vec![row(&["a", "1"]), row(&["b", "2", "c"])];
        let err = reshape(&rows, 2, ReshapePolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            ReshapeError {
                row: 1,
                len: 3,
                width: 2
            }
        );
    }

    #[test]
    fn drop_remainder_keeps_full_groups() {
        let rows = vec![row(&["a", "$1", "b", "$2", "c"])];
        let records = reshape(&rows, 2, ReshapePolicy::DropRemainder).unwrap();
        assert_eq!(records, vec![row(&["a", "1"]), row(&["b", "2"])]);
    }

    #[test]
    fn zero_width_is_an_error_only_with_rows() {
        assert!(reshape(&[], 0, ReshapePolicy::Strict).unwrap().is_empty());
        assert!(reshape(&[row(&["a", "b"])], 0, ReshapePolicy::DropRemainder).is_err());
    }
}
