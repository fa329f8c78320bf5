// src/process/extract.rs

use tracing::{debug, instrument, warn};

use super::reshape::{reshape, ReshapePolicy};
use super::sanitize::storage_name;
use super::{ColumnSet, NormalizedRecord, RawRow};
use crate::error::ExtractError;
use crate::fetch::{PageDocument, TableBlock};

/// Prefix of every stored table identifier.
pub const TABLE_PREFIX: &str = "ic3__";

/// A reshaped table ready for staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    /// Storage identifier, e.g. `ic3__victims_by_age_group`.
    pub name: String,
    pub caption: String,
    pub columns: ColumnSet,
    pub records: Vec<NormalizedRecord>,
}

/// `"Victims by Age Group"` → `"ic3__victims_by_age_group"`.
pub fn table_identifier(caption: &str) -> String {
    let name = storage_name(&caption.to_lowercase()).unwrap_or_default();
    format!("{}{}", TABLE_PREFIX, name)
}

/// Split the header text on line breaks, drop the boundary entries on
/// either end, and de-duplicate what is left in first-seen order.
///
/// `"\nA\nB\nA\nC\n"` → `[A, B, C]`. Blank entries are skipped.
pub fn column_set(header_text: &str) -> ColumnSet {
    let entries: Vec<&str> = header_text.split('\n').collect();
    if entries.len() < 3 {
        return ColumnSet::default();
    }
    entries[1..entries.len() - 1]
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Keep only rows with more than one cell; shorter rows are header and
/// separator artifacts.
pub fn filter_rows(rows: &[RawRow]) -> Vec<RawRow> {
    rows.iter().filter(|r| r.len() > 1).cloned().collect()
}

pub fn extract_table(
    block: &TableBlock,
    policy: ReshapePolicy,
) -> Result<ExtractedTable, ExtractError> {
    let name = table_identifier(&block.caption);
    let columns = column_set(&block.header_text);
    if columns.is_empty() {
        return Err(ExtractError::EmptyHeader { table: name });
    }

    let filtered = filter_rows(&block.rows);
    let records =
        reshape(&filtered, columns.width(), policy).map_err(|source| ExtractError::Reshape {
            table: name.clone(),
            source,
        })?;

    debug!(
        table = %name,
        width = columns.width(),
        raw_rows = block.rows.len(),
        kept_rows = filtered.len(),
        records = records.len(),
        "extracted table"
    );

    Ok(ExtractedTable {
        name,
        caption: block.caption.clone(),
        columns,
        records,
    })
}

/// Extract every table on the page. The first failing table fails the page.
#[instrument(level = "info", skip(page, policy), fields(blocks = page.blocks.len()))]
pub fn extract_tables(
    page: &PageDocument,
    policy: ReshapePolicy,
) -> Result<Vec<ExtractedTable>, ExtractError> {
    let mut tables: Vec<ExtractedTable> = Vec::with_capacity(page.blocks.len());
    for block in &page.blocks {
        let table = extract_table(block, policy)?;
        if tables.iter().any(|t| t.name == table.name) {
            warn!(table = %table.name, "duplicate caption on page, later table wins");
            tables.retain(|t| t.name != table.name);
        }
        tables.push(table);
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vals: &[&str]) -> RawRow {
        vals.iter().map(|s| s.to_string()).collect()
    }

    fn block(caption: &str, header: &[&str], rows: Vec<RawRow>) -> TableBlock {
        TableBlock {
            caption: caption.to_string(),
            header_text: format!("\n{}\n", header.join("\n")),
            rows,
        }
    }

    #[test]
    fn header_dedupe_preserves_order() {
        let set = column_set("\nA\nB\nA\nC\n");
        assert_eq!(set.names(), &["A", "B", "C"]);
        assert_eq!(set.width(), 3);
    }

    #[test]
    fn header_boundaries_are_dropped() {
        assert_eq!(column_set("lead\nA\nB\ntrail").names(), &["A", "B"]);
        assert!(column_set("").is_empty());
        assert!(column_set("\n\n").is_empty());
        assert!(column_set("A\nB").is_empty());
    }

    #[test]
    fn short_rows_are_filtered() {
        let rows = vec![row(&["x"]), row(&["a", "1"]), row(&[])];
        assert_eq!(filter_rows(&rows), vec![row(&["a", "1"])]);
    }

    #[test]
    fn identifier_from_caption() {
        assert_eq!(
            table_identifier("Victims by Age Group"),
            "ic3__victims_by_age_group"
        );
        assert_eq!(table_identifier("Crime Type"), "ic3__crime_type");
        assert_eq!(table_identifier("Loss/Victim Ratio"), "ic3__loss_victim_ratio");
        assert_eq!(table_identifier("../../x"), "ic3__.._.._x");
        assert_eq!(table_identifier(".."), "ic3__");
    }

    #[test]
    fn extracts_repeated_groups() {
        let b = block(
            "Victims by Age Group",
            &["Age Range", "Count", "Amount Loss", "Age Range", "Count", "Amount Loss"],
            vec![
                row(&[]),
                row(&["Under 20", "1,001", "$2,500", "20 - 29", "45", "$10,000"]),
                row(&["Total"]),
            ],
        );
        let t = extract_table(&b, ReshapePolicy::Strict).unwrap();
        assert_eq!(t.name, "ic3__victims_by_age_group");
        assert_eq!(t.columns.names(), &["Age Range", "Count", "Amount Loss"]);
        assert_eq!(
            t.records,
            vec![
                row(&["Under 20", "1001", "2500"]),
                row(&["20 - 29", "45", "10000"]),
            ]
        );
    }

    #[test]
    fn empty_header_is_an_error() {
        let b = TableBlock {
            caption: "Crime Type".into(),
            header_text: String::new(),
            rows: vec![row(&["a", "b"])],
        };
        match extract_table(&b, ReshapePolicy::Strict) {
            Err(ExtractError::EmptyHeader { table }) => assert_eq!(table, "ic3__crime_type"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn misaligned_row_fails_page() {
        let page = PageDocument {
            blocks: vec![
                block("Crime Type", &["Crime Type", "Loss Amount"], vec![row(&["a", "$1"])]),
                block(
                    "Crime Type by Subject Count",
                    &["Crime Type", "Subject Count"],
                    vec![row(&["a", "1", "b"])],
                ),
            ],
            ..Default::default()
        };
        let err = extract_tables(&page, ReshapePolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Reshape { ref table, .. } if table == "ic3__crime_type_by_subject_count"
        ));

        let lenient = extract_tables(&page, ReshapePolicy::DropRemainder).unwrap();
        assert_eq!(lenient.len(), 2);
        assert_eq!(lenient[1].records, vec![row(&["a", "1"])]);
    }
}
