// src/process/mod.rs
pub mod extract;
pub mod reshape;
pub mod sanitize;

use serde::{Deserialize, Serialize};

pub use extract::{extract_table, extract_tables, ExtractedTable};
pub use reshape::{reshape, ReshapePolicy};

/// Cell texts scraped from one `<tr>`, possibly several column groups long.
pub type RawRow = Vec<String>;

/// One logical record, exactly as wide as its table's `ColumnSet`.
pub type NormalizedRecord = Vec<String>;

/// Unique column names in first-seen order. Its length is the column-group width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnSet {
    names: Vec<String>,
}

impl ColumnSet {
    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in iter {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Self { names }
    }
}

impl From<Vec<String>> for ColumnSet {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<ColumnSet> for Vec<String> {
    fn from(set: ColumnSet) -> Self {
        set.names
    }
}
