// src/staging/mod.rs
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

use crate::process::sanitize::storage_name;
use crate::process::{ColumnSet, NormalizedRecord};

pub use store::StagingStore;

/// One (period, region) unit of work. `region` is the storage name of the
/// region, e.g. `New_York`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub period: u32,
    pub region: String,
}

impl UnitKey {
    /// Key from a region display name, made path-safe with
    /// [`storage_name`]. Falls back to `region_<id>` when the name is
    /// missing or has nothing usable left.
    pub fn new(period: u32, region_id: u32, display_name: Option<&str>) -> Self {
        match display_name.and_then(storage_name) {
            Some(region) => Self { period, region },
            None => Self::unnamed(period, region_id),
        }
    }

    /// Key for a region id that has no display name on the page.
    pub fn unnamed(period: u32, region_id: u32) -> Self {
        Self {
            period,
            region: format!("region_{}", region_id),
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.period, self.region)
    }
}

/// Loosely typed intermediate form of one extracted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedTable {
    pub period: u32,
    pub region: String,
    pub table: String,
    pub columns: ColumnSet,
    pub records: Vec<NormalizedRecord>,
    pub staged_at: DateTime<Utc>,
}

/// Written after the last table of a unit is staged. Units without one were
/// interrupted mid-page and are never committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingManifest {
    pub period: u32,
    pub region: String,
    pub tables: BTreeSet<String>,
    pub sealed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names() {
        let k = UnitKey::new(2022, 9, Some("District of Columbia"));
        assert_eq!(k.region, "District_of_Columbia");
        assert_eq!(k.to_string(), "2022/District_of_Columbia");
        assert_eq!(UnitKey::unnamed(2019, 57).region, "region_57");
        assert_eq!(UnitKey::new(2019, 57, None), UnitKey::unnamed(2019, 57));
    }

    #[test]
    fn page_names_cannot_escape_the_namespace() {
        assert_eq!(UnitKey::new(2022, 3, Some("Guam/Saipan")).region, "Guam_Saipan");
        assert_eq!(UnitKey::new(2022, 3, Some("../..")).region, ".._..");
        assert_eq!(UnitKey::new(2022, 3, Some("..")).region, "region_3");
        assert_eq!(UnitKey::new(2022, 3, Some("  ")).region, "region_3");
    }
}
