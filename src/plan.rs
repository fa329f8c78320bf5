// src/plan.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::num::IntErrorKind;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Period,
    Region,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Period => f.write_str("period"),
            Dimension::Region => f.write_str("region"),
        }
    }
}

/// Inclusive integer domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn check(&self, dimension: Dimension, value: i64) -> Result<u32, ValidationError> {
        if value < self.min as i64 || value > self.max as i64 {
            return Err(ValidationError::OutOfBounds {
                dimension,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value as u32)
    }
}

/// Validated (periods × regions) request. Both sets are non-empty and in bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    periods: BTreeSet<u32>,
    regions: BTreeSet<u32>,
}

impl RangeRequest {
    pub fn new(
        periods: &[i64],
        regions: &[i64],
        period_bounds: Bounds,
        region_bounds: Bounds,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            periods: validate_set(Dimension::Period, periods, period_bounds)?,
            regions: validate_set(Dimension::Region, regions, region_bounds)?,
        })
    }

    /// Build from index-set text such as `2016-2022` and `1,5,10-12`.
    pub fn parse(
        periods: &str,
        regions: &str,
        period_bounds: Bounds,
        region_bounds: Bounds,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            periods: parse_index_set(Dimension::Period, periods, period_bounds)?,
            regions: parse_index_set(Dimension::Region, regions, region_bounds)?,
        })
    }

    pub fn periods(&self) -> &BTreeSet<u32> {
        &self.periods
    }

    pub fn regions(&self) -> &BTreeSet<u32> {
        &self.regions
    }
}

fn validate_set(
    dimension: Dimension,
    values: &[i64],
    bounds: Bounds,
) -> Result<BTreeSet<u32>, ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::EmptySet(dimension));
    }
    values.iter().map(|&v| bounds.check(dimension, v)).collect()
}

/// Parse one integer token. Integers too large for `i64` are out of bounds,
/// not malformed.
fn parse_int(dimension: Dimension, token: &str, bounds: Bounds) -> Result<i64, ValidationError> {
    let token = token.trim();
    token.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValidationError::OutOfBounds {
            dimension,
            value: if token.starts_with('-') { i64::MIN } else { i64::MAX },
            min: bounds.min,
            max: bounds.max,
        },
        _ => ValidationError::NotIntegral {
            dimension,
            token: token.to_string(),
        },
    })
}

/// Parse comma-separated integers and inclusive `a-b` ranges, checking
/// every value (and both ends of every range) against `bounds`.
pub fn parse_index_set(
    dimension: Dimension,
    text: &str,
    bounds: Bounds,
) -> Result<BTreeSet<u32>, ValidationError> {
    let mut out = BTreeSet::new();
    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        // a leading '-' is a sign, not a range separator
        let sep = token
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-')
            .map(|(i, _)| i);

        match sep {
            Some(i) => {
                let start = parse_int(dimension, &token[..i], bounds)?;
                let end = parse_int(dimension, &token[i + 1..], bounds)?;
                if start > end {
                    return Err(ValidationError::InvertedRange {
                        dimension,
                        start,
                        end,
                    });
                }
                let lo = bounds.check(dimension, start)?;
                let hi = bounds.check(dimension, end)?;
                out.extend(lo..=hi);
            }
            None => {
                out.insert(bounds.check(dimension, parse_int(dimension, token, bounds)?)?);
            }
        }
    }

    if out.is_empty() {
        return Err(ValidationError::EmptySet(dimension));
    }
    Ok(out)
}

/// One (period, region) unit with its place in the current progress group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedUnit {
    pub period: u32,
    pub region: u32,
    /// 1-based position within the progress group.
    pub position: usize,
    pub group_size: usize,
}

/// Iteration strategy, chosen once from the request's cardinalities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationPlan {
    /// Periods outer, regions inner; progress is per region within a period.
    CrossProduct { periods: Vec<u32>, regions: Vec<u32> },
    /// A single period, fanned out over regions.
    RegionFanOut { period: u32, regions: Vec<u32> },
    /// A single region, fanned out over periods.
    PeriodFanOut { region: u32, periods: Vec<u32> },
}

impl IterationPlan {
    pub fn select(request: &RangeRequest) -> Self {
        let periods: Vec<u32> = request.periods.iter().copied().collect();
        let regions: Vec<u32> = request.regions.iter().copied().collect();

        if periods.len() == 1 {
            IterationPlan::RegionFanOut {
                period: periods[0],
                regions,
            }
        } else if regions.len() == 1 {
            IterationPlan::PeriodFanOut {
                region: regions[0],
                periods,
            }
        } else {
            IterationPlan::CrossProduct { periods, regions }
        }
    }

    /// Number of units of work.
    pub fn len(&self) -> usize {
        match self {
            IterationPlan::CrossProduct { periods, regions } => periods.len() * regions.len(),
            IterationPlan::RegionFanOut { regions, .. } => regions.len(),
            IterationPlan::PeriodFanOut { periods, .. } => periods.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every unit in visiting order.
    pub fn units(&self) -> Vec<PlannedUnit> {
        match self {
            IterationPlan::CrossProduct { periods, regions } => periods
                .iter()
                .flat_map(|&period| {
                    regions.iter().enumerate().map(move |(i, &region)| PlannedUnit {
                        period,
                        region,
                        position: i + 1,
                        group_size: regions.len(),
                    })
                })
                .collect(),
            IterationPlan::RegionFanOut { period, regions } => regions
                .iter()
                .enumerate()
                .map(|(i, &region)| PlannedUnit {
                    period: *period,
                    region,
                    position: i + 1,
                    group_size: regions.len(),
                })
                .collect(),
            IterationPlan::PeriodFanOut { region, periods } => periods
                .iter()
                .enumerate()
                .map(|(i, &period)| PlannedUnit {
                    period,
                    region: *region,
                    position: i + 1,
                    group_size: periods.len(),
                })
                .collect(),
        }
    }
}
