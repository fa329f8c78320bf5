// src/pipeline.rs

use anyhow::{anyhow, Result};
use std::{collections::BTreeSet, fmt, thread, time::Duration};
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::error::UnitError;
use crate::fetch::DocumentSource;
use crate::plan::IterationPlan;
use crate::process::{extract_tables, ExtractedTable, ReshapePolicy};
use crate::staging::{StagingStore, UnitKey};
use crate::transform::{FinalTable, ParquetStore, SchemaTransformer};

/// Identifies a unit in a run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitId {
    /// From the plan: numeric period and region identifiers.
    Planned { period: u32, region: u32 },
    /// Recovered from leftover staging.
    Staged(UnitKey),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Planned { period, region } => write!(f, "{} region {}", period, region),
            UnitId::Staged(key) => write!(f, "{}", key),
        }
    }
}

#[derive(Debug)]
pub struct UnitReport {
    pub key: UnitKey,
    pub tables: Vec<FinalTable>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<UnitKey>,
    pub failed: Vec<(UnitId, UnitError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs units of work end to end: fetch → extract → stage → transform → retire.
pub struct Pipeline<S: DocumentSource> {
    source: S,
    transformer: SchemaTransformer,
    policy: ReshapePolicy,
    delay: Duration,
}

impl<S: DocumentSource> Pipeline<S> {
    pub fn new(
        source: S,
        transformer: SchemaTransformer,
        policy: ReshapePolicy,
        delay: Duration,
    ) -> Self {
        Self {
            source,
            transformer,
            policy,
            delay,
        }
    }

    pub fn from_config(source: S, config: &Config) -> Result<Self> {
        let transformer = SchemaTransformer::new(
            config.schema_registry(),
            StagingStore::new(&config.staging_dir)?,
            ParquetStore::new(&config.output_dir)?,
        );
        Ok(Self::new(
            source,
            transformer,
            config.reshape_policy,
            config.unit_delay(),
        ))
    }

    pub fn transformer(&self) -> &SchemaTransformer {
        &self.transformer
    }

    /// Process one (period, region) unit. Nothing is committed unless every
    /// table on the page extracts and stages cleanly.
    #[instrument(level = "info", skip(self))]
    pub fn run_unit(&self, period: u32, region: u32) -> Result<UnitReport, UnitError> {
        // 1) fetch
        let page = self
            .source
            .fetch(period, region)
            .map_err(UnitError::Fetch)?;
        if page.blocks.is_empty() {
            return Err(UnitError::Fetch(anyhow!(
                "page for {} region {} has no tables",
                period,
                region
            )));
        }

        let name = page.region_name(region);
        if name.is_none() {
            warn!("region {} missing from the page's options", region);
        }
        let key = UnitKey::new(period, region, name);

        // 2) extract every table before staging any of them
        let tables = extract_tables(&page, self.policy)?;

        // 3) stage from a clean namespace, then seal
        let staging = self.transformer.staging();
        staging.discard(&key).map_err(UnitError::Staging)?;
        if let Err(e) = self.stage(&key, &tables) {
            if let Err(cleanup) = staging.discard(&key) {
                warn!(unit = %key, "failed to discard partial staging: {:#}", cleanup);
            }
            return Err(UnitError::Staging(e));
        }

        // 4) transform and retire
        let finals = self.transformer.transform_all(&key)?;
        info!(unit = %key, tables = finals.len(), "unit complete");
        Ok(UnitReport {
            key,
            tables: finals,
        })
    }

    fn stage(&self, key: &UnitKey, tables: &[ExtractedTable]) -> Result<()> {
        let staging = self.transformer.staging();
        for table in tables {
            staging.write(key, &table.name, &table.columns, &table.records)?;
        }
        let names: BTreeSet<String> = tables.iter().map(|t| t.name.clone()).collect();
        staging.seal(key, &names)?;
        Ok(())
    }

    /// Run every unit of `plan` in order. A failing unit is recorded and the
    /// run moves on.
    pub fn run(&self, plan: &IterationPlan) -> RunSummary {
        let units = plan.units();
        let total = units.len();
        info!(units = total, "starting run");

        let mut summary = RunSummary::default();
        for (idx, unit) in units.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            info!(
                period = unit.period,
                region = unit.region,
                "[{}/{}] processing unit",
                unit.position,
                unit.group_size
            );

            match self.run_unit(unit.period, unit.region) {
                Ok(report) => summary.succeeded.push(report.key),
                Err(e) => {
                    error!(period = unit.period, region = unit.region, "unit failed: {}", e);
                    summary.failed.push((
                        UnitId::Planned {
                            period: unit.period,
                            region: unit.region,
                        },
                        e,
                    ));
                }
            }
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "run finished"
        );
        summary
    }

    /// Transform whatever an interrupted run left in staging, without fetching.
    pub fn resume(&self) -> Result<RunSummary> {
        let pending = self.transformer.staging().pending()?;
        info!(units = pending.len(), "resuming staged units");

        let mut summary = RunSummary::default();
        for key in pending {
            match self.transformer.transform_all(&key) {
                Ok(_) => summary.succeeded.push(key),
                Err(e) => {
                    error!(unit = %key, "resume failed: {}", e);
                    summary.failed.push((UnitId::Staged(key), e));
                }
            }
        }
        Ok(summary)
    }
}
