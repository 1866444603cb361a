use std::{
    collections::{HashMap, hash_map::Entry},
    fmt::Write,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{AggregateError, Result},
    metric::{FileFamily, MetricSpec, Reduction},
    sample::{RawSample, raw_path},
    table::{ResultTable, WorkloadRow},
    workload::{Workload, total_apps},
};

pub const DEFAULT_DIAGNOSTIC_POLICY: &str = "CPA_0.2";
const PHASE_CHANGES: &str = "phase_changes:mean";
const CLOS_CHANGES: &str = "CLOS_changes:mean";

/// Partition change totals of the diagnostic policy
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChangeCounters {
    pub phase_changes: f64,
    pub clos_changes: f64,
    pub apps: usize,
    pub workloads: usize,
}

fn per(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

impl ChangeCounters {
    /// Phase changes per application, zero without applications
    pub fn phase_changes_per_app(&self) -> f64 {
        per(self.phase_changes, self.apps)
    }

    /// CLOS changes per workload, zero without workloads
    pub fn clos_changes_per_workload(&self) -> f64 {
        per(self.clos_changes, self.workloads)
    }
}

#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub tables: Vec<ResultTable>,
    pub counters: ChangeCounters,
}

impl AggregateReport {
    /// Writes every table, returning the written paths
    pub fn write_tables(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.tables.iter().map(|t| t.write_csv(dir)).collect()
    }

    /// Mean gain per non-default policy for each metric, followed by the
    /// change counters
    pub fn summary(&self, default_policy: &str) -> String {
        let mut out = String::new();
        for table in &self.tables {
            _ = writeln!(out, "{}", table.metric);
            for column in table.policies.iter().filter(|c| c.policy != default_policy) {
                match table.mean_gain(&column.policy) {
                    Some(gain) => _ = writeln!(out, "{}: {gain:.2}", column.policy),
                    None => _ = writeln!(out, "{}: nan", column.policy),
                }
            }
            _ = writeln!(out);
        }
        _ = writeln!(out, "-----------");
        _ = writeln!(out, "phase_changes = {:.2}", self.counters.phase_changes_per_app());
        _ = writeln!(out, "CLOS_changes = {:.2}", self.counters.clos_changes_per_workload());
        _ = writeln!(out, "-----------");
        out
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    pub input_dir: PathBuf,
    pub metrics: Vec<MetricSpec>,
    pub policies: Vec<String>,
    pub default_policy: String,
    pub diagnostic_policy: Option<String>,
}

impl Aggregator {
    pub fn run(&self, workloads: &[Workload]) -> Result<AggregateReport> {
        self.run_with(workloads, |_, _| {})
    }

    /// Builds one table per metric. `on_step` is called after every
    /// (policy, workload) pair.
    pub fn run_with<F>(&self, workloads: &[Workload], mut on_step: F) -> Result<AggregateReport>
    where
        F: FnMut(&str, &Workload),
    {
        if !self.policies.contains(&self.default_policy) {
            return Err(AggregateError::UnknownDefaultPolicy(
                self.default_policy.clone(),
            ));
        }

        let rows = workloads.iter().map(WorkloadRow::from).collect::<Vec<_>>();
        let mut tables = self
            .metrics
            .iter()
            .map(|m| ResultTable::new(&m.name, rows.clone(), &self.policies))
            .collect::<Vec<_>>();
        let mut counters = ChangeCounters {
            apps: total_apps(workloads),
            workloads: workloads.len(),
            ..Default::default()
        };

        for policy in &self.policies {
            debug!("Aggregating policy {policy}");
            let is_diagnostic = self.diagnostic_policy.as_deref() == Some(policy.as_str());

            for (row, workload) in workloads.iter().enumerate() {
                debug!("Workload {} {}", workload.id, workload.show_name());
                let mut samples: HashMap<FileFamily, RawSample> = HashMap::new();

                for (metric, table) in self.metrics.iter().zip(tables.iter_mut()) {
                    let sample = match samples.entry(metric.family) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => {
                            let path = raw_path(&self.input_dir, policy, workload, metric.family);
                            debug!("Reading {}", path.display());
                            entry.insert(RawSample::from_path(&path)?)
                        }
                    };

                    let value = metric.reduce(&sample.column(&metric.column())?)?;
                    table.set(row, policy, value);

                    // counted again for every max-reduced totals metric
                    if is_diagnostic
                        && metric.reduction == Reduction::Max
                        && metric.family == FileFamily::Totals
                    {
                        let clos = sample.sum(CLOS_CHANGES)?;
                        counters.phase_changes += sample.sum(PHASE_CHANGES)?;
                        counters.clos_changes += clos;
                        debug!("{}: {} CLOS changes in {:?}", metric.name, clos, sample.apps());
                    }
                }
                on_step(policy, workload);
            }
        }

        for (metric, table) in self.metrics.iter().zip(tables.iter_mut()) {
            table.add_gains(&self.default_policy, metric.direction)?;
        }

        Ok(AggregateReport { tables, counters })
    }
}
