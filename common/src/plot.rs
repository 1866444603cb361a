use core::fmt::Debug;
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, ContextCompat, Result};
use itertools::Itertools;
use tracing::{debug, info};

use crate::table::ResultTable;

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Name of the file written for `metric`, without directory
    fn filename(&self, metric: &str) -> String;
    /// Renders the gain columns of `table`
    ///
    /// Arguments:
    /// * `table` - The metric table, as written by the table command
    /// * `policies` - Policies to draw, one bar per policy and workload
    /// * `plot_path` - Directory the chart is written to
    fn plot(&self, table: &ResultTable, policies: &[String], plot_path: &Path) -> Result<PathBuf>;
}
clone_trait_object!(Plot);

/// A named series of gains, scaled from percentage points to fractions
#[derive(Debug, Clone, PartialEq)]
pub struct GainSeries {
    pub policy: String,
    pub values: Vec<f64>,
}

pub fn gain_series(table: &ResultTable, policies: &[String]) -> Result<Vec<GainSeries>> {
    policies
        .iter()
        .map(|policy| {
            let values = table.gain(policy).with_context(|| {
                format!(
                    "No gain column for {policy} in {} (available: {})",
                    table.file_name(),
                    table.gains.iter().map(|c| c.policy.as_str()).join(", ")
                )
            })?;
            Ok(GainSeries {
                policy: policy.clone(),
                values: values.iter().map(|x| x / 100.0).collect(),
            })
        })
        .collect()
}

pub fn ensure_plot_dirs(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        create_dir_all(dir).context(format!("Create plot dir {}", dir.display()))?;
    }
    Ok(())
}

/// Reads `<metric>table.csv` from `data_path` for each metric and hands it to
/// every plot.
pub fn plot(
    plots: &[Box<dyn Plot>],
    metrics: &[String],
    policies: &[String],
    data_path: &Path,
    plot_path: &Path,
) -> Result<Vec<PathBuf>> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(Vec::new());
    }
    ensure_plot_dirs(&[plot_path.to_path_buf()])?;

    let mut written = Vec::new();
    for metric in metrics {
        let table = ResultTable::from_dir(data_path, metric)
            .context(format!("Load {metric} table"))?;
        debug!("Loaded {} with {} workloads", table.file_name(), table.rows.len());
        for plot in plots {
            let path = plot.plot(&table, policies, plot_path)?;
            info!("Wrote {}", path.display());
            written.push(path);
        }
    }
    Ok(written)
}
