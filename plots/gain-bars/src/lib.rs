use std::path::{Path, PathBuf};

use common::{
    plot::{Plot, gain_series},
    table::ResultTable,
};
use eyre::{Result, bail};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod chart;
pub mod pdf;

use chart::{BarStyle, LegendCorner, render_gain_bars};

pub const DEFAULT_MIXES: usize = 31;

const RELATIVE_PALETTE: [RGBColor; 9] = [
    RGBColor(0x37, 0x7e, 0xb8),
    RGBColor(0xff, 0x7f, 0x00),
    RGBColor(0x4d, 0xaf, 0x4a),
    RGBColor(0xf7, 0x81, 0xbf),
    RGBColor(0xa6, 0x56, 0x28),
    RGBColor(0x98, 0x4e, 0xa3),
    RGBColor(0x99, 0x99, 0x99),
    RGBColor(0xe4, 0x1a, 0x1c),
    RGBColor(0xde, 0xde, 0x00),
];

const GENERAL_PALETTE: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

fn default_mixes() -> usize {
    DEFAULT_MIXES
}

/// Large-font chart with a fixed palette, written as `<metric>-3-relative.pdf`.
/// Legend entries are the gain column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeGainBars {
    #[serde(default = "default_mixes")]
    pub mixes: usize,
}

impl Default for RelativeGainBars {
    fn default() -> Self {
        Self {
            mixes: DEFAULT_MIXES,
        }
    }
}

#[typetag::serde]
impl Plot for RelativeGainBars {
    fn filename(&self, metric: &str) -> String {
        format!("{}-3-relative.pdf", metric.replace('/', "-"))
    }

    fn plot(&self, table: &ResultTable, policies: &[String], plot_path: &Path) -> Result<PathBuf> {
        let style = BarStyle {
            size: (1100, 800),
            font_size: 22.0,
            palette: &RELATIVE_PALETTE,
            legend: LegendCorner::UpperRight,
            mixes: self.mixes,
        };
        draw(self, table, policies, gain_labels(policies), plot_path, &style)
    }
}

/// Smaller-font chart cycling through a ten colour palette, written as
/// `<metric>.pdf`. Legend entries are the policy names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralGainBars {
    #[serde(default = "default_mixes")]
    pub mixes: usize,
}

impl Default for GeneralGainBars {
    fn default() -> Self {
        Self {
            mixes: DEFAULT_MIXES,
        }
    }
}

#[typetag::serde]
impl Plot for GeneralGainBars {
    fn filename(&self, metric: &str) -> String {
        format!("{}.pdf", metric.replace('/', "-"))
    }

    fn plot(&self, table: &ResultTable, policies: &[String], plot_path: &Path) -> Result<PathBuf> {
        let style = BarStyle {
            size: (1100, 600),
            font_size: 14.0,
            palette: &GENERAL_PALETTE,
            legend: LegendCorner::LowerLeft,
            mixes: self.mixes,
        };
        draw(self, table, policies, policy_labels(policies), plot_path, &style)
    }
}

fn gain_labels(policies: &[String]) -> Vec<String> {
    policies.iter().map(|p| format!("%gain{p}")).collect()
}

fn policy_labels(policies: &[String]) -> Vec<String> {
    policies
        .iter()
        .map(|p| p.strip_suffix(":mean").unwrap_or(p).to_owned())
        .collect()
}

fn draw(
    plot: &dyn Plot,
    table: &ResultTable,
    policies: &[String],
    labels: Vec<String>,
    plot_path: &Path,
    style: &BarStyle,
) -> Result<PathBuf> {
    if policies.is_empty() {
        bail!("No policies to plot for {}", table.metric);
    }
    if table.rows.len() > style.mixes {
        debug!(
            "{} has {} workloads, only the first {} are drawn",
            table.metric,
            table.rows.len(),
            style.mixes
        );
    }
    let series = gain_series(table, policies)?;
    let ids = table.rows.iter().map(|r| r.id).collect::<Vec<_>>();
    let filepath = plot_path.join(plot.filename(&table.metric));
    render_gain_bars(
        &filepath,
        &table.metric,
        &ids,
        &labels.into_iter().zip(series).collect::<Vec<_>>(),
        style,
    )?;
    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use std::fs::read;

    use common::{
        metric::GainDirection,
        table::{ResultTable, WorkloadRow},
    };

    use super::*;

    fn table() -> ResultTable {
        let rows = (1..=4)
            .map(|id| WorkloadRow {
                id,
                name: format!("app{id}-app{}", id + 1),
            })
            .collect();
        let policies = vec!["noPart".to_owned(), "dunn".to_owned(), "CPA_0.2".to_owned()];
        let mut table = ResultTable::new("interval", rows, &policies);
        for row in 0..4 {
            table.set(row, "noPart", 100.0);
            table.set(row, "dunn", 90.0 + row as f64 * 5.0);
            table.set(row, "CPA_0.2", 80.0);
        }
        table.add_gains("noPart", GainDirection::LowerIsBetter).unwrap();
        table
    }

    fn policies() -> Vec<String> {
        vec!["dunn".to_owned(), "CPA_0.2".to_owned()]
    }

    #[test]
    fn relative_chart() {
        let dir = tempfile::tempdir().unwrap();
        let plot = RelativeGainBars::default();
        let path = plot.plot(&table(), &policies(), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("interval-3-relative.pdf"));
        assert!(read(&path).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn general_chart() {
        let dir = tempfile::tempdir().unwrap();
        let plot = GeneralGainBars { mixes: 4 };
        let policies = vec!["dunn:mean".to_owned()];
        let path = plot.plot(&table(), &policies, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("interval.pdf"));
        assert!(read(&path).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn legend_labels() {
        let policies = vec!["dunn:mean".to_owned(), "CPA_0.2".to_owned()];
        assert_eq!(gain_labels(&policies), ["%gaindunn:mean", "%gainCPA_0.2"]);
        assert_eq!(policy_labels(&policies), ["dunn", "CPA_0.2"]);
    }

    #[test]
    fn unknown_policy_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = RelativeGainBars::default()
            .plot(&table(), &["noPart".to_owned()], dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("noPart"));
        assert!(
            RelativeGainBars::default()
                .plot(&table(), &[], dir.path())
                .is_err()
        );
    }

    #[test]
    fn plots_from_config() {
        let yaml = "- type: RelativeGainBars\n- type: GeneralGainBars\n  mixes: 10\n";
        let plots: Vec<Box<dyn Plot>> = serde_yml::from_str(yaml).unwrap();
        assert_eq!(plots[0].filename("ipc"), "ipc-3-relative.pdf");
        assert_eq!(plots[1].filename("llc/power"), "llc-power.pdf");
    }
}
