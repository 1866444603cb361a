use std::path::PathBuf;

use clap::{Args, ValueEnum};
use common::{
    config::{Config, pick_list},
    plot::Plot,
    workload::load_workloads,
};
use eyre::{Result, bail};
use gain_bars::{GeneralGainBars, RelativeGainBars};
use tracing::{debug, info};

use crate::table::DEFAULT_POLICY;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Style {
    /// Large fonts, `<metric>-3-relative.pdf`
    Relative,
    /// Smaller fonts, `<metric>.pdf`
    General,
}

impl Style {
    fn plot(&self) -> Box<dyn Plot> {
        match self {
            Style::Relative => Box::new(RelativeGainBars::default()),
            Style::General => Box::new(GeneralGainBars::default()),
        }
    }
}

#[derive(Args)]
pub struct PlotArgs {
    /// Directory where the charts are written [default: ./output]
    #[arg(short, long = "outputdir", alias = "output-dir")]
    outputdir: Option<PathBuf>,
    /// Directory holding the `<metric>table.csv` files [default: ./data]
    #[arg(short, long = "inputdir", alias = "input-dir")]
    inputdir: Option<PathBuf>,
    /// YAML file with the list of workloads
    #[arg(short, long)]
    file_name: Option<PathBuf>,
    /// Metrics to plot
    #[arg(short, long)]
    metric: Vec<String>,
    /// Policies to plot, one bar each
    #[arg(short, long)]
    policy: Vec<String>,
    /// Chart style, overrides the plots listed in the config
    #[arg(long, value_enum)]
    style: Option<Style>,
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub fn run_plot(args: PlotArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let output_dir = args
        .outputdir
        .or(config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("./output"));
    let input_dir = args
        .inputdir
        .or(config.input_dir.clone())
        .unwrap_or_else(|| PathBuf::from("./data"));
    let metrics = pick_list(args.metric, &config.names);
    let default_policy = config.default_policy.as_deref().unwrap_or(DEFAULT_POLICY);
    let policies = if args.policy.is_empty() {
        config
            .policies
            .iter()
            .filter(|p| p.as_str() != default_policy)
            .cloned()
            .collect()
    } else {
        args.policy
    };

    if let Some(path) = args.file_name.or(config.workloads.clone()) {
        let workloads = load_workloads(&path)?;
        debug!("{} workloads listed in {}", workloads.len(), path.display());
    }
    if metrics.is_empty() {
        bail!("No metrics to plot, pass --metric or set names in the config");
    }

    let plots = match (args.style, config.plots) {
        (Some(style), _) => vec![style.plot()],
        (None, Some(plots)) => plots,
        (None, None) => vec![Style::Relative.plot()],
    };
    debug!("Plots: {plots:?}");

    let written = common::plot::plot(&plots, &metrics, &policies, &input_dir, &output_dir)?;
    info!("Wrote {} charts to {}", written.len(), output_dir.display());
    Ok(())
}
