use std::{fs::create_dir_all, path::PathBuf};

use clap::Args;
use common::{
    aggregate::{Aggregator, DEFAULT_DIAGNOSTIC_POLICY},
    config::{Config, pick_list},
    metric::MetricSpec,
    workload::load_workloads,
};
use eyre::{Context, ContextCompat, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::{debug, info};

pub const DEFAULT_POLICY: &str = "noPart";

#[derive(Args)]
pub struct TableArgs {
    /// YAML file with the list of workloads
    #[arg(short, long)]
    workloads: Option<PathBuf>,
    /// Directory where the tables are written [default: ./output]
    #[arg(short, long = "outputdir", alias = "output-dir")]
    outputdir: Option<PathBuf>,
    /// Directory holding one folder of raw results per policy [default: ./data]
    #[arg(short, long = "inputdir", alias = "input-dir")]
    inputdir: Option<PathBuf>,
    /// Metrics to tabulate, ie. ipc, geoipc, interval, antt
    #[arg(short, long)]
    names: Vec<String>,
    /// Policies to compare
    #[arg(short, long)]
    policies: Vec<String>,
    /// Policy the others are compared against [default: noPart]
    #[arg(short, long)]
    default_policy: Option<String>,
    /// Policy whose partition changes are counted [default: CPA_0.2]
    #[arg(long)]
    diagnostic_policy: Option<String>,
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub fn run_table(args: TableArgs, no_progress: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let workloads_file = args
        .workloads
        .or(config.workloads.clone())
        .context("No workloads file, pass --workloads or set workloads in the config")?;
    let output_dir = args
        .outputdir
        .or(config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("./output"));
    let input_dir = args
        .inputdir
        .or(config.input_dir.clone())
        .unwrap_or_else(|| PathBuf::from("./data"));
    let names = pick_list(args.names, &config.names);
    let policies = pick_list(args.policies, &config.policies);
    let default_policy = args
        .default_policy
        .or(config.default_policy.clone())
        .unwrap_or_else(|| DEFAULT_POLICY.to_owned());
    let diagnostic_policy = args
        .diagnostic_policy
        .or(config.diagnostic_policy.clone())
        .unwrap_or_else(|| DEFAULT_DIAGNOSTIC_POLICY.to_owned());

    if names.is_empty() {
        bail!("No metrics requested, pass --names or set names in the config");
    }
    let metrics = names
        .iter()
        .map(|name| MetricSpec::resolve(name, &config.metrics))
        .collect::<Result<Vec<_>, _>>()?;
    for metric in &metrics {
        debug!(
            "{}: {:?} of {} from {} files",
            metric.name,
            metric.reduction,
            metric.column(),
            metric.family.suffix()
        );
    }

    let workloads = load_workloads(&workloads_file)?;
    debug!(
        "{} workloads, policies {}",
        workloads.len(),
        policies.iter().join(", ")
    );

    let aggregator = Aggregator {
        input_dir,
        metrics,
        policies,
        default_policy,
        diagnostic_policy: Some(diagnostic_policy),
    };

    let pb = if no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new((aggregator.policies.len() * workloads.len()) as u64)
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    let report = aggregator.run_with(&workloads, |policy, workload| {
        pb.set_message(format!("{policy} {}", workload.show_name()));
        pb.inc(1);
    });
    pb.finish_and_clear();
    let report = report?;

    print!("{}", report.summary(&aggregator.default_policy));

    create_dir_all(&output_dir)
        .context(format!("Create output dir {}", output_dir.display()))?;
    for path in report.write_tables(&output_dir)? {
        info!("Wrote {}", path.display());
    }
    Ok(())
}
