use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{metric::MetricRule, plot::Plot};

/// Optional `config.yaml`. Every field can also be given on the command
/// line, which takes precedence.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub workloads: Option<PathBuf>,
    pub default_policy: Option<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    pub diagnostic_policy: Option<String>,
    /// Extra metric rules, matched before the built-in ones
    #[serde(default)]
    pub metrics: Vec<MetricRule>,
    pub plots: Option<Vec<Box<dyn Plot>>>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)
            .context(format!("Reading config file {}", path.display()))?;
        serde_yml::from_str(&contents).context("Parsing config file")
    }
}

/// Picks the command-line list when one was given, else the config one
pub fn pick_list(cli: Vec<String>, config: &[String]) -> Vec<String> {
    if cli.is_empty() { config.to_vec() } else { cli }
}

#[cfg(test)]
mod tests {
    use crate::metric::{FileFamily, GainDirection, Reduction};

    use super::*;

    #[test]
    fn parse_config() {
        let yaml = r#"
input_dir: ./results
default_policy: noPart
policies: [noPart, dunn]
names:
  - ipc
  - interval
metrics:
  - pattern: "^llc"
    reduction: Max
    family: Finished
    direction: LowerIsBetter
"#;
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.input_dir, Some(PathBuf::from("./results")));
        assert_eq!(config.output_dir, None);
        assert_eq!(config.default_policy.as_deref(), Some("noPart"));
        assert_eq!(config.policies, vec!["noPart", "dunn"]);
        assert_eq!(config.names, vec!["ipc", "interval"]);
        assert_eq!(config.metrics.len(), 1);
        assert_eq!(config.metrics[0].reduction, Reduction::Max);
        assert_eq!(config.metrics[0].family, FileFamily::Finished);
        assert_eq!(config.metrics[0].direction, GainDirection::LowerIsBetter);
        assert_eq!(config.metrics[0].column, None);
        assert!(config.plots.is_none());
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(&dir.path().join("config.yaml")).is_err());
    }

    #[test]
    fn command_line_lists_win() {
        let config = vec!["a".to_owned()];
        assert_eq!(pick_list(vec![], &config), vec!["a"]);
        assert_eq!(pick_list(vec!["b".to_owned()], &config), vec!["b"]);
    }
}
