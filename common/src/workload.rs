use std::{fs::read_to_string, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{AggregateError, Result};

/// A mix of co-scheduled applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    /// 1-based position in the workload list
    pub id: usize,
    pub apps: Vec<String>,
}

impl Workload {
    /// Name used by the harness for the mix's files, ie. `mcf-lbm-xz`
    pub fn show_name(&self) -> String {
        self.apps.join("-")
    }
}

pub fn parse_workloads(path: &Path, contents: &str) -> Result<Vec<Workload>> {
    let mixes: Option<Vec<Vec<String>>> = serde_yml::from_str(contents)?;
    let mixes = mixes.unwrap_or_default();
    if mixes.is_empty() {
        return Err(AggregateError::EmptyWorkloadList {
            path: path.to_path_buf(),
        });
    }
    Ok(mixes
        .into_iter()
        .enumerate()
        .map(|(i, apps)| Workload { id: i + 1, apps })
        .collect())
}

/// Loads a YAML list of workloads, each one a list of application names.
pub fn load_workloads(path: &Path) -> Result<Vec<Workload>> {
    let contents = read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => AggregateError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => err.into(),
    })?;
    parse_workloads(path, &contents)
}

/// Number of applications across all mixes
pub fn total_apps(workloads: &[Workload]) -> usize {
    workloads.iter().map(|w| w.apps.len()).sum()
}

#[cfg(test)]
mod tests {
    use std::{fs::write, path::PathBuf};

    use super::*;

    #[test]
    fn ids_follow_list_order() {
        let yaml = "- [mcf, lbm]\n- [xz, gcc, povray]\n";
        let workloads = parse_workloads(&PathBuf::from("w.yaml"), yaml).unwrap();
        assert_eq!(workloads.len(), 2);
        assert_eq!(workloads[0].id, 1);
        assert_eq!(workloads[1].id, 2);
        assert_eq!(workloads[0].show_name(), "mcf-lbm");
        assert_eq!(workloads[1].show_name(), "xz-gcc-povray");
        assert_eq!(total_apps(&workloads), 5);
    }

    #[test]
    fn empty_list_is_an_error() {
        for yaml in ["[]", "~"] {
            let err = parse_workloads(&PathBuf::from("w.yaml"), yaml).unwrap_err();
            assert!(matches!(err, AggregateError::EmptyWorkloadList { .. }));
        }
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workloads.yaml");
        write(&path, "- - a\n  - b\n").unwrap();
        let workloads = load_workloads(&path).unwrap();
        assert_eq!(workloads[0].apps, vec!["a", "b"]);

        let err = load_workloads(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, AggregateError::FileNotFound { .. }));
    }
}
