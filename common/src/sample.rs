use std::{
    fs::File,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
    error::{AggregateError, Result},
    metric::FileFamily,
    util::parse_value,
    workload::Workload,
};

/// `<inputdir>/<policy>/data-agg/<app1-...-appN><suffix>.csv`
pub fn raw_path(input_dir: &Path, policy: &str, workload: &Workload, family: FileFamily) -> PathBuf {
    input_dir
        .join(policy)
        .join("data-agg")
        .join(format!("{}{}.csv", workload.show_name(), family.suffix()))
}

/// One aggregated harness file: a row per application of the mix.
#[derive(Debug, Clone)]
pub struct RawSample {
    path: PathBuf,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl RawSample {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => AggregateError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => err.into(),
        })?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(file);
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| AggregateError::MissingColumn {
                column: column.to_owned(),
                path: self.path.clone(),
            })
    }

    /// Numeric values of `column`, one per application. Empty cells are NaN.
    pub fn column(&self, column: &str) -> Result<Vec<f64>> {
        let idx = self.position(column)?;
        self.rows
            .iter()
            .map(|row| {
                let cell = row.get(idx).unwrap_or_default();
                parse_value(cell).ok_or_else(|| AggregateError::InvalidValue {
                    value: cell.to_owned(),
                    column: column.to_owned(),
                    path: self.path.clone(),
                })
            })
            .collect()
    }

    /// Sum of `column` across all applications
    pub fn sum(&self, column: &str) -> Result<f64> {
        Ok(self.column(column)?.iter().filter(|x| !x.is_nan()).sum())
    }

    pub fn apps(&self) -> Option<Vec<&str>> {
        let idx = self.position("app").ok()?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).unwrap_or_default())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, write};

    use super::*;

    const SAMPLE: &str = "app,ipc:mean,ipc:std,interval:mean\n\
                          mcf,1.0,0.1,3.1\n\
                          lbm,2.0,0.2,7.4\n\
                          xz,4.0,0.1,2.0\n";

    fn workload() -> Workload {
        Workload {
            id: 1,
            apps: vec!["mcf".to_owned(), "lbm".to_owned(), "xz".to_owned()],
        }
    }

    #[test]
    fn raw_path_layout() {
        let path = raw_path(Path::new("data"), "noPart", &workload(), FileFamily::Totals);
        assert_eq!(path, PathBuf::from("data/noPart/data-agg/mcf-lbm-xz_tot.csv"));
        let path = raw_path(Path::new("data"), "dunn", &workload(), FileFamily::Finished);
        assert_eq!(path, PathBuf::from("data/dunn/data-agg/mcf-lbm-xz_fin.csv"));
    }

    #[test]
    fn read_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = raw_path(dir.path(), "noPart", &workload(), FileFamily::Finished);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(&path, SAMPLE).unwrap();

        let sample = RawSample::from_path(&path).unwrap();
        assert_eq!(sample.column("ipc:mean").unwrap(), vec![1.0, 2.0, 4.0]);
        assert_eq!(sample.sum("interval:mean").unwrap(), 3.1 + 7.4 + 2.0);
        assert_eq!(sample.apps().unwrap(), vec!["mcf", "lbm", "xz"]);

        let err = sample.column("antt:mean").unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn { column, .. } if column == "antt:mean"));
    }

    #[test]
    fn invalid_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_fin.csv");
        write(&path, "app,ipc:mean\nmcf,fast\n").unwrap();
        let err = RawSample::from_path(&path)
            .unwrap()
            .column("ipc:mean")
            .unwrap_err();
        assert!(matches!(err, AggregateError::InvalidValue { value, .. } if value == "fast"));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RawSample::from_path(&dir.path().join("nope_fin.csv")).unwrap_err();
        assert!(matches!(err, AggregateError::FileNotFound { .. }));
    }
}
