use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, WriterBuilder};
use tracing::warn;

use crate::{
    error::{AggregateError, Result},
    metric::GainDirection,
    util::{format_value, mean, parse_value},
    workload::Workload,
};

pub const ID_COLUMN: &str = "Workload_ID";
pub const NAME_COLUMN: &str = "Workload";
const GAIN_PREFIX: &str = "%gain";
const GAIN_SUFFIX: &str = ":mean";

pub fn gain_column_name(policy: &str) -> String {
    format!("{GAIN_PREFIX}{policy}{GAIN_SUFFIX}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadRow {
    pub id: usize,
    pub name: String,
}

impl From<&Workload> for WorkloadRow {
    fn from(workload: &Workload) -> Self {
        Self {
            id: workload.id,
            name: workload.show_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyColumn {
    pub policy: String,
    pub values: Vec<f64>,
}

/// Per-workload results of one metric: a raw column per policy and a gain
/// column per non-default policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub metric: String,
    pub rows: Vec<WorkloadRow>,
    pub policies: Vec<PolicyColumn>,
    pub gains: Vec<PolicyColumn>,
}

impl ResultTable {
    pub fn new(metric: &str, rows: Vec<WorkloadRow>, policies: &[String]) -> Self {
        let policies = policies
            .iter()
            .map(|policy| PolicyColumn {
                policy: policy.clone(),
                values: vec![f64::NAN; rows.len()],
            })
            .collect();
        Self {
            metric: metric.to_owned(),
            rows,
            policies,
            gains: Vec::new(),
        }
    }

    /// `<metric>table.csv`, with `/` in metric names replaced by `-`
    pub fn file_name(&self) -> String {
        format!("{}table.csv", self.metric.replace('/', "-"))
    }

    pub fn set(&mut self, row: usize, policy: &str, value: f64) {
        if let Some(column) = self.policies.iter_mut().find(|c| c.policy == policy)
            && let Some(cell) = column.values.get_mut(row)
        {
            *cell = value;
        }
    }

    pub fn column(&self, policy: &str) -> Option<&[f64]> {
        self.policies
            .iter()
            .find(|c| c.policy == policy)
            .map(|c| c.values.as_slice())
    }

    /// Gain column of `policy`. Accepts both `name` and `name:mean`.
    pub fn gain(&self, policy: &str) -> Option<&[f64]> {
        let policy = policy.strip_suffix(GAIN_SUFFIX).unwrap_or(policy);
        self.gains
            .iter()
            .find(|c| c.policy == policy)
            .map(|c| c.values.as_slice())
    }

    /// Adds a gain column for every policy other than `default`.
    pub fn add_gains(&mut self, default: &str, direction: GainDirection) -> Result<()> {
        let base = self
            .column(default)
            .ok_or_else(|| AggregateError::UnknownDefaultPolicy(default.to_owned()))?
            .to_vec();
        let gains = self
            .policies
            .iter()
            .filter(|c| c.policy != default)
            .map(|c| PolicyColumn {
                policy: c.policy.clone(),
                values: base
                    .iter()
                    .zip(&c.values)
                    .map(|(d, p)| direction.gain(*d, *p))
                    .collect(),
            })
            .collect::<Vec<_>>();
        for column in &gains {
            if column.values.iter().any(|x| !x.is_finite()) {
                warn!(
                    "Non-finite gain for {} on {}, check for zero values",
                    column.policy, self.metric
                );
            }
        }
        self.gains = gains;
        Ok(())
    }

    /// Mean gain of `policy` over all workloads, skipping NaN
    pub fn mean_gain(&self, policy: &str) -> Option<f64> {
        self.gain(policy).and_then(mean)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(writer);
        let mut header = vec![ID_COLUMN.to_owned(), NAME_COLUMN.to_owned()];
        header.extend(self.policies.iter().map(|c| c.policy.clone()));
        header.extend(self.gains.iter().map(|c| gain_column_name(&c.policy)));
        writer.write_record(&header)?;

        for (idx, row) in self.rows.iter().enumerate() {
            let mut record = vec![row.id.to_string(), row.name.clone()];
            record.extend(
                self.policies
                    .iter()
                    .chain(&self.gains)
                    .map(|c| format_value(c.values[idx])),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        self.to_writer(File::create(&path)?)?;
        Ok(path)
    }

    pub fn from_reader<R: Read>(metric: &str, path: &Path, reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.clone();
        let missing = |column: &str| AggregateError::MissingColumn {
            column: column.to_owned(),
            path: path.to_path_buf(),
        };
        let id_idx = headers
            .iter()
            .position(|h| h == ID_COLUMN)
            .ok_or_else(|| missing(ID_COLUMN))?;
        let name_idx = headers.iter().position(|h| h == NAME_COLUMN);

        // (column index, policy, is gain)
        let value_columns = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != id_idx && Some(*i) != name_idx)
            .map(|(i, h)| {
                match h
                    .strip_prefix(GAIN_PREFIX)
                    .and_then(|x| x.strip_suffix(GAIN_SUFFIX))
                {
                    Some(policy) => (i, policy.to_owned(), true),
                    None => (i, h.to_owned(), false),
                }
            })
            .collect::<Vec<_>>();

        let mut table = Self {
            metric: metric.to_owned(),
            rows: Vec::new(),
            policies: Vec::new(),
            gains: Vec::new(),
        };
        for (_, policy, is_gain) in &value_columns {
            let column = PolicyColumn {
                policy: policy.clone(),
                values: Vec::new(),
            };
            if *is_gain {
                table.gains.push(column);
            } else {
                table.policies.push(column);
            }
        }

        for record in reader.records() {
            let record = record?;
            let cell = |idx: usize, column: &str| {
                record.get(idx).map(|x| x.to_owned()).ok_or_else(|| missing(column))
            };
            let id = cell(id_idx, ID_COLUMN)?;
            let id: usize = id.trim().parse().map_err(|_| AggregateError::InvalidValue {
                value: id.clone(),
                column: ID_COLUMN.to_owned(),
                path: path.to_path_buf(),
            })?;
            let name = match name_idx {
                Some(idx) => cell(idx, NAME_COLUMN)?,
                None => String::new(),
            };
            table.rows.push(WorkloadRow { id, name });

            let (mut raw, mut gain) = (0, 0);
            for (idx, policy, is_gain) in &value_columns {
                let text = cell(*idx, policy.as_str())?;
                let value = parse_value(&text).ok_or_else(|| AggregateError::InvalidValue {
                    value: text.clone(),
                    column: policy.clone(),
                    path: path.to_path_buf(),
                })?;
                if *is_gain {
                    table.gains[gain].values.push(value);
                    gain += 1;
                } else {
                    table.policies[raw].values.push(value);
                    raw += 1;
                }
            }
        }
        Ok(table)
    }

    /// Reads `<dir>/<metric>table.csv`
    pub fn from_dir(dir: &Path, metric: &str) -> Result<Self> {
        let path = dir.join(format!("{}table.csv", metric.replace('/', "-")));
        let file = File::open(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => AggregateError::FileNotFound { path: path.clone() },
            _ => err.into(),
        })?;
        Self::from_reader(metric, &path, file)
    }
}
