use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AggregateError, Result},
    util,
};

/// How the per-application rows of a raw sample collapse into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reduction {
    Max,
    Mean,
    GeoMean,
}

impl Reduction {
    pub fn apply(&self, column: &str, values: &[f64]) -> Result<f64> {
        let reduced = match self {
            Reduction::Max => util::max(values),
            Reduction::Mean => util::mean(values),
            Reduction::GeoMean => util::geometric_mean(values),
        };
        reduced.ok_or_else(|| AggregateError::EmptySample {
            column: column.to_owned(),
        })
    }
}

/// Which aggregated file of the harness a metric is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFamily {
    /// `_tot.csv`: totals over the whole run
    Totals,
    /// `_fin.csv`: values at the point each application finished
    Finished,
}

impl FileFamily {
    pub fn suffix(&self) -> &'static str {
        match self {
            FileFamily::Totals => "_tot",
            FileFamily::Finished => "_fin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GainDirection {
    HigherIsBetter,
    LowerIsBetter,
}

impl GainDirection {
    /// Percentage improvement of `policy` over `default`. Positive means the
    /// policy is better regardless of direction.
    pub fn gain(&self, default: f64, policy: f64) -> f64 {
        match self {
            GainDirection::HigherIsBetter => (policy / default - 1.0) * 100.0,
            GainDirection::LowerIsBetter => (default / policy - 1.0) * 100.0,
        }
    }
}

/// A metric rule from the config file. The first rule whose `pattern` matches
/// the metric name decides how the metric is read, reduced and compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    pub pattern: String,
    pub reduction: Reduction,
    pub family: FileFamily,
    pub direction: GainDirection,
    /// Column to read instead of the metric's own name
    pub column: Option<String>,
}

impl MetricRule {
    fn new(
        pattern: &str,
        reduction: Reduction,
        family: FileFamily,
        direction: GainDirection,
        column: Option<&str>,
    ) -> Self {
        Self {
            pattern: pattern.to_owned(),
            reduction,
            family,
            direction,
            column: column.map(|x| x.to_owned()),
        }
    }

    fn matches(&self, name: &str) -> Result<bool> {
        let re = Regex::new(&self.pattern).map_err(|source| AggregateError::InvalidRule {
            pattern: self.pattern.clone(),
            source,
        })?;
        Ok(re.is_match(name))
    }
}

pub fn builtin_rules() -> Vec<MetricRule> {
    use FileFamily::*;
    use GainDirection::*;
    use Reduction::*;
    vec![
        MetricRule::new("^interval$", Max, Totals, LowerIsBetter, None),
        MetricRule::new("power", Max, Totals, LowerIsBetter, None),
        MetricRule::new("^geoipc$", GeoMean, Finished, HigherIsBetter, Some("ipc")),
        MetricRule::new("^ipc$", Mean, Finished, HigherIsBetter, None),
    ]
}

/// Resolved configuration of one requested metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub name: String,
    pub source: String,
    pub reduction: Reduction,
    pub family: FileFamily,
    pub direction: GainDirection,
}

impl MetricSpec {
    /// Resolves `name` against `user_rules` first, then the built-in rules.
    pub fn resolve(name: &str, user_rules: &[MetricRule]) -> Result<Self> {
        for rule in user_rules.iter().chain(builtin_rules().iter()) {
            if rule.matches(name)? {
                return Ok(Self {
                    name: name.to_owned(),
                    source: rule.column.clone().unwrap_or_else(|| name.to_owned()),
                    reduction: rule.reduction,
                    family: rule.family,
                    direction: rule.direction,
                });
            }
        }
        Ok(Self {
            name: name.to_owned(),
            source: name.to_owned(),
            reduction: Reduction::Mean,
            family: FileFamily::Finished,
            direction: GainDirection::LowerIsBetter,
        })
    }

    /// Header of the raw sample column holding this metric
    pub fn column(&self) -> String {
        format!("{}:mean", self.source)
    }

    pub fn reduce(&self, values: &[f64]) -> Result<f64> {
        self.reduction.apply(&self.column(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> MetricSpec {
        MetricSpec::resolve(name, &[]).unwrap()
    }

    #[test]
    fn builtin_resolution() {
        let interval = resolve("interval");
        assert_eq!(interval.reduction, Reduction::Max);
        assert_eq!(interval.family, FileFamily::Totals);
        assert_eq!(interval.direction, GainDirection::LowerIsBetter);
        assert_eq!(interval.column(), "interval:mean");

        let power = resolve("llc_power");
        assert_eq!(power.reduction, Reduction::Max);
        assert_eq!(power.family.suffix(), "_tot");

        let geoipc = resolve("geoipc");
        assert_eq!(geoipc.reduction, Reduction::GeoMean);
        assert_eq!(geoipc.column(), "ipc:mean");
        assert_eq!(geoipc.direction, GainDirection::HigherIsBetter);

        let ipc = resolve("ipc");
        assert_eq!(ipc.reduction, Reduction::Mean);
        assert_eq!(ipc.family.suffix(), "_fin");
        assert_eq!(ipc.direction, GainDirection::HigherIsBetter);

        let antt = resolve("antt");
        assert_eq!(antt.reduction, Reduction::Mean);
        assert_eq!(antt.family, FileFamily::Finished);
        assert_eq!(antt.direction, GainDirection::LowerIsBetter);

        // Only an exact "interval" goes to the totals file
        assert_eq!(resolve("interval_fin").family, FileFamily::Finished);
    }

    #[test]
    fn user_rules_take_precedence() {
        let rules = vec![MetricRule::new(
            "^ipc$",
            Reduction::GeoMean,
            FileFamily::Totals,
            GainDirection::HigherIsBetter,
            None,
        )];
        let ipc = MetricSpec::resolve("ipc", &rules).unwrap();
        assert_eq!(ipc.reduction, Reduction::GeoMean);
        assert_eq!(ipc.family, FileFamily::Totals);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let rules = vec![MetricRule::new(
            "(",
            Reduction::Max,
            FileFamily::Totals,
            GainDirection::LowerIsBetter,
            None,
        )];
        let err = MetricSpec::resolve("ipc", &rules).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRule { .. }));
    }

    #[test]
    fn reductions() {
        let mean = resolve("antt").reduce(&[1.0, 2.0, 6.0]).unwrap();
        assert!((mean - 3.0).abs() < 1e-12);

        let geo = resolve("geoipc").reduce(&[1.0, 2.0, 4.0]).unwrap();
        assert!((geo - 2.0).abs() < 1e-12);

        let max = resolve("interval").reduce(&[3.1, 7.4, 2.0]).unwrap();
        assert_eq!(max, 7.4);

        let err = resolve("antt").reduce(&[]).unwrap_err();
        assert!(matches!(err, AggregateError::EmptySample { column } if column == "antt:mean"));
    }

    #[test]
    fn gain_sign_convention() {
        let ipc = resolve("ipc").direction.gain(100.0, 120.0);
        assert!((ipc - 20.0).abs() < 1e-9);

        let interval = resolve("interval").direction.gain(100.0, 80.0);
        assert!((interval - 25.0).abs() < 1e-9);

        // Worse policies go negative in both directions
        assert!(GainDirection::HigherIsBetter.gain(100.0, 90.0) < 0.0);
        assert!(GainDirection::LowerIsBetter.gain(100.0, 110.0) < 0.0);
    }
}
