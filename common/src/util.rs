/// Arithmetic mean, skipping NaN entries. `None` when nothing is left.
pub fn mean(data: &[f64]) -> Option<f64> {
    let (sum, count) = data
        .iter()
        .filter(|x| !x.is_nan())
        .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Maximum, skipping NaN entries.
pub fn max(data: &[f64]) -> Option<f64> {
    data.iter()
        .copied()
        .filter(|x| !x.is_nan())
        .reduce(f64::max)
}

/// Geometric mean computed in log space. NaN and non-positive inputs are not
/// skipped: zero yields 0 and a negative value yields NaN.
pub fn geometric_mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let log_sum: f64 = data.iter().map(|x| x.ln()).sum();
    Some((log_sum / data.len() as f64).exp())
}

/// Formats a cell the way the tables are written: NaN becomes an empty cell.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Inverse of [`format_value`]. `None` when the cell is not a number.
pub fn parse_value(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        Some(f64::NAN)
    } else {
        cell.parse::<f64>().ok()
    }
}
