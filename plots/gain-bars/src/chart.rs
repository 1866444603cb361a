use std::path::Path;

use common::plot::GainSeries;
use eyre::Result;
use plotters::prelude::*;
use tracing::debug;

use crate::pdf::write_pdf;

/// Styling of a gain bar chart. Both chart kinds share the layout and differ
/// only in these knobs.
#[derive(Debug, Clone)]
pub struct BarStyle {
    pub size: (u32, u32),
    pub font_size: f64,
    pub palette: &'static [RGBColor],
    pub legend: LegendCorner,
    /// Number of mixes on the x axis
    pub mixes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendCorner {
    UpperRight,
    LowerLeft,
}

impl LegendCorner {
    fn position(&self) -> SeriesLabelPosition {
        match self {
            LegendCorner::UpperRight => SeriesLabelPosition::UpperRight,
            LegendCorner::LowerLeft => SeriesLabelPosition::LowerLeft,
        }
    }
}

/// Total width of one workload's bar cluster, in x units
const CLUSTER_WIDTH: f64 = 0.5;

pub fn y_label(metric: &str) -> String {
    match metric {
        "ipc" => "GeoMean IPC Improvement (%)".to_owned(),
        "interval" => "TT Improvement (%)".to_owned(),
        "antt" => "ANTT Improvement (%)".to_owned(),
        other => format!("{other} Improvement (%)"),
    }
}

pub fn format_percent(y: f64) -> String {
    format!("{:.0}%", y * 100.0)
}

/// Label of the tick at `x`: the workload id at that position, with every
/// other label hidden.
pub fn tick_label(x: f64, ids: &[usize], mixes: usize) -> String {
    let pos = x.round();
    if (x - pos).abs() > 1e-6 || pos < 0.0 {
        return String::new();
    }
    let pos = pos as usize;
    if pos >= mixes || pos % 2 == 0 {
        return String::new();
    }
    ids.get(pos).map(|id| id.to_string()).unwrap_or_default()
}

/// Y range covering every finite value and zero, padded by 10%
pub fn y_range(series: &[GainSeries]) -> (f64, f64) {
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.values.iter())
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let pad = if hi > lo { (hi - lo) * 0.1 } else { 0.05 };
    (lo - pad, hi + pad)
}

/// Renders the chart to `filepath` as a PDF.
pub fn render_gain_bars(
    filepath: &Path,
    metric: &str,
    ids: &[usize],
    series: &[(String, GainSeries)],
    style: &BarStyle,
) -> Result<()> {
    let svg = render_svg(metric, ids, series, style)?;
    write_pdf(filepath, &svg)
}

/// Draws one bar cluster per workload and one bar per series into an SVG
/// document.
pub fn render_svg(
    metric: &str,
    ids: &[usize],
    series: &[(String, GainSeries)],
    style: &BarStyle,
) -> Result<String> {
    let mut svg = String::new();
    draw_chart(&mut svg, metric, ids, series, style)?;
    Ok(svg)
}

fn draw_chart(
    svg: &mut String,
    metric: &str,
    ids: &[usize],
    series: &[(String, GainSeries)],
    style: &BarStyle,
) -> Result<()> {
    let root = SVGBackend::with_string(svg, style.size).into_drawing_area();
    root.fill(&WHITE)?;

    let values = series.iter().map(|(_, s)| s.clone()).collect::<Vec<_>>();
    let (y_min, y_max) = y_range(&values);
    let x_max = style.mixes as f64;
    let font = ("sans-serif", style.font_size);
    debug!("{metric}: y range {y_min:.3}..{y_max:.3}, {} series", series.len());

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size((style.font_size * 3.0) as u32)
        .y_label_area_size((style.font_size * 5.0) as u32)
        .build_cartesian_2d(-1.0..x_max, y_min..y_max)?;

    let mixes = style.mixes;
    chart
        .configure_mesh()
        .x_labels(mixes + 2)
        .x_label_formatter(&|x| tick_label(*x, ids, mixes))
        .y_label_formatter(&|y| format_percent(*y))
        .x_desc("# Mix")
        .y_desc(y_label(metric))
        .label_style(font)
        .axis_desc_style(font)
        .light_line_style(WHITE)
        .bold_line_style(BLACK.mix(0.15))
        .draw()?;

    let bar_width = CLUSTER_WIDTH / series.len().max(1) as f64;
    for (j, (label, s)) in series.iter().enumerate() {
        let color = style.palette[j % style.palette.len()];
        let offset = -CLUSTER_WIDTH / 2.0 + j as f64 * bar_width;
        chart
            .draw_series(
                s.values
                    .iter()
                    .enumerate()
                    .filter(|(i, v)| v.is_finite() && *i < mixes)
                    .map(|(i, v)| {
                        let x0 = i as f64 + offset;
                        Rectangle::new([(x0, 0.0), (x0 + bar_width, *v)], color.filled())
                    }),
            )?
            .label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled()));
    }

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(-1.0, 0.0), (x_max, 0.0)],
        BLACK,
    )))?;

    chart
        .configure_series_labels()
        .position(style.legend.position())
        .label_font(font)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
