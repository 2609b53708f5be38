//! Plot geometry for the result chart.
//!
//! Turns sampled points into everything the line chart needs: the series,
//! auto-fitted axis bounds, grid lines at the tick positions, zero reference
//! lines and tick labels. Drawing itself is left to ratatui's `Chart`.

use crate::solve::GraphPoint;

const TICKS: usize = 5;
const PAD_RATIO: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotView {
    pub series: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Vertical segment at x = 0 when it is inside the x bounds
    pub x_zero: Option<[(f64, f64); 2]>,
    /// Horizontal segment at y = 0 when it is inside the y bounds
    pub y_zero: Option<[(f64, f64); 2]>,
    pub grid: Vec<[(f64, f64); 2]>,
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
}

impl PlotView {
    /// Returns `None` when there is nothing finite to draw.
    pub fn new(points: &[GraphPoint]) -> Option<Self> {
        let series: Vec<(f64, f64)> = points
            .iter()
            .filter(|p| p.is_finite())
            .map(|p| (p.x, p.y))
            .collect();

        if series.is_empty() {
            return None;
        }

        let x_bounds = fit_bounds(series.iter().map(|(x, _)| *x));
        let y_bounds = fit_bounds(series.iter().map(|(_, y)| *y));

        let x_zero = contains(x_bounds, 0.0).then(|| [(0.0, y_bounds[0]), (0.0, y_bounds[1])]);
        let y_zero = contains(y_bounds, 0.0).then(|| [(x_bounds[0], 0.0), (x_bounds[1], 0.0)]);

        let x_ticks = ticks(x_bounds);
        let y_ticks = ticks(y_bounds);

        let mut grid = Vec::new();
        for &x in &x_ticks[1..TICKS - 1] {
            grid.push([(x, y_bounds[0]), (x, y_bounds[1])]);
        }
        for &y in &y_ticks[1..TICKS - 1] {
            grid.push([(x_bounds[0], y), (x_bounds[1], y)]);
        }

        Some(Self {
            series,
            x_bounds,
            y_bounds,
            x_zero,
            y_zero,
            grid,
            x_labels: x_ticks.iter().map(|v| format_tick(*v)).collect(),
            y_labels: y_ticks.iter().map(|v| format_tick(*v)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Tooltip text for the sample at `index`.
    pub fn tooltip(&self, index: usize) -> Option<String> {
        self.series
            .get(index)
            .map(|(x, y)| format!("x = {}, y = {}", format_value(*x), format_value(*y)))
    }
}

fn fit_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = max - min;
    if span <= f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    let pad = span * PAD_RATIO;
    [min - pad, max + pad]
}

fn contains(bounds: [f64; 2], v: f64) -> bool {
    bounds[0] <= v && v <= bounds[1]
}

fn ticks(bounds: [f64; 2]) -> Vec<f64> {
    let step = (bounds[1] - bounds[0]) / (TICKS - 1) as f64;
    (0..TICKS).map(|i| bounds[0] + step * i as f64).collect()
}

fn format_tick(v: f64) -> String {
    let magnitude = v.abs();
    if magnitude >= 1000.0 || (magnitude > 0.0 && magnitude < 0.01) {
        format!("{:.1e}", v)
    } else if magnitude >= 10.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

fn format_value(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
