//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series is drawn as a line using its own marker character; a legend
//! maps markers back to group names.

use chrono::NaiveDate;

use crate::aggregate::{BucketedTable, Series};
use crate::domain::MeasurementFamily;

/// Marker characters, assigned to series in order (cycled).
const MARKERS: [char; 8] = ['*', 'o', '+', 'x', '#', '@', '%', '&'];

/// Render one metric of a bucketed table as a multi-series line plot.
pub fn render_ascii_plot(
    buckets: &BucketedTable,
    metric: MeasurementFamily,
    width: usize,
    height: usize,
) -> String {
    let series = buckets.series(metric);
    render_series(&series, metric.name(), width, height)
}

/// Render date/value series into a fixed-size character grid.
pub fn render_series(series: &[Series], label: &str, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((d_min, d_max)) = date_range(series) else {
        return format!("Plot: {label} | no data\n");
    };
    let (y_min, y_max) = y_range(series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let x_span = (d_max - d_min).num_days().max(1) as f64;
    let mut grid = vec![vec![' '; width]; height];

    for (idx, s) in series.iter().enumerate() {
        let marker = MARKERS[idx % MARKERS.len()];
        let mut prev = None;
        for &(d, v) in &s.points {
            let x = map_x((d - d_min).num_days() as f64, x_span, width);
            let y = map_y(v, y_min, y_max, height);
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, x, y, '.');
            }
            prev = Some((x, y));
        }
        // Markers go on top of connecting lines.
        for &(d, v) in &s.points {
            let x = map_x((d - d_min).num_days() as f64, x_span, width);
            let y = map_y(v, y_min, y_max, height);
            grid[y][x] = marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {label} | dates=[{d_min}, {d_max}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(idx, s)| format!("{} {}", MARKERS[idx % MARKERS.len()], s.group))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join(" | ")));

    out
}

fn date_range(series: &[Series]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = series.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

fn y_range(series: &[Series]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for s in series {
        for &(_, v) in &s.points {
            min_y = min_y.min(v);
            max_y = max_y.max(v);
        }
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat series: give it some vertical room.
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(offset: f64, span: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = (offset / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
