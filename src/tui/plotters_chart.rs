//! Plotters-powered multi-series line chart widget for Ratatui.
//!
//! Plotters draws the axes and line series; the surrounding date ticks and
//! legend are plain Ratatui text (see `tui::draw_axis_ticks`). We render Plotters
//! output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// High-contrast palette, assigned to series in order (cycled).
pub const PALETTE: [(u8, u8, u8); 8] = [
    (0, 255, 255),
    (255, 200, 0),
    (0, 255, 0),
    (255, 80, 80),
    (200, 120, 255),
    (255, 255, 255),
    (80, 160, 255),
    (255, 128, 192),
];

/// Ratatui colour matching `PALETTE[idx]`, for legends drawn as text.
pub fn series_color(idx: usize) -> Color {
    let (r, g, b) = PALETTE[idx % PALETTE.len()];
    Color::Rgb(r, g, b)
}

/// One line on the chart. `points` are `(days since origin, value)`.
pub struct ChartLine<'a> {
    pub points: &'a [(f64, f64)],
}

/// A render-only chart description. All bounds are computed outside the
/// render call.
pub struct SeriesChart<'a> {
    pub lines: &'a [ChartLine<'a>],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl Widget for SeriesChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 6 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let lines = self.lines;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(0)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Tick labels are drawn by the caller; Plotters only draws axes.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(0)
                .axis_style(&WHITE)
                .draw()?;

            for (idx, line) in lines.iter().enumerate() {
                let (r, g, b) = PALETTE[idx % PALETTE.len()];
                let color = RGBColor(r, g, b);
                if line.points.len() == 1 {
                    // A single bucket has no segment to draw.
                    chart.draw_series(line.points.iter().map(|&p| Pixel::new(p, color)))?;
                } else {
                    chart.draw_series(LineSeries::new(line.points.iter().copied(), &color))?;
                }
            }
            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color(0), series_color(PALETTE.len()));
        assert_ne!(series_color(0), series_color(1));
    }

    #[test]
    fn tiny_area_renders_hint() {
        let area = Rect::new(0, 0, 50, 3);
        let mut buf = Buffer::empty(area);
        SeriesChart {
            lines: &[],
            x_bounds: [0.0, 1.0],
            y_bounds: [0.0, 1.0],
        }
        .render(area, &mut buf);
        let first: String = (0..5u16).map(|x| buf[(x, 0u16)].symbol().to_string()).collect();
        assert_eq!(first, "Chart");
    }
}
