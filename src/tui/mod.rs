//! Ratatui-based terminal UI.
//!
//! The dashboard shows a sidebar with one selection list per filterable field,
//! sales and restock charts (one line per group) and a scrollable table of the
//! filtered records. Every interaction re-runs the pipeline on the loaded
//! table. A rejected change (bad range, unreadable file) only updates the
//! status bar and keeps the last good view; a change that matches nothing is
//! kept and replaces the charts with a "no data" message.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table},
    Terminal,
};
use tracing::{debug, info, warn};

use crate::app::pipeline::{self, DashboardView};
use crate::cli::DashboardArgs;
use crate::domain::{DashboardConfig, DateRange, IdentifierField, MeasurementFamily};
use crate::error::{AppError, PipelineError};
use crate::filter;
use crate::io::{Ingested, LoadCache};
use crate::report::{fmt_num, truncate};

mod plotters_chart;

use plotters_chart::{series_color, ChartLine, SeriesChart};

/// Start the TUI.
///
/// The input file is resolved and loaded before the terminal is switched to
/// raw mode, so load errors (and the CSV picker) use the normal terminal.
pub fn run(args: DashboardArgs) -> Result<(), AppError> {
    let path = crate::app::resolve_input(&args)?;
    let mut cache = LoadCache::new();
    let ingested = cache.get_or_load(&path)?;
    let config = args.to_config(ingested.table.date_bounds());
    pipeline::validate_selections(&ingested.table, &config.selections)?;

    let mut app = App::new(path, ingested, cache, config);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Filters,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    DateRange,
    OpenFile,
}

struct App {
    path: PathBuf,
    ingested: Arc<Ingested>,
    cache: LoadCache,
    /// Config of the last accepted run.
    config: DashboardConfig,
    /// `None` when the accepted config matches no records.
    view: Option<DashboardView>,
    /// Cross-filtered options, kept even when `view` is `None`.
    options: Vec<(IdentifierField, Vec<String>)>,
    focus: Focus,
    /// Index into `IdentifierField::FILTERABLE`.
    field_idx: usize,
    cursors: [usize; IdentifierField::FILTERABLE.len()],
    table_offset: usize,
    mode: InputMode,
    input: String,
    status: String,
}

impl App {
    fn new(path: PathBuf, ingested: Arc<Ingested>, cache: LoadCache, config: DashboardConfig) -> Self {
        let mut app = Self {
            path,
            ingested,
            cache,
            config: config.clone(),
            view: None,
            options: Vec::new(),
            focus: Focus::Filters,
            field_idx: 0,
            cursors: [0; IdentifierField::FILTERABLE.len()],
            table_offset: 0,
            mode: InputMode::Normal,
            input: String::new(),
            status: String::new(),
        };
        if app.apply(config) {
            app.status = format!(
                "Loaded {} records from {}",
                app.ingested.table.len(),
                app.path.display()
            );
        }
        app
    }

    /// Run the pipeline for `candidate`. Returns `true` when a view was produced.
    ///
    /// An empty result still commits `candidate` (with stale values pruned) and
    /// clears the view; any other error leaves config and view untouched.
    fn apply(&mut self, candidate: DashboardConfig) -> bool {
        let table = &self.ingested.table;
        match pipeline::run_view(table, &candidate) {
            Ok(view) => {
                self.config = DashboardConfig {
                    selections: view.selections.clone(),
                    ..candidate
                };
                self.options = view.options.clone();
                self.view = Some(view);
                self.clamp_cursors();
                self.table_offset = 0;
                self.status.clear();
                true
            }
            Err(PipelineError::EmptyResult) => {
                debug!(config = ?candidate, "no matching data");
                let selections = filter::prune(table, &candidate.selections);
                self.options = filter::all_options(table, &selections);
                self.config = DashboardConfig { selections, ..candidate };
                self.view = None;
                self.clamp_cursors();
                self.table_offset = 0;
                self.status = PipelineError::EmptyResult.to_string();
                false
            }
            Err(err) => {
                warn!(error = %err, "dashboard update rejected");
                self.status = err.to_string();
                false
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn field(&self) -> IdentifierField {
        IdentifierField::FILTERABLE[self.field_idx]
    }

    fn options(&self, field: IdentifierField) -> &[String] {
        self.options
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, opts)| opts.as_slice())
            .unwrap_or_default()
    }

    fn clamp_cursors(&mut self) {
        for (idx, field) in IdentifierField::FILTERABLE.iter().enumerate() {
            let n = self.options(*field).len();
            self.cursors[idx] = self.cursors[idx].min(n.saturating_sub(1));
        }
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.mode != InputMode::Normal {
            self.handle_input(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Filters => Focus::Table,
                    Focus::Table => Focus::Filters,
                };
            }
            KeyCode::Char('b') => {
                let mut next = self.config.clone();
                next.bucket = next.bucket.next();
                if self.apply(next) {
                    self.status = format!("bucket: {}", self.config.bucket.label());
                }
            }
            KeyCode::Char('g') => {
                let mut next = self.config.clone();
                next.group_by = next.group_by.next();
                if self.apply(next) {
                    self.status = format!("group by: {}", self.config.group_by);
                }
            }
            KeyCode::Char('c') => {
                let mut next = self.config.clone();
                next.selections.clear();
                if self.apply(next) {
                    self.status = "Cleared all filters.".to_string();
                }
            }
            KeyCode::Enter => {
                self.mode = InputMode::DateRange;
                self.input = self
                    .view
                    .as_ref()
                    .map(|v| v.range)
                    .or(self.config.date_range)
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                self.status = "Date range (YYYY-MM-DD..YYYY-MM-DD, empty = all). Enter to apply, Esc to cancel."
                    .to_string();
            }
            KeyCode::Char('o') => {
                self.mode = InputMode::OpenFile;
                self.input = self.path.display().to_string();
                self.status = "Open CSV export. Enter to load, Esc to cancel.".to_string();
            }
            _ => match self.focus {
                Focus::Filters => self.handle_filter_key(code),
                Focus::Table => self.handle_table_key(code),
            },
        }
        false
    }

    fn handle_filter_key(&mut self, code: KeyCode) {
        let field = self.field();
        let cursor = self.cursors[self.field_idx];
        let options = self.options(field).to_vec();

        match code {
            KeyCode::Left => {
                self.field_idx = self.field_idx.checked_sub(1).unwrap_or(IdentifierField::FILTERABLE.len() - 1);
            }
            KeyCode::Right => {
                self.field_idx = (self.field_idx + 1) % IdentifierField::FILTERABLE.len();
            }
            KeyCode::Up => {
                self.cursors[self.field_idx] = cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if cursor + 1 < options.len() {
                    self.cursors[self.field_idx] = cursor + 1;
                }
            }
            KeyCode::Char(' ') => {
                let Some(value) = options.get(cursor) else {
                    return;
                };
                let mut next = self.config.clone();
                next.selections.toggle(field, value);
                self.apply(next);
            }
            KeyCode::Char('a') => {
                let mut next = self.config.clone();
                next.selections.select_all(field, options);
                self.apply(next);
            }
            KeyCode::Char('n') => {
                let mut next = self.config.clone();
                next.selections.deselect_all(field);
                self.apply(next);
            }
            _ => {}
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) {
        let len = self.view.as_ref().map(|v| v.filtered.len()).unwrap_or(0);
        let last = len.saturating_sub(1);
        self.table_offset = match code {
            KeyCode::Up => self.table_offset.saturating_sub(1),
            KeyCode::Down => (self.table_offset + 1).min(last),
            KeyCode::PageUp => self.table_offset.saturating_sub(10),
            KeyCode::PageDown => (self.table_offset + 10).min(last),
            KeyCode::Home => 0,
            KeyCode::End => last,
            _ => self.table_offset,
        };
    }

    fn handle_input(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let mode = self.mode;
                self.mode = InputMode::Normal;
                let input = std::mem::take(&mut self.input);
                match mode {
                    InputMode::DateRange => self.apply_range_input(input.trim()),
                    InputMode::OpenFile => self.open_file(Path::new(input.trim())),
                    InputMode::Normal => {}
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                let accepted = match self.mode {
                    InputMode::DateRange => c.is_ascii_digit() || c == '-' || c == '.',
                    _ => !c.is_control(),
                };
                if accepted {
                    self.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn apply_range_input(&mut self, input: &str) {
        let range = if input.is_empty() {
            None
        } else {
            match input.parse::<DateRange>() {
                Ok(range) => Some(range),
                Err(msg) => {
                    self.status = msg;
                    return;
                }
            }
        };
        let mut next = self.config.clone();
        next.date_range = range;
        if self.apply(next) {
            self.status = match range {
                Some(r) => format!("range: {r}"),
                None => "range: all dates".to_string(),
            };
        }
    }

    /// Switch to another file. Selections and range start over; bucket and
    /// group-by carry across.
    fn open_file(&mut self, path: &Path) {
        let loaded = crate::cli::picker::validate_csv_path(path)
            .map_err(|e| e.to_string())
            .and_then(|p| self.cache.get_or_load(&p).map_err(|e| e.to_string()));
        let ingested = match loaded {
            Ok(ingested) => ingested,
            Err(msg) => {
                self.status = msg;
                return;
            }
        };

        if ingested.table.is_empty() {
            self.status = format!("No records in {}", path.display());
            return;
        }

        // A non-empty table with no filters always yields a view.
        self.ingested = ingested;
        let config = DashboardConfig {
            bucket: self.config.bucket,
            group_by: self.config.group_by,
            ..DashboardConfig::default()
        };
        self.apply(config);
        info!(path = %path.display(), cached = self.cache.len(), "switched input file");
        self.path = path.to_path_buf();
        self.status = format!("Loaded {} records from {}", self.ingested.table.len(), path.display());
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sales", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | {}", self.path.display())),
        ]));

        let detail = match &self.view {
            Some(view) => format!(
                "range: {} (data {}..{}) | bucket: {} | group by: {} | records: {} | items: {}",
                view.range,
                view.bounds.0,
                view.bounds.1,
                self.config.bucket.label(),
                self.config.group_by,
                view.filtered.len(),
                view.filtered.item_count(),
            ),
            None => format!(
                "range: {} | bucket: {} | group by: {} | no matching data",
                self.config
                    .date_range
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "all".to_string()),
                self.config.bucket.label(),
                self.config.group_by,
            ),
        };
        lines.push(Line::from(Span::styled(detail, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);
        self.draw_filters(frame, cols[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Percentage(30),
            ])
            .split(cols[1]);
        self.draw_chart(frame, rows[0], MeasurementFamily::Sales);
        self.draw_chart(frame, rows[1], MeasurementFamily::Restocks);
        self.draw_table(frame, rows[2]);
    }

    fn draw_filters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let n = IdentifierField::FILTERABLE.len() as u32;
        let rects = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Ratio(1, n); n as usize])
            .split(area);

        for (idx, field) in IdentifierField::FILTERABLE.iter().copied().enumerate() {
            let focused = self.focus == Focus::Filters && idx == self.field_idx;
            let items: Vec<ListItem> = self
                .options(field)
                .iter()
                .map(|value| {
                    let selected = self.config.selections.is_selected(field, value);
                    let mark = if selected { "[x]" } else { "[ ]" };
                    let style = if selected {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default()
                    };
                    ListItem::new(format!("{mark} {}", truncate(value, 22))).style(style)
                })
                .collect();

            let count = self.config.selections.get(field).map(|s| s.len()).unwrap_or(0);
            let title = if count > 0 {
                format!("{} ({count})", field.display_name())
            } else {
                field.display_name().to_string()
            };
            let border = if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let list = List::new(items)
                .block(Block::default().title(title).borders(Borders::ALL).border_style(border))
                .highlight_style(Style::default().fg(Color::Black).bg(Color::White));

            let mut state = ListState::default();
            if focused {
                state.select(Some(self.cursors[idx]));
            }
            frame.render_stateful_widget(list, rects[idx], &mut state);
        }
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, metric: MeasurementFamily) {
        let Some(view) = &self.view else {
            let block = Block::default().title(metric.name()).borders(Borders::ALL);
            let msg = Paragraph::new("No matching data.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let data = chart_data(view, metric);
        let mut title = vec![Span::raw(format!("{} ", metric.name()))];
        for (idx, group) in data.groups.iter().enumerate() {
            title.push(Span::styled(
                format!("■ {} ", truncate(group, 16)),
                Style::default().fg(series_color(idx)),
            ));
        }

        let block = Block::default().title(Line::from(title)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let lines: Vec<ChartLine<'_>> = data.lines.iter().map(|points| ChartLine { points }).collect();
        let (chart_rect, insets) = chart_layout(inner);
        let widget = SeriesChart {
            lines: &lines,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, data.origin, data.x_bounds, data.y_bounds);
        }
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let border = if self.focus == Focus::Table {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let Some(view) = &self.view else {
            frame.render_widget(
                Block::default().title("Records").borders(Borders::ALL).border_style(border),
                area,
            );
            return;
        };

        let visible = area.height.saturating_sub(3) as usize;
        let records = view.filtered.records();
        let rows: Vec<Row> = records
            .iter()
            .skip(self.table_offset)
            .take(visible)
            .map(|r| {
                let id = &r.identity;
                Row::new(vec![
                    id.title.clone(),
                    id.variation.clone(),
                    id.id.clone(),
                    id.kind.clone(),
                    id.country.clone(),
                    id.channel.clone(),
                    r.date.to_string(),
                    fmt_num(r.sales),
                    fmt_num(r.restocks),
                ])
            })
            .collect();

        let header = Row::new(vec![
            "title", "variation", "id", "type", "country", "channel", "date", "sales", "restocks",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(9),
        ];
        let title = format!(
            "Records {}-{} of {}",
            (self.table_offset + 1).min(records.len()),
            (self.table_offset + rows.len()).min(records.len()),
            records.len()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().title(title).borders(Borders::ALL).border_style(border));
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = match self.mode {
            InputMode::Normal => {
                let help = "←/→ field  ↑/↓ move  space toggle  a all  n none  c clear  Enter range  b bucket  g group  o open  Tab table  q quit";
                Line::from(vec![
                    Span::styled(help, Style::default().fg(Color::Gray)),
                    Span::raw(" | "),
                    Span::styled(&self.status, Style::default().fg(Color::Yellow)),
                ])
            }
            InputMode::DateRange | InputMode::OpenFile => Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::styled(&self.input, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(&self.status, Style::default().fg(Color::Gray)),
            ]),
        };
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart-ready series for one metric: x is days since the first bucket start.
struct ChartData {
    origin: NaiveDate,
    groups: Vec<String>,
    lines: Vec<Vec<(f64, f64)>>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_data(view: &DashboardView, metric: MeasurementFamily) -> ChartData {
    let origin = view.buckets.origin.unwrap_or(view.range.start);
    let series = view.buckets.series(metric);

    let mut groups = Vec::with_capacity(series.len());
    let mut lines = Vec::with_capacity(series.len());
    for s in series {
        let points = s
            .points
            .iter()
            .map(|(d, v)| ((*d - origin).num_days() as f64, *v))
            .collect();
        groups.push(s.group);
        lines.push(points);
    }

    let last = view
        .buckets
        .start_bounds()
        .map(|(_, last)| (last - origin).num_days() as f64)
        .unwrap_or(0.0);
    let x_bounds = if last > 0.0 { [0.0, last] } else { [-0.5, 0.5] };

    let (mut y_min, mut y_max) = view.buckets.value_bounds(metric).unwrap_or((0.0, 1.0));
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartData {
        origin,
        groups,
        lines,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 0,
        bottom: 1,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 4 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Date labels under the x axis and value labels left of the y axis.
fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    origin: NaiveDate,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let style = Style::default().fg(Color::Gray);

    // Dates are 10 columns wide; fit as many as the width allows.
    let x_ticks = ((chart.width / 14) as usize).clamp(2, 5);
    let y = chart.y + chart.height;
    if y < inner.y + inner.height {
        for i in 0..x_ticks {
            let u = i as f64 / (x_ticks as f64 - 1.0);
            let days = (x_bounds[0] + u * (x_bounds[1] - x_bounds[0])).round().max(0.0) as u64;
            let label = origin
                .checked_add_days(Days::new(days))
                .map(|d| d.to_string())
                .unwrap_or_default();
            let label_len = label.len() as u16;
            let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
            let start = x
                .saturating_sub(label_len / 2)
                .clamp(inner.x, (inner.x + inner.width).saturating_sub(label_len));
            frame.render_widget(
                Paragraph::new(label).style(style),
                Rect {
                    x: start,
                    y,
                    width: label_len.min(inner.width),
                    height: 1,
                },
            );
        }
    }

    let y_ticks = if chart.height >= 8 { 4 } else { 2 };
    for i in 0..y_ticks {
        let u = i as f64 / (y_ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = compact_num(y_val);
        let width = insets.left.saturating_sub(1);
        frame.render_widget(
            Paragraph::new(label).style(style).alignment(Alignment::Right),
            Rect {
                x: inner.x,
                y,
                width,
                height: 1,
            },
        );
    }
}

/// Short axis label: `1.2k`, `3.4M`, or the plain number.
fn compact_num(v: f64) -> String {
    let a = v.abs();
    if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e4 {
        format!("{:.1}k", v / 1e3)
    } else if a >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BucketWidth;
    use crate::io::ingest::load_from_reader;

    const CSV: &str = "\
title,variation,id,type,country,channel,2024-01-01_sales,2024-01-08_sales,2024-01-01_restocks,2024-01-08_restocks
Mug,red,1,kitchen,US,web,3,4,-10,0
Mug,blue,2,kitchen,DE,web,1,0,0,-5
Shirt,S,3,apparel,US,retail,7,2,-20,-1
";

    fn app() -> App {
        let ingested = load_from_reader(CSV.as_bytes(), Path::new("test.csv")).unwrap();
        App::new(
            PathBuf::from("test.csv"),
            Arc::new(ingested),
            LoadCache::new(),
            DashboardConfig::default(),
        )
    }

    fn focus_field(app: &mut App, field: IdentifierField) {
        app.field_idx = IdentifierField::FILTERABLE.iter().position(|f| *f == field).unwrap();
    }

    #[test]
    fn starts_with_the_whole_table() {
        let app = app();
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.filtered.len(), 6);
        assert_eq!(view.options(IdentifierField::Title), ["Mug", "Shirt"]);
    }

    #[test]
    fn space_toggles_and_narrows_other_fields() {
        let mut app = app();
        focus_field(&mut app, IdentifierField::Country);
        // Countries are sorted: DE, US.
        app.handle_key(KeyCode::Char(' '));
        assert!(app.config.selections.is_selected(IdentifierField::Country, "DE"));
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.filtered.len(), 2);
        assert_eq!(view.options(IdentifierField::Title), ["Mug"]);

        app.handle_key(KeyCode::Char(' '));
        assert!(app.config.selections.is_empty());
    }

    #[test]
    fn select_all_none_and_clear() {
        let mut app = app();
        focus_field(&mut app, IdentifierField::Title);
        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.config.selections.get(IdentifierField::Title).map(|s| s.len()), Some(2));
        app.handle_key(KeyCode::Char('n'));
        assert!(app.config.selections.get(IdentifierField::Title).is_none());

        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Char('c'));
        assert!(app.config.selections.is_empty());
    }

    #[test]
    fn invalid_range_keeps_previous_view() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.mode, InputMode::DateRange);
        assert_eq!(app.input, "2024-01-01..2024-01-08");

        app.input = "2024-01-08..2024-01-01".to_string();
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.mode, InputMode::Normal);
        assert!(app.status.starts_with("Invalid date range"));
        assert_eq!(app.config.date_range, None);
        assert_eq!(app.view.as_ref().unwrap().filtered.len(), 6);
    }

    #[test]
    fn range_without_records_shows_no_data_and_keeps_the_range() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        app.input = "2024-01-02..2024-01-07".to_string();
        app.handle_key(KeyCode::Enter);

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        );
        assert!(app.view.is_none());
        assert_eq!(app.config.date_range, Some(range));
        assert_eq!(app.status, "No matching data. Adjust the filters or the date range.");
        assert_eq!(app.options(IdentifierField::Title), ["Mug", "Shirt"]);

        // Filters stay usable while nothing matches.
        focus_field(&mut app, IdentifierField::Title);
        app.handle_key(KeyCode::Char(' '));
        assert!(app.config.selections.is_selected(IdentifierField::Title, "Mug"));
        assert!(app.view.is_none());

        // Re-opening the editor starts from the kept range.
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.input, "2024-01-02..2024-01-07");
        app.input.clear();
        app.handle_key(KeyCode::Enter);
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.filtered.distinct(IdentifierField::Title), ["Mug"]);
        assert_eq!(app.config.date_range, None);
    }

    #[test]
    fn valid_range_clamps_records() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        app.input = "2024-01-08..2024-01-08".to_string();
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view.as_ref().unwrap().filtered.len(), 3);
        assert_eq!(app.status, "range: 2024-01-08..2024-01-08");
    }

    #[test]
    fn bucket_and_group_cycle() {
        let mut app = app();
        app.handle_key(KeyCode::Char('b'));
        assert_eq!(app.config.bucket, BucketWidth::Days15);
        app.handle_key(KeyCode::Char('g'));
        assert_eq!(app.config.group_by, IdentifierField::Variation);
        assert_eq!(app.view.as_ref().unwrap().buckets.group_by, IdentifierField::Variation);
    }

    #[test]
    fn missing_file_leaves_current_table() {
        let mut app = app();
        app.open_file(Path::new("does/not/exist.csv"));
        assert!(app.status.contains("not found"));
        assert_eq!(app.path, PathBuf::from("test.csv"));
        assert_eq!(app.ingested.table.len(), 6);
    }

    #[test]
    fn table_scroll_is_bounded() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::End);
        assert_eq!(app.table_offset, 5);
        app.handle_key(KeyCode::PageDown);
        assert_eq!(app.table_offset, 5);
        app.handle_key(KeyCode::Home);
        assert_eq!(app.table_offset, 0);
    }

    #[test]
    fn chart_x_axis_is_days_since_first_bucket() {
        let app = app();
        let data = chart_data(app.view.as_ref().unwrap(), MeasurementFamily::Restocks);
        assert_eq!(data.groups, ["Mug", "Shirt"]);
        assert_eq!(data.lines[0], vec![(0.0, 10.0), (7.0, 5.0)]);
        assert_eq!(data.x_bounds, [0.0, 7.0]);
    }

    #[test]
    fn compact_labels() {
        assert_eq!(compact_num(12_500.0), "12.5k");
        assert_eq!(compact_num(250.0), "250");
        assert_eq!(compact_num(2.5), "2.5");
    }
}
