//! Chart rendering: quality histogram, correlation bars, heatmap grid, and
//! the attribute scatter with its mean-per-quality overlay.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use crate::chart_data::{CorrelationBars, QualityHistogram, ScatterData};
use crate::config::Theme;
use crate::insights::{Coefficient, CorrelationMatrix};

const BAR_LABEL_WIDTH: u16 = 18;
const HEATMAP_LABEL_WIDTH: u16 = 14;
const HEATMAP_CELL_WIDTH: u16 = 6;

const SERIES_COLORS: [&str; 4] = ["series_1", "series_2", "series_3", "series_4"];

/// Renders the standard informational message for an empty filtered view.
pub fn render_no_data(area: Rect, buf: &mut Buffer, theme: &Theme) {
    Paragraph::new("No rows match your filters.")
        .style(Style::default().fg(theme.get("text_secondary")))
        .centered()
        .render(area, buf);
}

fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn bounds_of(series: &[&[(f64, f64)]]) -> ([f64; 2], [f64; 2]) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for points in series {
        for &(x, y) in *points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    // Degenerate ranges get a half-unit pad so the axis is drawable.
    if x_max <= x_min {
        x_min -= 0.5;
        x_max += 0.5;
    }
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    ([x_min, x_max], [y_min, y_max])
}

fn axis_labels(bounds: [f64; 2], style: Style) -> Vec<Span<'static>> {
    vec![
        Span::styled(format_axis_label(bounds[0]), style),
        Span::styled(format_axis_label((bounds[0] + bounds[1]) / 2.0), style),
        Span::styled(format_axis_label(bounds[1]), style),
    ]
}

/// Quality distribution as a bar chart, one colored dataset per series.
pub fn render_histogram(
    area: Rect,
    buf: &mut Buffer,
    histogram: Option<&QualityHistogram>,
    theme: &Theme,
) {
    let histogram = match histogram {
        Some(h) if h.series.iter().any(|s| !s.points.is_empty()) => h,
        _ => {
            render_no_data(area, buf, theme);
            return;
        }
    };

    let all_points: Vec<&[(f64, f64)]> = histogram
        .series
        .iter()
        .map(|s| s.points.as_slice())
        .collect();
    let (x_bounds, y_bounds) = bounds_of(&all_points);
    // Counts start at zero; pad x so the outermost bars are not clipped.
    let x_bounds = [x_bounds[0] - 0.5, x_bounds[1] + 0.5];
    let y_bounds = [0.0, y_bounds[1]];

    let datasets: Vec<Dataset> = histogram
        .series
        .iter()
        .enumerate()
        .map(|(i, series)| {
            let color_key = SERIES_COLORS.get(i).copied().unwrap_or("series_1");
            Dataset::default()
                .name(series.name.as_str())
                .marker(symbols::Marker::HalfBlock)
                .graph_type(GraphType::Bar)
                .style(Style::default().fg(theme.get(color_key)))
                .data(&series.points)
        })
        .collect();

    let axis_label_style = Style::default().fg(theme.get("text_primary"));
    let mut chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("quality")
                .bounds(x_bounds)
                .style(axis_label_style)
                .labels(axis_labels(x_bounds, axis_label_style)),
        )
        .y_axis(
            Axis::default()
                .title("count")
                .bounds(y_bounds)
                .style(axis_label_style)
                .labels(axis_labels(y_bounds, axis_label_style)),
        );
    chart = if histogram.series.len() > 1 {
        chart.legend_position(Some(ratatui::widgets::LegendPosition::TopRight))
    } else {
        chart.legend_position(None)
    };
    chart.render(area, buf);
}

/// Horizontal correlation bars: attribute name, signed bar, coefficient.
pub fn render_correlation_bars(
    area: Rect,
    buf: &mut Buffer,
    bars: Option<&CorrelationBars>,
    theme: &Theme,
) {
    let bars = match bars {
        Some(b) if !b.bars.is_empty() => b,
        _ => {
            render_no_data(area, buf, theme);
            return;
        }
    };

    let positive = theme.get("heatmap_positive");
    let negative = theme.get("heatmap_negative");
    let text_primary = theme.get("text_primary");

    let bar_width = area
        .width
        .saturating_sub(BAR_LABEL_WIDTH + 8)
        .max(1) as f64;

    let mut lines = Vec::with_capacity(bars.bars.len());
    for (name, value) in &bars.bars {
        let filled = ((value.abs().min(1.0)) * bar_width).round() as usize;
        let bar: String = "█".repeat(filled);
        let color = if *value >= 0.0 { positive } else { negative };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:>width$} ", truncate(name, BAR_LABEL_WIDTH as usize - 1), width = BAR_LABEL_WIDTH as usize - 1),
                Style::default().fg(text_primary),
            ),
            Span::styled(format!("{:+.2} ", value), Style::default().fg(color)),
            Span::styled(bar, Style::default().fg(color)),
        ]));
    }

    Paragraph::new(lines).render(area, buf);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// Correlation matrix as a colored cell grid. Undefined cells show "n/a".
pub fn render_heatmap(
    area: Rect,
    buf: &mut Buffer,
    matrix: Option<&CorrelationMatrix>,
    theme: &Theme,
) {
    let matrix = match matrix {
        Some(m) => m,
        None => {
            render_no_data(area, buf, theme);
            return;
        }
    };

    let positive = theme.get("heatmap_positive");
    let negative = theme.get("heatmap_negative");
    let dimmed = theme.get("dimmed");
    let text_primary = theme.get("text_primary");

    let mut lines = Vec::with_capacity(matrix.columns.len() + 1);

    // Header row of abbreviated column names.
    let mut header = vec![Span::styled(
        " ".repeat(HEATMAP_LABEL_WIDTH as usize),
        Style::default(),
    )];
    for name in &matrix.columns {
        header.push(Span::styled(
            format!(
                "{:>width$}",
                truncate(name, HEATMAP_CELL_WIDTH as usize - 1),
                width = HEATMAP_CELL_WIDTH as usize
            ),
            Style::default().fg(text_primary).bold(),
        ));
    }
    lines.push(Line::from(header));

    for (i, name) in matrix.columns.iter().enumerate() {
        let mut spans = vec![Span::styled(
            format!(
                "{:>width$}",
                truncate(name, HEATMAP_LABEL_WIDTH as usize - 1),
                width = HEATMAP_LABEL_WIDTH as usize
            ),
            Style::default().fg(text_primary),
        )];
        for cell in &matrix.cells[i] {
            let span = match cell {
                Coefficient::Defined(v) => {
                    let color = if *v >= 0.0 { positive } else { negative };
                    let style = if v.abs() >= 0.5 {
                        Style::default().fg(color).bold()
                    } else {
                        Style::default().fg(color)
                    };
                    Span::styled(
                        format!("{:>width$.2}", v, width = HEATMAP_CELL_WIDTH as usize),
                        style,
                    )
                }
                Coefficient::Undefined => Span::styled(
                    format!("{:>width$}", "n/a", width = HEATMAP_CELL_WIDTH as usize),
                    Style::default().fg(dimmed),
                ),
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    Paragraph::new(lines).render(area, buf);
}

/// Scatter of the chosen attribute against quality with the mean line overlay.
/// `None` attribute renders a selection prompt instead of a chart.
pub fn render_scatter(
    area: Rect,
    buf: &mut Buffer,
    scatter: Option<&ScatterData>,
    attribute_selected: bool,
    theme: &Theme,
) {
    if !attribute_selected {
        Paragraph::new("Select at least one attribute to plot — press 'a' to cycle")
            .style(Style::default().fg(theme.get("text_secondary")))
            .centered()
            .render(area, buf);
        return;
    }

    let scatter = match scatter {
        Some(s) if !s.points.is_empty() => s,
        _ => {
            render_no_data(area, buf, theme);
            return;
        }
    };

    let (x_bounds, y_bounds) = bounds_of(&[&scatter.points, &scatter.mean_line]);

    let mean_name = format!("mean {}", scatter.attribute);
    let datasets = vec![
        Dataset::default()
            .name(scatter.attribute.as_str())
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(theme.get("series_1")))
            .data(&scatter.points),
        Dataset::default()
            .name(mean_name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.get("mean_line")))
            .data(&scatter.mean_line),
    ];

    let axis_label_style = Style::default().fg(theme.get("text_primary"));
    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("quality")
                .bounds(x_bounds)
                .style(axis_label_style)
                .labels(axis_labels(x_bounds, axis_label_style)),
        )
        .y_axis(
            Axis::default()
                .title(scatter.attribute.clone())
                .bounds(y_bounds)
                .style(axis_label_style)
                .labels(axis_labels(y_bounds, axis_label_style)),
        )
        .legend_position(Some(ratatui::widgets::LegendPosition::TopRight))
        .render(area, buf);
}

/// Two stacked correlation charts: bars above, heatmap below. With a
/// per-category comparison available, the bar half splits into one column
/// per wine type.
pub fn render_correlation_panel(
    area: Rect,
    buf: &mut Buffer,
    bars: Option<&CorrelationBars>,
    comparison: Option<&[(String, CorrelationBars)]>,
    matrix: Option<&CorrelationMatrix>,
    theme: &Theme,
) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    match comparison {
        Some(groups) if !groups.is_empty() => {
            let constraints: Vec<Constraint> = groups
                .iter()
                .map(|_| Constraint::Ratio(1, groups.len() as u32))
                .collect();
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(constraints)
                .split(halves[0]);
            for (i, (name, group_bars)) in groups.iter().enumerate() {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.get("modal_border")))
                    .title(format!(" Correlation: {} ", name));
                let inner = block.inner(columns[i]);
                block.render(columns[i], buf);
                render_correlation_bars(inner, buf, Some(group_bars), theme);
            }
        }
        _ => {
            let bars_block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.get("modal_border")))
                .title(" Correlation with quality ");
            let bars_inner = bars_block.inner(halves[0]);
            bars_block.render(halves[0], buf);
            render_correlation_bars(bars_inner, buf, bars, theme);
        }
    }

    let heat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.get("modal_border")))
        .title(" Correlation heatmap ");
    let heat_inner = heat_block.inner(halves[1]);
    heat_block.render(halves[1], buf);
    render_heatmap(heat_inner, buf, matrix, theme);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;

    fn theme() -> Theme {
        Theme::from_config(&ThemeConfig::default()).unwrap()
    }

    fn buffer_text(buf: &Buffer, area: Rect) -> String {
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push(buf[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn empty_histogram_renders_no_data_message() {
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        render_histogram(area, &mut buf, None, &theme());
        assert!(buffer_text(&buf, area).contains("No rows match your filters."));
    }

    #[test]
    fn scatter_without_attribute_prompts() {
        let area = Rect::new(0, 0, 70, 10);
        let mut buf = Buffer::empty(area);
        render_scatter(area, &mut buf, None, false, &theme());
        assert!(buffer_text(&buf, area).contains("Select at least one attribute"));
    }

    #[test]
    fn correlation_bars_show_names_and_values() {
        let area = Rect::new(0, 0, 60, 5);
        let mut buf = Buffer::empty(area);
        let bars = CorrelationBars {
            bars: vec![("volatile_acidity".to_string(), -0.39), ("alcohol".to_string(), 0.48)],
        };
        render_correlation_bars(area, &mut buf, Some(&bars), &theme());
        let text = buffer_text(&buf, area);
        assert!(text.contains("alcohol"));
        assert!(text.contains("+0.48"));
        assert!(text.contains("-0.39"));
    }

    #[test]
    fn heatmap_marks_undefined_cells() {
        let area = Rect::new(0, 0, 60, 6);
        let mut buf = Buffer::empty(area);
        let matrix = CorrelationMatrix {
            columns: vec!["alcohol".to_string(), "flat".to_string()],
            cells: vec![
                vec![Coefficient::Defined(1.0), Coefficient::Undefined],
                vec![Coefficient::Undefined, Coefficient::Undefined],
            ],
        };
        render_heatmap(area, &mut buf, Some(&matrix), &theme());
        let text = buffer_text(&buf, area);
        assert!(text.contains("1.00"));
        assert!(text.contains("n/a"));
    }

    #[test]
    fn bounds_pad_degenerate_ranges() {
        let points = vec![(5.0, 2.0)];
        let (x, y) = bounds_of(&[&points]);
        assert!(x[0] < x[1]);
        assert!(y[0] < y[1]);
    }
}
