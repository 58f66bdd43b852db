//! Terminal dashboard for exploring wine quality data: a cached CSV load,
//! category and quality-range filters, correlation insights, and four chart
//! views composed into a single page.

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use polars::prelude::DataFrame;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Widget, Wrap},
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

pub mod chart_data;
pub mod config;
pub mod export;
pub mod filter;
pub mod insights;
pub mod loader;
pub mod widgets;

pub use config::{AppConfig, ConfigManager, Theme};

use crate::filter::{FilterDomain, Selection, QUALITY_STEP};
use crate::insights::{CorrelationMatrix, Insights};
use crate::loader::TableCache;
use crate::widgets::charts;
use crate::widgets::controls::Controls;
use crate::widgets::datatable::DataTable;
use crate::widgets::filters::{FilterSidebar, SIDEBAR_WIDTH};
use crate::widgets::insights::{InsightTiles, INSIGHTS_HEIGHT};

pub const APP_NAME: &str = "vintui";

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf),
    Exit,
    Crash(String),
    Resize(u16, u16),
}

#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Distribution,
    Correlation,
    Scatter,
    Rows,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Distribution, Tab::Correlation, Tab::Scatter, Tab::Rows];

    fn title(&self) -> &'static str {
        match self {
            Tab::Distribution => "Distribution",
            Tab::Correlation => "Correlation",
            Tab::Scatter => "Scatter",
            Tab::Rows => "Rows",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn next(&self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

/// How the page is composed: one chart at a time behind tabs, or every chart
/// at once in two columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Tabs,
    SideBySide,
}

impl LayoutMode {
    fn toggle(&self) -> LayoutMode {
        match self {
            LayoutMode::Tabs => LayoutMode::SideBySide,
            LayoutMode::SideBySide => LayoutMode::Tabs,
        }
    }
}

#[derive(Default)]
struct DebugState {
    enabled: bool,
    num_events: usize,
    num_frames: usize,
}

/// Everything derived from the base table and the current selection. Rebuilt
/// as a whole whenever the selection changes; no view is updated in place.
pub struct DerivedViews {
    pub filtered: DataFrame,
    pub insights: Option<Insights>,
    pub histogram: Option<chart_data::QualityHistogram>,
    pub bars: Option<chart_data::CorrelationBars>,
    pub comparison: Option<Vec<(String, chart_data::CorrelationBars)>>,
    pub heatmap: Option<CorrelationMatrix>,
    pub scatter: Option<chart_data::ScatterData>,
}

impl DerivedViews {
    pub fn compute(
        base: &DataFrame,
        selection: &Selection,
        grouped: bool,
        attribute: Option<&str>,
    ) -> Result<DerivedViews> {
        let filtered = filter::apply(base, selection)?;
        let insights = insights::compute_insights(&filtered)?;
        let histogram = chart_data::quality_histogram(&filtered, grouped)?;
        let bars = chart_data::correlation_bars(&filtered)?;
        let comparison = chart_data::correlation_comparison(&filtered)?;
        let heatmap = chart_data::correlation_heatmap(&filtered)?;
        let scatter = match attribute {
            Some(attribute) => chart_data::attribute_scatter(&filtered, attribute)?,
            None => None,
        };
        Ok(DerivedViews {
            filtered,
            insights,
            histogram,
            bars,
            comparison,
            heatmap,
            scatter,
        })
    }
}

/// State that only exists once a table has been loaded.
pub struct DashboardState {
    pub base: DataFrame,
    pub domain: FilterDomain,
    pub selection: Selection,
    pub attributes: Vec<String>,
    pub attribute_index: Option<usize>,
    pub views: DerivedViews,
}

impl DashboardState {
    fn attribute(&self) -> Option<&str> {
        self.attribute_index
            .and_then(|i| self.attributes.get(i))
            .map(String::as_str)
    }
}

pub struct App {
    pub dashboard: Option<DashboardState>,
    path: Option<PathBuf>,
    events: Sender<AppEvent>,
    cache: TableCache,
    grouped: bool,
    layout: LayoutMode,
    tab: Tab,
    error_modal: ErrorModal,
    status: Option<String>,
    debug: DebugState,
    theme: Theme,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        let theme = Theme::from_config(&AppConfig::default().theme).unwrap_or_else(|_| Theme {
            colors: std::collections::HashMap::new(),
        });
        Self::new_with_theme(events, theme)
    }

    pub fn new_with_theme(events: Sender<AppEvent>, theme: Theme) -> App {
        App {
            dashboard: None,
            path: None,
            events,
            cache: TableCache::new(),
            grouped: false,
            layout: LayoutMode::default(),
            tab: Tab::default(),
            error_modal: ErrorModal::new(),
            status: None,
            debug: DebugState::default(),
            theme,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    /// Loads (or re-loads) the table at `path` through the cache and resets
    /// the selection to the full domain.
    fn open(&mut self, path: &Path) -> Result<()> {
        let base = self.cache.load(path)?;
        let domain = FilterDomain::from_table(&base)?;
        let selection = Selection::unfiltered(&domain);
        let attributes = chart_data::scatter_attributes(&base);
        let attribute_index = if attributes.is_empty() { None } else { Some(0) };
        let attribute = attribute_index.and_then(|i| attributes.get(i).cloned());
        let views =
            DerivedViews::compute(&base, &selection, self.grouped, attribute.as_deref())?;

        self.dashboard = Some(DashboardState {
            base,
            domain,
            selection,
            attributes,
            attribute_index,
            views,
        });
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Recomputes every derived view from the current selection. Errors here
    /// are recoverable: the previous views stay on screen behind the modal.
    fn recompute(&mut self) {
        if let Some(dash) = &mut self.dashboard {
            let attribute = dash.attribute().map(str::to_string);
            match DerivedViews::compute(
                &dash.base,
                &dash.selection,
                self.grouped,
                attribute.as_deref(),
            ) {
                Ok(views) => dash.views = views,
                Err(e) => self.error_modal.show(e.to_string()),
            }
        }
    }

    fn export_filtered(&mut self) {
        let Some(dash) = &self.dashboard else {
            return;
        };
        let path = export::default_export_path();
        match export::write_filtered_csv(&dash.views.filtered, &path) {
            Ok(()) => {
                self.status = Some(format!(
                    "Exported {} rows to {}",
                    dash.views.filtered.height(),
                    path.display()
                ));
            }
            Err(e) => self.error_modal.show(e.to_string()),
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        // The error modal eats every key until dismissed.
        if self.error_modal.active {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_modal.hide();
            }
            return None;
        }

        self.status = None;

        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
            KeyCode::Char('c') => {
                if let Some(dash) = &mut self.dashboard {
                    dash.selection.category = dash.domain.next_category(&dash.selection.category);
                }
                self.recompute();
            }
            KeyCode::Char('[') => {
                if let Some(dash) = &mut self.dashboard {
                    dash.selection.step_min(-QUALITY_STEP, &dash.domain);
                }
                self.recompute();
            }
            KeyCode::Char(']') => {
                if let Some(dash) = &mut self.dashboard {
                    dash.selection.step_min(QUALITY_STEP, &dash.domain);
                }
                self.recompute();
            }
            KeyCode::Char('{') => {
                if let Some(dash) = &mut self.dashboard {
                    dash.selection.step_max(-QUALITY_STEP, &dash.domain);
                }
                self.recompute();
            }
            KeyCode::Char('}') => {
                if let Some(dash) = &mut self.dashboard {
                    dash.selection.step_max(QUALITY_STEP, &dash.domain);
                }
                self.recompute();
            }
            KeyCode::Char('g') => {
                self.grouped = !self.grouped;
                self.recompute();
            }
            KeyCode::Char('a') => {
                if let Some(dash) = &mut self.dashboard {
                    if !dash.attributes.is_empty() {
                        dash.attribute_index = Some(match dash.attribute_index {
                            Some(i) => (i + 1) % dash.attributes.len(),
                            None => 0,
                        });
                    }
                }
                self.recompute();
            }
            KeyCode::Char('l') => {
                self.layout = self.layout.toggle();
            }
            KeyCode::Char('e') => {
                self.export_filtered();
            }
            KeyCode::Char('r') => {
                if let Some(path) = &self.path {
                    self.cache.invalidate(path);
                    return Some(AppEvent::Open(path.clone()));
                }
            }
            KeyCode::Tab => {
                self.tab = self.tab.next();
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = (c as usize) - ('1' as usize);
                self.tab = Tab::ALL[idx];
            }
            _ => {}
        }
        None
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path) => match self.open(path) {
                // A table that fails to load at startup is fatal; a reload
                // failure of an already-open table is shown in the modal.
                Ok(()) => None,
                Err(e) if self.dashboard.is_none() => Some(AppEvent::Crash(e.to_string())),
                Err(e) => {
                    self.error_modal.show(e.to_string());
                    None
                }
            },
            AppEvent::Resize(_, _) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn render_charts_tabbed(&self, area: Rect, buf: &mut Buffer, dash: &DashboardState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Fill(1)])
            .split(area);

        let titles: Vec<&str> = Tab::ALL.iter().map(Tab::title).collect();
        Tabs::new(titles)
            .select(self.tab.index())
            .style(Style::default().fg(self.theme.get("text_secondary")))
            .highlight_style(Style::default().fg(self.theme.get("primary")).bold())
            .render(rows[0], buf);

        let content = rows[1];
        match self.tab {
            Tab::Distribution => {
                let block = chart_block(" Quality distribution ", &self.theme);
                let inner = block.inner(content);
                block.render(content, buf);
                charts::render_histogram(inner, buf, dash.views.histogram.as_ref(), &self.theme);
            }
            Tab::Correlation => {
                charts::render_correlation_panel(
                    content,
                    buf,
                    dash.views.bars.as_ref(),
                    dash.views.comparison.as_deref(),
                    dash.views.heatmap.as_ref(),
                    &self.theme,
                );
            }
            Tab::Scatter => {
                let block = chart_block(" Attribute vs quality ", &self.theme);
                let inner = block.inner(content);
                block.render(content, buf);
                charts::render_scatter(
                    inner,
                    buf,
                    dash.views.scatter.as_ref(),
                    dash.attribute().is_some(),
                    &self.theme,
                );
            }
            Tab::Rows => {
                let table = DataTable {
                    df: &dash.views.filtered,
                    theme: &self.theme,
                };
                (&table).render(content, buf);
            }
        }
    }

    /// Two-column composition: correlation charts on the left, the filtered
    /// rows on the right.
    fn render_charts_side_by_side(&self, area: Rect, buf: &mut Buffer, dash: &DashboardState) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        charts::render_correlation_panel(
            columns[0],
            buf,
            dash.views.bars.as_ref(),
            dash.views.comparison.as_deref(),
            dash.views.heatmap.as_ref(),
            &self.theme,
        );

        let table = DataTable {
            df: &dash.views.filtered,
            theme: &self.theme,
        };
        (&table).render(columns[1], buf);
    }

    fn render_error_modal(&self, area: Rect, buf: &mut Buffer) {
        let modal_area = centered_rect(area, 60, 20);
        Clear.render(modal_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("modal_border_error")))
            .title(" Error ")
            .title_bottom(" Esc to dismiss ");
        let inner = block.inner(modal_area);
        block.render(modal_area, buf);
        Paragraph::new(self.error_modal.message.as_str())
            .style(Style::default().fg(self.theme.get("text_primary")))
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

fn chart_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.get("modal_border")))
        .title(title)
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100 - height_percent) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        Block::default()
            .style(Style::default().bg(self.theme.get("background")))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1)];
        if self.status.is_some() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1)); // Controls
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let main_area = layout[0];
        match &self.dashboard {
            Some(dash) => {
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
                    .split(main_area);

                let sidebar = FilterSidebar {
                    domain: &dash.domain,
                    selection: &dash.selection,
                    grouped_histogram: self.grouped,
                    scatter_attribute: dash.attribute(),
                    theme: &self.theme,
                };
                (&sidebar).render(columns[0], buf);

                let right = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(INSIGHTS_HEIGHT), Constraint::Fill(1)])
                    .split(columns[1]);

                let tiles = InsightTiles {
                    insights: dash.views.insights.as_ref(),
                    theme: &self.theme,
                };
                (&tiles).render(right[0], buf);

                match self.layout {
                    LayoutMode::Tabs => self.render_charts_tabbed(right[1], buf, dash),
                    LayoutMode::SideBySide => {
                        self.render_charts_side_by_side(right[1], buf, dash)
                    }
                }
            }
            None => {
                Paragraph::new("Loading…")
                    .style(Style::default().fg(self.theme.get("text_secondary")))
                    .centered()
                    .render(main_area, buf);
            }
        }

        let mut idx = 1;
        if let Some(status) = &self.status {
            Paragraph::new(status.as_str())
                .style(Style::default().fg(self.theme.get("success")))
                .render(layout[idx], buf);
            idx += 1;
        }

        let mut controls = Controls::new().with_dimmed(self.error_modal.active);
        if let Some(dash) = &self.dashboard {
            controls.row_count = Some(dash.views.filtered.height());
        }
        (&controls).render(layout[idx], buf);
        idx += 1;

        if self.debug.enabled {
            Paragraph::new(format!(
                "events: {} frames: {}",
                self.debug.num_events, self.debug.num_frames
            ))
            .style(Style::default().fg(self.theme.get("dimmed")))
            .render(layout[idx], buf);
        }

        if self.error_modal.active {
            self.render_error_modal(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};
    use std::io::Write;
    use std::path::Path;
    use std::sync::mpsc::channel;

    const CSV: &str = "wine_type,alcohol,sulphates,quality\n\
                       red,9.4,0.56,5\n\
                       red,10.2,0.68,6\n\
                       red,11.0,0.65,7\n\
                       white,9.8,0.44,5\n\
                       white,10.5,0.49,6\n\
                       white,12.1,0.38,8\n";

    fn write_csv(dir: &Path) -> PathBuf {
        let path = dir.join("wine.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(CSV.as_bytes()).unwrap();
        path
    }

    fn key(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn open_app(path: &Path) -> App {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        assert!(app.event(&AppEvent::Open(path.to_path_buf())).is_none());
        app
    }

    #[test]
    fn open_builds_full_domain_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        let dash = app.dashboard.as_mut().unwrap();
        assert_eq!(dash.views.filtered.height(), 6);
        assert_eq!(dash.domain.categories, vec!["red", "white"]);
        assert_eq!(dash.selection.quality_min, 5.0);
        assert_eq!(dash.selection.quality_max, 8.0);
        assert_eq!(dash.attribute(), Some("alcohol"));
    }

    #[test]
    fn open_missing_file_crashes() {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        let out = app.event(&AppEvent::Open(PathBuf::from("/nonexistent/wine.csv")));
        assert!(matches!(out, Some(AppEvent::Crash(_))));
    }

    #[test]
    fn category_key_filters_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        app.event(&key('c'));
        let dash = app.dashboard.as_ref().unwrap();
        assert_eq!(dash.selection.category.label(), "red");
        assert_eq!(dash.views.filtered.height(), 3);
    }

    #[test]
    fn quality_keys_narrow_the_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        app.event(&key(']'));
        app.event(&key(']'));
        let dash = app.dashboard.as_ref().unwrap();
        assert_eq!(dash.selection.quality_min, 6.0);
        // Quality 5 rows dropped out.
        assert_eq!(dash.views.filtered.height(), 4);
    }

    #[test]
    fn group_toggle_splits_histogram() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        assert_eq!(
            app.dashboard.as_ref().unwrap().views.histogram.as_ref().unwrap().series.len(),
            1
        );
        app.event(&key('g'));
        assert_eq!(
            app.dashboard.as_ref().unwrap().views.histogram.as_ref().unwrap().series.len(),
            2
        );
    }

    #[test]
    fn attribute_key_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        app.event(&key('a'));
        assert_eq!(app.dashboard.as_ref().unwrap().attribute(), Some("sulphates"));
        app.event(&key('a'));
        assert_eq!(app.dashboard.as_ref().unwrap().attribute(), Some("alcohol"));
    }

    #[test]
    fn quit_key_exits() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        assert!(matches!(app.event(&key('q')), Some(AppEvent::Exit)));
    }

    #[test]
    fn layout_and_tab_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        assert_eq!(app.layout, LayoutMode::Tabs);
        app.event(&key('l'));
        assert_eq!(app.layout, LayoutMode::SideBySide);
        app.event(&key('3'));
        assert_eq!(app.tab, Tab::Scatter);
    }

    #[test]
    fn error_modal_eats_keys_until_dismissed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        app.error_modal.show("boom".to_string());
        // 'q' must not exit while the modal is up.
        assert!(app.event(&key('q')).is_none());
        assert!(app.error_modal.active);
        app.event(&AppEvent::Key(KeyEvent {
            code: KeyCode::Esc,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }));
        assert!(!app.error_modal.active);
    }

    #[test]
    fn render_smoke() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = open_app(&write_csv(dir.path()));
        let area = Rect::new(0, 0, 120, 40);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().chars().next().unwrap_or(' '))
            .collect();
        assert!(text.contains("Filters"));
        assert!(text.contains("Average Quality"));
        assert!(text.contains("Rows: 6"));
    }
}
