//! Filter sidebar: category selector, quality range, grouping and scatter
//! attribute readouts.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::config::Theme;
use crate::filter::{FilterDomain, Selection};

pub const SIDEBAR_WIDTH: u16 = 30;

pub struct FilterSidebar<'a> {
    pub domain: &'a FilterDomain,
    pub selection: &'a Selection,
    pub grouped_histogram: bool,
    pub scatter_attribute: Option<&'a str>,
    pub theme: &'a Theme,
}

impl Widget for &FilterSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = self.theme.get("modal_border");
        let text_primary = self.theme.get("text_primary");
        let text_secondary = self.theme.get("text_secondary");
        let accent = self.theme.get("primary");

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Filters ");
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Category label
                Constraint::Length(1), // Category value
                Constraint::Length(1),
                Constraint::Length(1), // Quality label
                Constraint::Length(1), // Quality range value
                Constraint::Length(1),
                Constraint::Length(1), // Histogram grouping
                Constraint::Length(1), // Scatter attribute
                Constraint::Fill(1),
            ])
            .split(inner);

        Paragraph::new("Wine type:")
            .style(Style::default().fg(text_primary))
            .render(rows[0], buf);
        Paragraph::new(Line::from(Span::styled(
            format!("  {}", self.selection.category.label()),
            Style::default().fg(accent),
        )))
        .render(rows[1], buf);

        Paragraph::new("Quality rating:")
            .style(Style::default().fg(text_primary))
            .render(rows[3], buf);
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(
                    "  {:.1} — {:.1}",
                    self.selection.quality_min, self.selection.quality_max
                ),
                Style::default().fg(accent),
            ),
            Span::styled(
                format!(
                    "  (of {:.1}–{:.1})",
                    self.domain.quality_min, self.domain.quality_max
                ),
                Style::default().fg(text_secondary),
            ),
        ]))
        .render(rows[4], buf);

        let group_marker = if self.grouped_histogram { "☑" } else { "☐" };
        Paragraph::new(format!("{} Split histogram by type", group_marker))
            .style(Style::default().fg(text_primary))
            .render(rows[6], buf);

        let attribute = self.scatter_attribute.unwrap_or("(none selected)");
        Paragraph::new(format!("Scatter: {}", attribute))
            .style(Style::default().fg(text_primary))
            .render(rows[7], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use crate::filter::CategoryChoice;

    #[test]
    fn sidebar_shows_selection() {
        let domain = FilterDomain {
            categories: vec!["red".to_string(), "white".to_string()],
            quality_min: 3.0,
            quality_max: 9.0,
        };
        let selection = Selection::new(CategoryChoice::One("red".to_string()), 4.0, 6.0);
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let sidebar = FilterSidebar {
            domain: &domain,
            selection: &selection,
            grouped_histogram: true,
            scatter_attribute: Some("alcohol"),
            theme: &theme,
        };
        let area = Rect::new(0, 0, SIDEBAR_WIDTH, 12);
        let mut buf = Buffer::empty(area);
        (&sidebar).render(area, &mut buf);

        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().chars().next().unwrap_or(' '))
                .collect()
        };
        assert!(row(2).contains("red"));
        assert!(row(5).contains("4.0"));
        assert!(row(8).contains("alcohol"));
    }
}
