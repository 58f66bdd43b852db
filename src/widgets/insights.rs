//! Insight tiles: headline metrics over the filtered view plus a one-line
//! recommendation derived from the strongest positive factor.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::config::Theme;
use crate::insights::Insights;

/// Height of the tile row plus the recommendation line.
pub const INSIGHTS_HEIGHT: u16 = 4;

pub struct InsightTiles<'a> {
    pub insights: Option<&'a Insights>,
    pub theme: &'a Theme,
}

fn tile(area: Rect, buf: &mut Buffer, title: &str, value: Line, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.get("dimmed")))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(theme.get("text_secondary")),
        ));
    let inner = block.inner(area);
    block.render(area, buf);
    Paragraph::new(value).centered().render(inner, buf);
}

impl Widget for &InsightTiles<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(1)])
            .split(area);

        let tiles = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
            ])
            .split(rows[0]);

        let accent = Style::default().fg(self.theme.get("primary")).bold();
        let positive = Style::default().fg(self.theme.get("success")).bold();
        let negative = Style::default().fg(self.theme.get("error")).bold();
        let muted = Style::default().fg(self.theme.get("text_secondary"));

        let insights = match self.insights {
            Some(insights) => insights,
            None => {
                tile(tiles[0], buf, "Average Quality", Line::styled("—", muted), self.theme);
                tile(tiles[1], buf, "Top Positive Factor", Line::styled("—", muted), self.theme);
                tile(tiles[2], buf, "Most Harmful Factor", Line::styled("—", muted), self.theme);
                tile(tiles[3], buf, "Low Impact Factors", Line::styled("—", muted), self.theme);
                Paragraph::new("No rows match your filters.")
                    .style(muted)
                    .render(rows[1], buf);
                return;
            }
        };

        tile(
            tiles[0],
            buf,
            "Average Quality",
            Line::styled(format!("{:.2}", insights.mean_quality), accent),
            self.theme,
        );

        let top = match &insights.top_positive {
            Some((name, r)) => Line::from(vec![
                Span::styled(name.clone(), positive),
                Span::styled(format!(" ({:+.2})", r), muted),
            ]),
            None => Line::styled("—", muted),
        };
        tile(tiles[1], buf, "Top Positive Factor", top, self.theme);

        let harmful = match &insights.most_harmful {
            Some((name, r)) => Line::from(vec![
                Span::styled(name.clone(), negative),
                Span::styled(format!(" ({:+.2})", r), muted),
            ]),
            None => Line::styled("—", muted),
        };
        tile(tiles[2], buf, "Most Harmful Factor", harmful, self.theme);

        tile(
            tiles[3],
            buf,
            "Low Impact Factors",
            Line::styled(insights.low_impact_count.to_string(), accent),
            self.theme,
        );

        let recommendation = match &insights.top_positive {
            Some((name, _)) => format!("Recommendation: increase {} to improve quality", name),
            None => "Recommendation: not enough data to suggest a factor".to_string(),
        };
        Paragraph::new(recommendation).style(muted).render(rows[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;

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
    fn tiles_show_metrics_and_recommendation() {
        let insights = Insights {
            row_count: 100,
            mean_quality: 5.64,
            top_positive: Some(("alcohol".to_string(), 0.48)),
            most_harmful: Some(("volatile_acidity".to_string(), -0.39)),
            low_impact_count: 3,
        };
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let widget = InsightTiles {
            insights: Some(&insights),
            theme: &theme,
        };
        let area = Rect::new(0, 0, 120, INSIGHTS_HEIGHT);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        let text = buffer_text(&buf, area);
        assert!(text.contains("5.64"));
        assert!(text.contains("alcohol"));
        assert!(text.contains("volatile_acidity"));
        assert!(text.contains("increase alcohol"));
    }

    #[test]
    fn empty_view_shows_placeholders() {
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let widget = InsightTiles {
            insights: None,
            theme: &theme,
        };
        let area = Rect::new(0, 0, 120, INSIGHTS_HEIGHT);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        assert!(buffer_text(&buf, area).contains("No rows match your filters."));
    }
}
