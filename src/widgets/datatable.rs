//! Read-only preview table of the filtered view.

use polars::prelude::*;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Style, Stylize},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use crate::config::Theme;

/// Upper bound on rendered rows; the terminal cannot usefully show more and
/// formatting thousands of cells per frame is wasted work.
const MAX_PREVIEW_ROWS: usize = 200;

pub struct DataTable<'a> {
    pub df: &'a DataFrame,
    pub theme: &'a Theme,
}

fn format_cell(value: AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => format!("{:.3}", v),
        AnyValue::Float32(v) => format!("{:.3}", v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

impl Widget for &DataTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("modal_border")))
            .title(format!(" Rows ({}) ", self.df.height()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.df.height() == 0 {
            ratatui::widgets::Paragraph::new("No rows match your filters.")
                .style(Style::default().fg(self.theme.get("text_secondary")))
                .centered()
                .render(inner, buf);
            return;
        }

        let columns = self.df.get_columns();
        let header = Row::new(
            columns
                .iter()
                .map(|c| Cell::from(c.name().to_string()))
                .collect::<Vec<_>>(),
        )
        .style(Style::default().fg(self.theme.get("table_header")).bold());

        let visible = self.df.height().min(MAX_PREVIEW_ROWS);
        let mut rows = Vec::with_capacity(visible);
        for i in 0..visible {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|c| {
                    let value = c
                        .get(i)
                        .map(format_cell)
                        .unwrap_or_default();
                    Cell::from(value)
                })
                .collect();
            rows.push(Row::new(cells));
        }

        let widths: Vec<Constraint> = columns
            .iter()
            .map(|_| Constraint::Fill(1))
            .collect();

        Table::new(rows, widths)
            .header(header)
            .style(Style::default().fg(self.theme.get("text_primary")))
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;

    #[test]
    fn table_renders_header_and_values() {
        let df = df!(
            "wine_type" => &["red", "white"],
            "alcohol" => &[9.4, 10.1],
            "quality" => &[5i64, 6],
        )
        .unwrap();
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let table = DataTable {
            df: &df,
            theme: &theme,
        };
        let area = Rect::new(0, 0, 60, 8);
        let mut buf = Buffer::empty(area);
        (&table).render(area, &mut buf);
        let text: String = (0..area.height)
            .flat_map(|y| {
                (0..area.width)
                    .map(move |x| (x, y))
                    .collect::<Vec<_>>()
            })
            .map(|(x, y)| buf[(x, y)].symbol().chars().next().unwrap_or(' '))
            .collect();
        assert!(text.contains("wine_type"));
        assert!(text.contains("9.400"));
        assert!(text.contains("Rows (2)"));
    }
}
