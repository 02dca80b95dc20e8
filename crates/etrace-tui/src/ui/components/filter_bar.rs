use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use etrace_types::{Column, FilterMode};

use crate::ui::Theme;

/// One column's pattern as shown in the bar
#[derive(Clone, Debug)]
pub struct FilterEntry {
    pub column: Column,
    pub text: String,
    pub invalid: bool,
}

/// Bordered line listing every non-empty column filter
pub struct FilterBar<'a> {
    entries: Vec<FilterEntry>,
    mode: FilterMode,
    focus: Column,

    /// Live input when the focused column is being edited
    editing: Option<&'a str>,
}

impl<'a> FilterBar<'a> {
    pub fn new(entries: Vec<FilterEntry>, mode: FilterMode, focus: Column) -> Self {
        Self {
            entries,
            mode,
            focus,
            editing: None,
        }
    }

    pub fn editing(mut self, input: &'a str) -> Self {
        self.editing = Some(input);
        self
    }

    fn spans(&self) -> Vec<Span<'_>> {
        let mut spans = Vec::new();
        for entry in &self.entries {
            let editing_this = self.editing.is_some() && entry.column == self.focus;
            if entry.text.is_empty() && !editing_this {
                continue;
            }
            if !spans.is_empty() {
                spans.push(Span::styled("  ", Theme::text_dim()));
            }

            let label_style = if entry.column == self.focus {
                Theme::column_header_focused()
            } else {
                Theme::column_header()
            };
            spans.push(Span::styled(format!("{}:", entry.column.name()), label_style));

            match (editing_this, self.editing) {
                (true, Some(input)) => {
                    spans.push(Span::styled(format!(" {}▏", input), Theme::text_highlight()));
                }
                _ => {
                    let style = if entry.invalid {
                        Theme::filter_invalid()
                    } else {
                        Theme::filter_active()
                    };
                    spans.push(Span::styled(format!(" {}", entry.text), style));
                }
            }
        }

        if spans.is_empty() {
            spans.push(Span::styled("no filters  (/ to edit)", Theme::text_dim()));
        }
        spans
    }
}

impl Widget for FilterBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.editing.is_some() {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(format!(" Filters · {} ", self.mode.label()), Theme::title()));

        Paragraph::new(Line::from(self.spans()))
            .block(block)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(column: Column, text: &str, invalid: bool) -> FilterEntry {
        FilterEntry {
            column,
            text: text.to_string(),
            invalid,
        }
    }

    fn text_of(bar: &FilterBar<'_>) -> String {
        bar.spans().iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_lists_only_non_empty_filters() {
        let bar = FilterBar::new(
            vec![entry(Column::Process, "b", false), entry(Column::Thread, "", false)],
            FilterMode::Hide,
            Column::Message,
        );
        assert_eq!(text_of(&bar), "PROCESS: b");
    }

    #[test]
    fn test_editing_shows_live_input() {
        let bar = FilterBar::new(vec![entry(Column::Message, "", false)], FilterMode::Fade, Column::Message)
            .editing("boo");
        assert_eq!(text_of(&bar), "MESSAGE: boo▏");
    }

    #[test]
    fn test_placeholder_without_filters() {
        let bar = FilterBar::new(Vec::new(), FilterMode::Hide, Column::Log);
        assert!(text_of(&bar).starts_with("no filters"));
    }
}
