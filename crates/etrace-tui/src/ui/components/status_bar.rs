use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::Theme;

/// Status bar showing keyboard shortcuts on the left and a note on the right
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    right_text: Option<(String, Style)>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            right_text: None,
        }
    }

    /// Keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some((text.into(), Theme::status_bar()));
        self
    }

    /// Right-hand text in the error style
    pub fn right_error<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some((text.into(), Theme::error().bg(Color::DarkGray)));
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
            spans.push(Span::styled(format!(" {}", desc), Theme::status_bar()));
        }
        let line = Line::from(spans);
        let line_width = line.width() as u16;

        // The note wins over hints when space is short
        let right_width = self
            .right_text
            .as_ref()
            .map(|(text, _)| Line::from(text.as_str()).width() as u16)
            .unwrap_or(0);
        let hints_room = if right_width > 0 {
            area.width.saturating_sub(right_width + 4)
        } else {
            area.width.saturating_sub(2)
        };
        if hints_room > 0 && line_width > 0 {
            buf.set_line(area.x + 1, area.y, &line, hints_room);
        }

        if let Some((text, style)) = self.right_text {
            let x = area.x + area.width.saturating_sub(right_width + 1);
            buf.set_span(x, area.y, &Span::styled(text, style), right_width);
        }
    }
}

/// Hints shown while browsing the table
pub fn table_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("/", "Filter"),
        ("c", "Color by column"),
        ("n/N", "Match"),
        ("Space", "Select"),
        ("g", "Group"),
        ("m", "Mode"),
        ("e", "Export"),
        ("?", "Help"),
        ("q", "Quit"),
    ]
}

/// Hints shown while a text field is open
pub fn input_hints() -> Vec<(&'static str, &'static str)> {
    vec![("Enter", "Done"), ("Esc", "Cancel"), ("Ctrl+u", "Clear")]
}
