use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let area = Layout::centered(frame.area(), 54, 32);
        frame.render_widget(Clear, area);

        let help_text = vec![
            Self::section("Navigation"),
            Self::key_line("j/k ↑/↓", "Move cursor"),
            Self::key_line("PgUp/PgDn", "Page up/down"),
            Self::key_line("Home/End", "First/last row"),
            Self::key_line("h/l ←/→", "Focus column"),
            Self::key_line("f", "Toggle follow mode"),
            Line::from(""),
            Self::section("Filtering"),
            Self::key_line("/", "Edit focused column filter"),
            Self::key_line("m", "Hide or fade mismatches"),
            Self::key_line("n / N", "Next / previous match"),
            Self::key_line("Esc", "Reset filters and colors"),
            Line::from(""),
            Self::section("Highlighting"),
            Self::key_line("c", "Color rows by focused column"),
            Self::key_line("C", "Set color of focused value"),
            Self::key_line("Space", "Select row"),
            Self::key_line("g", "Group selected rows"),
            Line::from(""),
            Self::section("Trace"),
            Self::key_line("e", "Export visible rows"),
            Self::key_line("E", "Export selected rows"),
            Self::key_line("x", "Clear trace"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, area);
    }

    fn section(title: &str) -> Line<'_> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>10}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
