use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};

use etrace_types::Column;
use etrace_view::TraceView;

use crate::app::{InputMode, UiState};
use crate::ui::components::{FilterBar, FilterEntry, HelpOverlay, StatusBar, input_hints, table_hints};
use crate::ui::{Layout, Theme};

/// The single trace-table screen
pub struct TraceTableScreen;

impl TraceTableScreen {
    pub fn render(frame: &mut Frame, view: &TraceView, ui: &mut UiState, title: &str) {
        let (header, filters, table, status) = Layout::main(frame.area());

        Self::render_header(frame, header, view, ui, title);
        Self::render_filter_bar(frame, filters, view, ui);
        Self::render_table(frame, table, view, ui);
        Self::render_status_bar(frame, status, ui);

        if ui.input_mode == InputMode::Recolor {
            Self::render_color_prompt(frame, view, ui);
        }
        if ui.help_visible {
            HelpOverlay::render(frame);
        }
    }

    fn render_header(frame: &mut Frame, area: Rect, view: &TraceView, ui: &UiState, title: &str) {
        let mut spans = vec![
            Span::styled(" etrace", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(title.to_string(), Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("{}/{} rows", view.visible_count(), view.row_count()),
                Theme::text(),
            ),
        ];
        if let Some(column) = view.highlight_column() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(format!("colored by {}", column.name()), Theme::text()));
        }
        if !ui.selection.is_empty() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(format!("{} selected", ui.selection.len()), Theme::selection_marker()));
        }
        if ui.follow {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("following", Theme::text_dim()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, view: &TraceView, ui: &UiState) {
        let entries = Column::ALL
            .iter()
            .filter(|c| c.is_filterable())
            .map(|&column| FilterEntry {
                column,
                text: view.filter_text(column),
                invalid: view.filter_is_invalid(column),
            })
            .collect();

        let mut bar = FilterBar::new(entries, view.filter_mode(), ui.focus);
        if ui.input_mode == InputMode::Filter {
            bar = bar.editing(&ui.input);
        }
        frame.render_widget(bar, area);
    }

    fn render_table(frame: &mut Frame, area: Rect, view: &TraceView, ui: &mut UiState) {
        // borders and the column header row
        let page = area.height.saturating_sub(3) as usize;
        let visible = view.visible_count();
        ui.clamp_cursor(visible);
        ui.scroll_into_view(page);

        let header = Row::new(std::iter::once(Cell::from(" ")).chain(Column::ALL.iter().map(|&c| {
            let style = if c == ui.focus {
                Theme::column_header_focused()
            } else {
                Theme::column_header()
            };
            Cell::from(c.name()).style(style)
        })));

        let end = (ui.scroll + page).min(visible);
        let rows: Vec<Row> = (ui.scroll..end)
            .filter_map(|position| view.row_at(position))
            .map(|row| {
                let marker = if ui.selection.contains(&row) {
                    Cell::from("●").style(Theme::selection_marker())
                } else {
                    Cell::from(" ")
                };
                let cells = Column::ALL.iter().map(|&column| {
                    let text = view.cell_text(row, column).unwrap_or_default();
                    Cell::from(text).style(Theme::cell(view.cell_colors(row, column)))
                });
                Row::new(std::iter::once(marker).chain(cells))
            })
            .collect();

        let table = Table::new(rows, Layout::column_widths())
            .header(header)
            .column_spacing(1)
            .row_highlight_style(Theme::cursor_row())
            .block(Block::default().borders(Borders::ALL).border_style(Theme::border()));

        let selected = (visible > 0).then(|| ui.cursor.saturating_sub(ui.scroll));
        let mut state = TableState::default().with_selected(selected);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, ui: &UiState) {
        let hints = if ui.is_editing() { input_hints() } else { table_hints() };
        let mut bar = StatusBar::new().hints(hints);
        if let Some(message) = &ui.message {
            bar = if message.starts_with("Error") {
                bar.right_error(message.clone())
            } else {
                bar.right(message.clone())
            };
        }
        frame.render_widget(bar, area);
    }

    fn render_color_prompt(frame: &mut Frame, view: &TraceView, ui: &UiState) {
        let area = Layout::centered(frame.area(), 48, 3);
        frame.render_widget(Clear, area);

        let value = view
            .row_at(ui.cursor)
            .and_then(|row| view.cell_text(row, ui.focus))
            .unwrap_or_default();
        let title = format!(" Color for {} = {} ", ui.focus.name(), value);
        let prompt = Paragraph::new(Line::from(vec![
            Span::styled("#", Theme::text_dim()),
            Span::styled(format!("{}▏", ui.input), Theme::text_highlight()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(prompt, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use etrace_types::TraceEvent;
    use etrace_view::{MemoryTraceStore, RowAnnotationStore, TraceStore};
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn view() -> TraceView {
        let store = Arc::new(MemoryTraceStore::new());
        for i in 0..30 {
            store.append_row(TraceEvent::message(Local::now(), "uart", format!("line {}", i)));
        }
        let mut view = TraceView::new(store, Arc::new(RowAnnotationStore::new()));
        view.sync();
        view
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut text = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_follow_mode_shows_newest_rows() {
        let view = view();
        let mut ui = UiState::default();
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal
            .draw(|frame| TraceTableScreen::render(frame, &view, &mut ui, "COM7"))
            .unwrap();

        assert_eq!(ui.cursor, 29);
        let text = screen_text(&terminal);
        assert!(text.contains("30/30 rows"));
        assert!(text.contains("line 29"));
        assert!(!text.contains("line 0 "));
    }

    #[test]
    fn test_filter_edit_is_shown_in_bar() {
        let mut view = view();
        view.set_filter_text(Column::Message, "line 1");
        let mut ui = UiState::default();
        ui.start_input(InputMode::Filter, "line 1".to_string());
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal
            .draw(|frame| TraceTableScreen::render(frame, &view, &mut ui, "trace.log"))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("MESSAGE: line 1"));
        assert!(text.contains("11/30 rows"));
    }
}
