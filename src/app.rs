//! Action handling: turns UI actions into view operations

use std::path::PathBuf;

use etrace_types::Rgb;
use etrace_tui::{Action, InputMode, UiState};
use etrace_view::TraceView;

/// Rows moved by PageUp/PageDown
const PAGE: usize = 20;

pub struct App {
    pub view: TraceView,
    pub ui: UiState,

    /// Source description for the header
    pub title: String,

    export_dir: PathBuf,
}

impl App {
    pub fn new(view: TraceView, title: String, export_dir: PathBuf) -> Self {
        Self {
            view,
            ui: UiState::default(),
            title,
            export_dir,
        }
    }

    /// Pick up rows that arrived since the last tick; true if there were any
    pub fn on_tick(&mut self) -> bool {
        if self.view.sync() == 0 {
            return false;
        }
        self.ui.clamp_cursor(self.view.visible_count());
        true
    }

    fn cursor_row(&self) -> Option<usize> {
        self.view.row_at(self.ui.cursor)
    }

    pub fn handle_action(&mut self, action: Action) {
        let visible = self.view.visible_count();

        match action {
            Action::Quit => {
                self.ui.should_quit = true;
            }
            Action::ToggleHelp => {
                self.ui.help_visible = !self.ui.help_visible;
            }

            // Cursor
            Action::CursorUp(n) => self.ui.cursor_up(n),
            Action::CursorDown(n) => self.ui.cursor_down(n, visible),
            Action::PageUp => self.ui.cursor_up(PAGE),
            Action::PageDown => self.ui.cursor_down(PAGE, visible),
            Action::CursorTop => {
                self.ui.follow = false;
                self.ui.cursor_to(0, visible);
            }
            Action::CursorBottom => {
                self.ui.follow = false;
                self.ui.cursor_to(visible.saturating_sub(1), visible);
            }
            Action::FocusLeft => self.ui.focus_left(),
            Action::FocusRight => self.ui.focus_right(),

            // Text input
            Action::EditFilter => {
                let column = self.ui.focus;
                if column.is_filterable() {
                    self.ui.start_input(InputMode::Filter, self.view.filter_text(column));
                } else {
                    self.ui.show_message(format!("{} cannot be filtered", column.name()));
                }
            }
            Action::StartRecolor => {
                let has_value = self
                    .cursor_row()
                    .and_then(|row| self.view.cell_text(row, self.ui.focus))
                    .is_some_and(|text| !text.is_empty());
                if has_value {
                    self.ui.start_input(InputMode::Recolor, String::new());
                } else {
                    self.ui.show_message("No value to color here");
                }
            }
            Action::InputChar(c) => {
                match self.ui.input_mode {
                    InputMode::Recolor if !c.is_ascii_hexdigit() || self.ui.input.len() >= 6 => {}
                    _ => self.ui.input.push(c),
                }
                self.apply_live_filter();
            }
            Action::InputBackspace => {
                self.ui.input.pop();
                self.apply_live_filter();
            }
            Action::InputClear => {
                self.ui.input.clear();
                self.apply_live_filter();
            }
            Action::InputSubmit => self.submit_input(),
            Action::InputCancel => {
                let mode = self.ui.input_mode;
                let backup = self.ui.input_backup.clone();
                self.ui.finish_input();
                if mode == InputMode::Filter {
                    self.view.set_filter_text(self.ui.focus, &backup);
                }
            }

            // Highlighting and search
            Action::ActivateColumn => {
                let column = self.ui.focus;
                self.view.activate_column(column);
                self.ui.show_message(format!("Coloring rows by {}", column.name()));
            }
            Action::NextMatch | Action::PreviousMatch => {
                let from = (visible > 0).then_some(self.ui.cursor);
                let hit = if action == Action::NextMatch {
                    self.view.next_match(from)
                } else {
                    self.view.previous_match(from)
                };
                match hit {
                    Some(position) => {
                        self.ui.follow = false;
                        self.ui.cursor_to(position, visible);
                    }
                    None => self.ui.show_message("No match"),
                }
            }
            Action::ToggleFilterMode => {
                let mode = self.view.filter_mode().toggled();
                self.view.set_filter_mode(mode);
                self.ui.show_message(format!("Filter mode: {}", mode.label()));
            }
            Action::ResetView => {
                if self.view.reset_view() {
                    self.ui.show_message("View reset");
                }
            }

            // Rows
            Action::ToggleSelection => {
                if let Some(row) = self.cursor_row() {
                    self.ui.toggle_selection(row);
                }
            }
            Action::GroupSelection => {
                let rows = if self.ui.selection.is_empty() {
                    self.cursor_row().into_iter().collect()
                } else {
                    self.ui.selected_rows()
                };
                if let Some(id) = self.view.group_rows(&rows) {
                    self.ui.selection.clear();
                    self.ui.show_message(format!("Grouped {} rows as #{}", rows.len(), id));
                }
            }
            Action::ToggleFollow => {
                self.ui.follow = !self.ui.follow;
                self.ui.clamp_cursor(visible);
            }
            Action::ExportAll => self.export(false),
            Action::ExportSelected => self.export(true),
            Action::ClearTrace => {
                self.view.clear();
                self.ui.reset_rows();
                self.ui.show_message("Trace cleared");
            }
        }
    }

    /// Filter edits take effect on every keystroke
    fn apply_live_filter(&mut self) {
        if self.ui.input_mode == InputMode::Filter {
            self.view.set_filter_text(self.ui.focus, &self.ui.input);
        }
    }

    fn submit_input(&mut self) {
        let mode = self.ui.input_mode;
        let input = self.ui.finish_input();
        if mode != InputMode::Recolor {
            return;
        }

        let Some(color) = Rgb::parse_hex(&input) else {
            self.ui.show_message(format!("Error: '{}' is not an RRGGBB color", input));
            return;
        };
        let column = self.ui.focus;
        let recolored = self
            .cursor_row()
            .and_then(|row| self.view.recolor(row, column, color));
        if recolored.is_some() {
            self.ui.show_message(format!("{} value colored {}", column.name(), color));
        }
    }

    fn export(&mut self, selected_only: bool) {
        let rows = selected_only.then(|| self.ui.selected_rows());
        if rows.as_ref().is_some_and(|r| r.is_empty()) {
            self.ui.show_message("No rows selected");
            return;
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let name = if selected_only {
            format!("etrace_selection_{}.tsv", stamp)
        } else {
            format!("etrace_{}.tsv", stamp)
        };
        let path = self.export_dir.join(name);

        match self.view.export(&path, rows.as_deref()) {
            Ok(count) => self
                .ui
                .show_message(format!("Exported {} rows to {}", count, path.display())),
            Err(e) => self.ui.show_message(format!("Error: {}", e)),
        }
    }
}
