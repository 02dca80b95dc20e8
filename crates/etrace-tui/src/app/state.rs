use std::collections::BTreeSet;

use etrace_types::Column;

/// What typed characters currently edit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Live edit of the focused column's filter
    Filter,
    /// Hex color for the focused cell's value
    Recolor,
}

/// UI-side transient state
#[derive(Debug)]
pub struct UiState {
    /// Cursor as a visible position
    pub cursor: usize,

    /// First visible position drawn
    pub scroll: usize,

    /// Column the column-wise commands act on
    pub focus: Column,

    /// Keep the cursor on the newest row?
    pub follow: bool,

    /// Selected row indices
    pub selection: BTreeSet<usize>,

    pub input_mode: InputMode,
    pub input: String,

    /// Filter text before editing started, restored on cancel
    pub input_backup: String,

    pub help_visible: bool,

    /// One-line feedback shown in the status bar
    pub message: Option<String>,

    pub should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            scroll: 0,
            focus: Column::Message,
            follow: true,
            selection: BTreeSet::new(),
            input_mode: InputMode::Normal,
            input: String::new(),
            input_backup: String::new(),
            help_visible: false,
            message: None,
            should_quit: false,
        }
    }
}

impl UiState {
    pub fn cursor_up(&mut self, n: usize) {
        self.follow = false;
        self.cursor = self.cursor.saturating_sub(n);
    }

    pub fn cursor_down(&mut self, n: usize, visible: usize) {
        self.follow = false;
        self.cursor = self.cursor.saturating_add(n);
        self.clamp_cursor(visible);
    }

    pub fn cursor_to(&mut self, position: usize, visible: usize) {
        self.cursor = position;
        self.clamp_cursor(visible);
    }

    /// Keep the cursor inside `0..visible`, or on the last row when following
    pub fn clamp_cursor(&mut self, visible: usize) {
        let last = visible.saturating_sub(1);
        if self.follow || self.cursor > last {
            self.cursor = last;
        }
    }

    /// Adjust the scroll offset so the cursor is inside a page of `height` rows
    pub fn scroll_into_view(&mut self, height: usize) {
        let height = height.max(1);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
    }

    pub fn focus_left(&mut self) {
        let index = self.focus.index();
        let previous = if index == 0 { Column::COUNT - 1 } else { index - 1 };
        self.focus = Column::from_index(previous).unwrap_or(self.focus);
    }

    pub fn focus_right(&mut self) {
        let next = (self.focus.index() + 1) % Column::COUNT;
        self.focus = Column::from_index(next).unwrap_or(self.focus);
    }

    /// Select or deselect a row, returning whether it is now selected
    pub fn toggle_selection(&mut self, row: usize) -> bool {
        if self.selection.remove(&row) {
            false
        } else {
            self.selection.insert(row);
            true
        }
    }

    pub fn selected_rows(&self) -> Vec<usize> {
        self.selection.iter().copied().collect()
    }

    pub fn start_input(&mut self, mode: InputMode, initial: String) {
        self.input_mode = mode;
        self.input_backup = initial.clone();
        self.input = initial;
    }

    /// Leave input mode, returning what was typed
    pub fn finish_input(&mut self) -> String {
        self.input_mode = InputMode::Normal;
        self.input_backup.clear();
        std::mem::take(&mut self.input)
    }

    pub fn is_editing(&self) -> bool {
        self.input_mode != InputMode::Normal
    }

    pub fn show_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Forget rows after the trace was cleared
    pub fn reset_rows(&mut self) {
        self.cursor = 0;
        self.scroll = 0;
        self.selection.clear();
    }
}
