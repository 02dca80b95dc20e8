use std::path::Path;
use std::sync::Arc;

use etrace_types::{ColorPair, Column, FilterMode, Rgb};

use crate::annotations::RowAnnotationStore;
use crate::colors::ColorAssigner;
use crate::engine::FilterEngine;
use crate::error::Result;
use crate::export;
use crate::filter_store::ColumnFilterStore;
use crate::groups::GroupManager;
use crate::navigator::{MatchNavigator, RowSource};
use crate::store::TraceStore;

/// The rendering layer's entry point into the engine.
///
/// Owns the UI-side state (highlight column, current match) and wires the
/// filter store, engine, navigator, color tables and groups around one trace
/// store. Positions are indices into the store's visible rows; rows are
/// stable store indices.
pub struct TraceView {
    store: Arc<dyn TraceStore>,
    filters: Arc<ColumnFilterStore>,
    engine: FilterEngine,
    navigator: MatchNavigator,
    annotations: Arc<RowAnnotationStore>,
    colors: Arc<ColorAssigner>,
    groups: GroupManager,

    /// Column whose values color whole rows
    highlight_column: Option<Column>,

    /// Row drawn with swapped colors
    current_match: Option<usize>,

    /// Rows already registered in the color tables
    observed_rows: usize,
}

impl TraceView {
    pub fn new(store: Arc<dyn TraceStore>, annotations: Arc<RowAnnotationStore>) -> Self {
        let filters = Arc::new(ColumnFilterStore::new());
        let colors = Arc::new(ColorAssigner::new());
        Self {
            engine: FilterEngine::new(Arc::clone(&filters)),
            navigator: MatchNavigator::new(Arc::clone(&filters)),
            groups: GroupManager::new(Arc::clone(&annotations), Arc::clone(&colors)),
            store,
            filters,
            annotations,
            colors,
            highlight_column: None,
            current_match: None,
            observed_rows: 0,
        }
    }

    pub fn with_fade_level(mut self, level: f32) -> Self {
        self.engine = self.engine.with_fade_level(level);
        self
    }

    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.engine = self.engine.with_mode(mode);
        self
    }

    pub fn store(&self) -> &Arc<dyn TraceStore> {
        &self.store
    }

    pub fn annotations(&self) -> &Arc<RowAnnotationStore> {
        &self.annotations
    }

    pub fn colors(&self) -> &Arc<ColorAssigner> {
        &self.colors
    }

    pub fn generation(&self) -> i64 {
        self.engine.generation()
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    /// Register rows that arrived since the last call, returning how many.
    ///
    /// Each new row gets its annotation and has every cell value counted in
    /// its column's color table.
    pub fn sync(&mut self) -> usize {
        let total = self.store.row_count();
        if total < self.observed_rows {
            // cleared behind our back
            self.observed_rows = 0;
        }
        let start = self.observed_rows;
        for row in start..total {
            self.annotations.get_or_create(row);
            for column in Column::ALL.iter().copied().filter(|c| *c != Column::Group) {
                if let Some(text) = self.store.cell_text(row, column) {
                    self.colors.assign_or_get(column, &text);
                }
            }
        }
        self.observed_rows = total;
        total - start
    }

    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    pub fn visible_count(&self) -> usize {
        self.store.visible_count()
    }

    /// Row index at a visible position
    pub fn row_at(&self, position: usize) -> Option<usize> {
        self.store.visible_row(position)
    }

    /// Visible position of a row
    pub fn position_of(&self, row: usize) -> Option<usize> {
        self.store.visible_position(row)
    }

    /// Display text of a cell; the group cell is empty for ungrouped rows
    pub fn cell_text(&self, row: usize, column: Column) -> Option<String> {
        match column {
            Column::Group if row < self.store.row_count() => {
                let group = self.annotations.group_of(row);
                Some(if group == 0 { String::new() } else { group.to_string() })
            }
            _ => self.store.cell_text(row, column),
        }
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    pub fn filter_text(&self, column: Column) -> String {
        self.filters.text(column)
    }

    /// Whether the column's pattern was entered but rejected
    pub fn filter_is_invalid(&self, column: Column) -> bool {
        self.filters.predicate(column).is_invalid()
    }

    /// Update a column pattern and re-apply filters if it changed
    pub fn set_filter_text(&mut self, column: Column, text: &str) -> bool {
        let changed = self.filters.set_text(column, text);
        if changed {
            self.apply_filters();
        }
        changed
    }

    pub fn apply_filters(&mut self) {
        self.engine.apply_filters(self.store.as_ref());
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.engine.mode()
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> bool {
        let changed = self.engine.set_mode(mode);
        if changed {
            tracing::info!(mode = mode.label(), "filter mode changed");
            self.apply_filters();
        }
        changed
    }

    /// Empty every filter and drop the highlight column.
    ///
    /// Returns whether anything changed (and so a redraw is needed).
    pub fn reset_view(&mut self) -> bool {
        let mut redraw = self.highlight_column.take().is_some();
        if self.filters.clear_all() {
            redraw = true;
        }
        if redraw {
            self.apply_filters();
        }
        redraw
    }

    // ------------------------------------------------------------------
    // Colors
    // ------------------------------------------------------------------

    pub fn highlight_column(&self) -> Option<Column> {
        self.highlight_column
    }

    /// Color rows by their value in `column`, returning whether a redraw is needed
    pub fn activate_column(&mut self, column: Column) -> bool {
        let mut redraw = self.highlight_column != Some(column);
        if self.colors.materialize_all(column) {
            redraw = true;
        }
        self.highlight_column = Some(column);
        redraw
    }

    /// Fade of a row under the current filters (cached per generation)
    pub fn row_fade(&self, row: usize) -> f32 {
        let annotation = self.annotations.get_or_create(row);
        self.engine
            .fade_for(&annotation, |c| self.cell_text(row, c))
    }

    /// Background/foreground for one cell.
    ///
    /// The group cell always shows its group color; other cells follow the
    /// highlight column. Faded rows blend the foreground into the background,
    /// and the current match swaps both.
    pub fn cell_colors(&self, row: usize, column: Column) -> ColorPair {
        let key_column = if column == Column::Group {
            Some(Column::Group)
        } else {
            self.highlight_column
        };

        let mut pair = ColorPair::plain();
        if let Some(key_column) = key_column {
            if let Some(key) = self.cell_text(row, key_column).filter(|k| !k.is_empty()) {
                pair = self.colors.materialize(key_column, &key);
            }
        }

        let fade = self.row_fade(row);
        if fade < 1.0 {
            pair.foreground = pair.background.lerp(pair.foreground, fade);
        }

        if self.current_match == Some(row) {
            pair = pair.swapped();
        }
        pair
    }

    /// Permanently recolor the value `row` has in `column`
    pub fn recolor(&mut self, row: usize, column: Column, background: Rgb) -> Option<ColorPair> {
        let key = self.cell_text(row, column).filter(|k| !k.is_empty())?;
        let pair = self.colors.override_color(column, &key, background);
        tracing::debug!(%column, key = %key, color = %background, "value recolored");
        Some(pair)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn current_match(&self) -> Option<usize> {
        self.current_match
    }

    /// Next matching visible position after `from`, which becomes the current match
    pub fn next_match(&mut self, from: Option<usize>) -> Option<usize> {
        let position = self.navigator.next(&VisibleRows(self), from);
        self.set_current(position)
    }

    /// Previous matching visible position before `from`
    pub fn previous_match(&mut self, from: Option<usize>) -> Option<usize> {
        let position = self.navigator.previous(&VisibleRows(self), from);
        self.set_current(position)
    }

    fn set_current(&mut self, position: Option<usize>) -> Option<usize> {
        self.current_match = position.and_then(|p| self.store.visible_row(p));
        position
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Group the given rows, merging into an existing group among them
    pub fn group_rows(&mut self, rows: &[usize]) -> Option<u32> {
        self.groups.group_selection(rows)
    }

    // ------------------------------------------------------------------
    // Export & clear
    // ------------------------------------------------------------------

    /// Write the given rows (or every visible row) as tab-separated text
    pub fn export(&self, path: &Path, rows: Option<&[usize]>) -> Result<usize> {
        let all_visible: Vec<usize>;
        let rows = match rows {
            Some(rows) => rows,
            None => {
                all_visible = (0..self.store.visible_count())
                    .filter_map(|p| self.store.visible_row(p))
                    .collect();
                &all_visible
            }
        };
        export::export_rows(path, rows, |row, column| self.cell_text(row, column))
    }

    /// Discard every row, annotation, color entry and group id
    pub fn clear(&mut self) {
        let store = Arc::clone(&self.store);
        self.annotations.clear_with(|| store.remove_all_items());
        self.colors.reset();
        self.groups.reset();
        self.current_match = None;
        self.observed_rows = 0;
        tracing::info!("trace cleared");
    }
}

/// Visible rows addressed by position, for the navigator
struct VisibleRows<'a>(&'a TraceView);

impl RowSource for VisibleRows<'_> {
    fn row_count(&self) -> usize {
        self.0.store.visible_count()
    }

    fn cell_text(&self, position: usize, column: Column) -> Option<String> {
        let row = self.0.store.visible_row(position)?;
        self.0.cell_text(row, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::PALETTE;
    use crate::store::MemoryTraceStore;
    use chrono::Local;
    use etrace_types::TraceEvent;

    fn view_with(processes: &[&str]) -> TraceView {
        let store = Arc::new(MemoryTraceStore::new());
        for p in processes {
            let mut e = TraceEvent::message(Local::now(), "mod", format!("from {}", p));
            e.process_id = p.to_string();
            store.append_row(e);
        }
        let mut view = TraceView::new(store, Arc::new(RowAnnotationStore::new()));
        view.sync();
        view
    }

    fn visible_rows(view: &TraceView) -> Vec<usize> {
        (0..view.visible_count()).filter_map(|p| view.row_at(p)).collect()
    }

    #[test]
    fn test_hide_filter_scenario() {
        let mut view = view_with(&["a", "a", "b", "a", "b"]);
        assert!(view.set_filter_text(Column::Process, "b"));
        assert_eq!(visible_rows(&view), vec![2, 4]);
        assert_eq!(view.row_fade(2), 1.0);
        assert_eq!(view.row_fade(4), 1.0);
    }

    #[test]
    fn test_fade_filter_scenario() {
        let mut view = view_with(&["a", "a", "b", "a", "b"]).with_mode(FilterMode::Fade);
        view.set_filter_text(Column::Process, "a");
        assert_eq!(view.visible_count(), 5);
        let fades: Vec<f32> = (0..5).map(|r| view.row_fade(r)).collect();
        assert_eq!(fades, vec![1.0, 1.0, 0.37, 1.0, 0.37]);

        let faded = view.cell_colors(2, Column::Message);
        assert_eq!(faded.background, Rgb::WHITE);
        assert_eq!(faded.foreground, Rgb::WHITE.lerp(Rgb::BLACK, 0.37));
    }

    #[test]
    fn test_mode_switch_reapplies() {
        let mut view = view_with(&["a", "b"]);
        view.set_filter_text(Column::Process, "a");
        assert_eq!(view.visible_count(), 1);
        assert!(view.set_filter_mode(FilterMode::Fade));
        assert_eq!(view.visible_count(), 2);
        assert!(!view.set_filter_mode(FilterMode::Fade));
    }

    #[test]
    fn test_reset_view_is_idempotent() {
        let mut view = view_with(&["a", "b"]);
        view.set_filter_text(Column::Process, "a");
        view.activate_column(Column::Process);
        assert!(view.reset_view());
        assert_eq!(view.visible_count(), 2);
        assert!(!view.reset_view());
    }

    #[test]
    fn test_highlight_column_colors_rows() {
        let mut view = view_with(&["a", "b", "a"]);
        assert_eq!(view.cell_colors(0, Column::Message), ColorPair::plain());
        assert!(view.activate_column(Column::Process));
        assert!(!view.activate_column(Column::Process));
        assert_eq!(view.cell_colors(0, Column::Message).background, PALETTE[0]);
        assert_eq!(view.cell_colors(1, Column::Message).background, PALETTE[1]);
        assert_eq!(view.cell_colors(2, Column::Id).background, PALETTE[0]);
    }

    #[test]
    fn test_current_match_swaps_colors() {
        let mut view = view_with(&["a", "b", "c"]);
        view.set_filter_text(Column::Message, "from b");
        view.set_filter_mode(FilterMode::Fade);
        assert_eq!(view.next_match(None), Some(1));
        assert_eq!(view.current_match(), Some(1));
        let pair = view.cell_colors(1, Column::Message);
        assert_eq!(pair, ColorPair::plain().swapped());

        view.set_filter_text(Column::Message, "nothing");
        assert_eq!(view.next_match(Some(1)), None);
        assert_eq!(view.current_match(), None);
    }

    #[test]
    fn test_navigation_runs_over_visible_rows() {
        let mut view = view_with(&["a", "b", "a", "b"]);
        view.set_filter_text(Column::Process, "b");
        // visible positions 0,1 map to rows 1,3
        assert_eq!(view.next_match(Some(0)), Some(1));
        assert_eq!(view.current_match(), Some(3));
    }

    #[test]
    fn test_grouping_paints_group_cell() {
        let mut view = view_with(&["a", "b", "c"]);
        let id = view.group_rows(&[0, 2]).unwrap();
        assert_eq!(view.cell_text(0, Column::Group).as_deref(), Some("1"));
        assert_eq!(view.cell_text(1, Column::Group).as_deref(), Some(""));
        assert_eq!(view.cell_colors(2, Column::Group).background, PALETTE[0]);
        assert_eq!(view.cell_colors(1, Column::Group), ColorPair::plain());
        assert_eq!(view.group_rows(&[1, 2]), Some(id));
    }

    #[test]
    fn test_recolor_overrides_value() {
        let mut view = view_with(&["a", "b"]);
        view.activate_column(Column::Process);
        let custom = Rgb::new(0x20, 0x20, 0x20);
        let pair = view.recolor(0, Column::Process, custom).unwrap();
        assert_eq!(pair.foreground, Rgb::WHITE);
        assert_eq!(view.cell_colors(0, Column::Message).background, custom);
        assert_eq!(view.recolor(0, Column::Group, custom), None);
    }

    #[test]
    fn test_sync_counts_new_rows_only() {
        let mut view = view_with(&["a"]);
        let mut e = TraceEvent::message(Local::now(), "mod", "late");
        e.process_id = "z".to_string();
        view.store().append_row(e);
        assert_eq!(view.sync(), 1);
        assert_eq!(view.sync(), 0);
        assert_eq!(view.colors().get(Column::Process, "z").unwrap().ordinal, 1);
        assert_eq!(view.annotations().len(), 2);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut view = view_with(&["a", "b"]);
        view.group_rows(&[0]);
        let before = view.generation();
        view.clear();
        assert_eq!(view.row_count(), 0);
        assert!(view.annotations().is_empty());
        assert_eq!(view.colors().distinct_count(Column::Process), 0);
        assert!(view.generation() >= before);

        view.store().append_row(TraceEvent::message(Local::now(), "mod", "x"));
        view.sync();
        assert_eq!(view.group_rows(&[0]), Some(1));
    }
}
