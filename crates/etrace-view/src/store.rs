use std::sync::Arc;

use parking_lot::RwLock;

use etrace_types::{Column, TraceEvent};

/// Per-cell visibility test pushed down to the store
pub type CellPredicate = Arc<dyn Fn(Column, &str) -> bool + Send + Sync>;

/// Random-access row store the view enumerates.
///
/// Rows are identified by their append index, which never changes. The store
/// also owns the visible subset: the positions the UI enumerates after the
/// current visibility predicate has been applied.
pub trait TraceStore: Send + Sync {
    /// Append a row, returning its index
    fn append_row(&self, event: TraceEvent) -> usize;

    /// Total rows, visible or not
    fn row_count(&self) -> usize;

    /// Rows passing the visibility predicate
    fn visible_count(&self) -> usize;

    /// Row index at a visible position
    fn visible_row(&self, position: usize) -> Option<usize>;

    /// Visible position of a row index, if it is visible
    fn visible_position(&self, row: usize) -> Option<usize>;

    fn event(&self, row: usize) -> Option<Arc<TraceEvent>>;

    fn set_visibility_predicate(&self, predicate: CellPredicate);

    /// Recompute the visible subset with the current predicate
    fn apply_filters(&self);

    /// Drop every row
    fn remove_all_items(&self);

    /// Text of a cell; `None` for unknown rows and for the group column,
    /// which the store does not own
    fn cell_text(&self, row: usize, column: Column) -> Option<String> {
        let event = self.event(row)?;
        match column {
            Column::Group => None,
            Column::Id => Some(row.to_string()),
            Column::Timestamp => Some(event.timestamp_text()),
            other => event.field(other).map(str::to_string),
        }
    }
}

/// In-memory [`TraceStore`]
#[derive(Clone, Default)]
pub struct MemoryTraceStore {
    /// Every row in arrival order; index == row id
    rows: Arc<RwLock<Vec<Arc<TraceEvent>>>>,

    /// Ascending row ids passing the predicate
    visible: Arc<RwLock<Vec<usize>>>,

    predicate: Arc<RwLock<Option<CellPredicate>>>,
}

impl MemoryTraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn passes(predicate: Option<&CellPredicate>, row: usize, event: &TraceEvent) -> bool {
        let Some(predicate) = predicate else {
            return true;
        };
        Column::ALL.iter().all(|&column| match column {
            Column::Group => true,
            Column::Id => predicate(column, &row.to_string()),
            Column::Timestamp => predicate(column, &event.timestamp_text()),
            other => predicate(other, event.field(other).unwrap_or_default()),
        })
    }
}

impl TraceStore for MemoryTraceStore {
    fn append_row(&self, event: TraceEvent) -> usize {
        // Lock order: rows, then predicate, then visible
        let mut rows = self.rows.write();
        let predicate = self.predicate.read().clone();
        let index = rows.len();
        let visible = Self::passes(predicate.as_ref(), index, &event);
        rows.push(Arc::new(event));
        if visible {
            self.visible.write().push(index);
        }
        index
    }

    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn visible_count(&self) -> usize {
        self.visible.read().len()
    }

    fn visible_row(&self, position: usize) -> Option<usize> {
        self.visible.read().get(position).copied()
    }

    fn visible_position(&self, row: usize) -> Option<usize> {
        self.visible.read().binary_search(&row).ok()
    }

    fn event(&self, row: usize) -> Option<Arc<TraceEvent>> {
        self.rows.read().get(row).cloned()
    }

    fn set_visibility_predicate(&self, predicate: CellPredicate) {
        *self.predicate.write() = Some(predicate);
    }

    fn apply_filters(&self) {
        // Holding the row lock keeps appends out until the new subset is in place
        let rows = self.rows.read();
        let predicate = self.predicate.read().clone();
        let visible: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(i, e)| Self::passes(predicate.as_ref(), *i, e))
            .map(|(i, _)| i)
            .collect();
        tracing::debug!(total = rows.len(), visible = visible.len(), "filters applied");
        *self.visible.write() = visible;
    }

    fn remove_all_items(&self) {
        let mut rows = self.rows.write();
        rows.clear();
        self.visible.write().clear();
    }
}
