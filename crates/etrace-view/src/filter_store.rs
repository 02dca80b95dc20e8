use std::sync::Arc;

use parking_lot::Mutex;

use etrace_types::Column;

use crate::predicate::RegexPredicate;

/// Thread-safe holder of one pattern per column.
///
/// Written by the UI when a filter box changes, read by rendering and search
/// from any thread. Each column has its own lock; the compiled predicate is
/// shared out as an `Arc` so readers never hold the lock while matching.
pub struct ColumnFilterStore {
    columns: Vec<Mutex<Arc<RegexPredicate>>>,
}

impl ColumnFilterStore {
    pub fn new() -> Self {
        Self {
            columns: Column::ALL
                .iter()
                .map(|_| Mutex::new(Arc::new(RegexPredicate::empty())))
                .collect(),
        }
    }

    /// Store a new pattern, returning whether it differs from the previous one.
    ///
    /// Columns that are not filterable ignore the call and report no change.
    pub fn set_text(&self, column: Column, text: &str) -> bool {
        if !column.is_filterable() {
            return false;
        }
        let mut slot = self.columns[column.index()].lock();
        if slot.pattern() == text {
            return false;
        }
        let predicate = RegexPredicate::new(text);
        if predicate.is_invalid() {
            tracing::debug!(%column, pattern = text, "filter pattern disabled");
        }
        *slot = Arc::new(predicate);
        true
    }

    /// Current pattern text for a column
    pub fn text(&self, column: Column) -> String {
        self.columns[column.index()].lock().pattern().to_string()
    }

    /// Compiled predicate for a column
    pub fn predicate(&self, column: Column) -> Arc<RegexPredicate> {
        Arc::clone(&self.columns[column.index()].lock())
    }

    /// Snapshot of every column that has a non-empty pattern
    pub fn active(&self) -> Vec<(Column, Arc<RegexPredicate>)> {
        Column::ALL
            .iter()
            .filter_map(|&c| {
                let p = self.predicate(c);
                (!p.is_empty()).then_some((c, p))
            })
            .collect()
    }

    /// Whether any column has a pattern
    pub fn any_active(&self) -> bool {
        self.columns.iter().any(|slot| !slot.lock().is_empty())
    }

    /// Empty every pattern, returning whether anything changed
    pub fn clear_all(&self) -> bool {
        let mut changed = false;
        for column in Column::ALL {
            changed |= self.set_text(column, "");
        }
        changed
    }
}

impl Default for ColumnFilterStore {
    fn default() -> Self {
        Self::new()
    }
}
