use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use etrace_types::Column;

use crate::annotations::RowAnnotationStore;
use crate::colors::ColorAssigner;

/// Assigns user-defined group ids to row selections.
///
/// Ids start at 1, are never reused within a trace, and are reset only when
/// the trace is cleared.
pub struct GroupManager {
    annotations: Arc<RowAnnotationStore>,
    colors: Arc<ColorAssigner>,
    next_id: AtomicU32,
}

impl GroupManager {
    pub fn new(annotations: Arc<RowAnnotationStore>, colors: Arc<ColorAssigner>) -> Self {
        Self {
            annotations,
            colors,
            next_id: AtomicU32::new(1),
        }
    }

    /// Put every row of `rows` into one group and return its id.
    ///
    /// If any selected row already belongs to a group, the first such group
    /// (in selection order) absorbs the whole selection; otherwise a fresh id
    /// is allocated. Returns `None` for an empty selection.
    pub fn group_selection(&self, rows: &[usize]) -> Option<u32> {
        if rows.is_empty() {
            return None;
        }

        let existing = rows
            .iter()
            .map(|&row| self.annotations.group_of(row))
            .find(|&id| id != 0);

        let id = match existing {
            Some(id) => id,
            None => self.next_id.fetch_add(1, Ordering::AcqRel),
        };

        for &row in rows {
            self.annotations.get_or_create(row).set_group(id);
        }

        let key = id.to_string();
        self.colors.assign_or_get(Column::Group, &key);
        self.colors.materialize(Column::Group, &key);

        tracing::debug!(group = id, rows = rows.len(), merged = existing.is_some(), "rows grouped");
        Some(id)
    }

    /// Id the next new group will receive
    #[cfg(test)]
    fn peek_next_id(&self) -> u32 {
        self.next_id.load(Ordering::Acquire)
    }

    /// Restart id allocation; only valid together with clearing all annotations
    pub fn reset(&self) {
        self.next_id.store(1, Ordering::Release);
    }
}
