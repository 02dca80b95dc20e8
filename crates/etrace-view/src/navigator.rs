use std::sync::Arc;

use etrace_types::Column;

use crate::filter_store::ColumnFilterStore;
use crate::predicate::RegexPredicate;

/// Rows the navigator walks, addressed by dense position
pub trait RowSource {
    fn row_count(&self) -> usize;
    fn cell_text(&self, row: usize, column: Column) -> Option<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Result of one circular scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    /// First matching position, if any
    pub hit: Option<usize>,

    /// Rows tested before stopping
    pub probes: usize,
}

/// Logical OR across columns: any non-empty pattern hitting is enough.
///
/// With no pattern at all every row matches. This is deliberately the
/// opposite combinator from visibility filtering.
pub fn hits_any<F>(active: &[(Column, Arc<RegexPredicate>)], cell: F) -> bool
where
    F: Fn(Column) -> Option<String>,
{
    if active.is_empty() {
        return true;
    }
    active
        .iter()
        .any(|(column, p)| p.hits(&cell(*column).unwrap_or_default()))
}

/// Wrap-around next/previous search over rows hitting the column patterns
pub struct MatchNavigator {
    filters: Arc<ColumnFilterStore>,
}

impl MatchNavigator {
    pub fn new(filters: Arc<ColumnFilterStore>) -> Self {
        Self { filters }
    }

    /// First hit after `from` (or from the top when `None`), wrapping around
    pub fn next<R: RowSource + ?Sized>(&self, rows: &R, from: Option<usize>) -> Option<usize> {
        self.search(rows, from, SearchDirection::Forward).hit
    }

    /// First hit before `from` (or from the bottom when `None`), wrapping around
    pub fn previous<R: RowSource + ?Sized>(&self, rows: &R, from: Option<usize>) -> Option<usize> {
        self.search(rows, from, SearchDirection::Backward).hit
    }

    /// Scan at most one full cycle of rows starting just past `from`
    pub fn search<R: RowSource + ?Sized>(
        &self,
        rows: &R,
        from: Option<usize>,
        direction: SearchDirection,
    ) -> SearchOutcome {
        let n = rows.row_count();
        if n == 0 {
            return SearchOutcome { hit: None, probes: 0 };
        }

        // A stale position (rows cleared since) restarts from the edge
        let from = from.filter(|&f| f < n);
        let start = match (direction, from) {
            (SearchDirection::Forward, Some(f)) => (f + 1) % n,
            (SearchDirection::Forward, None) => 0,
            (SearchDirection::Backward, Some(f)) => (f + n - 1) % n,
            (SearchDirection::Backward, None) => n - 1,
        };

        let active = self.filters.active();
        for k in 0..n {
            let position = match direction {
                SearchDirection::Forward => (start + k) % n,
                SearchDirection::Backward => (start + n - k) % n,
            };
            if hits_any(&active, |c| rows.cell_text(position, c)) {
                return SearchOutcome {
                    hit: Some(position),
                    probes: k + 1,
                };
            }
        }

        tracing::debug!(rows = n, ?direction, "no matching row");
        SearchOutcome { hit: None, probes: n }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rows with a PROCESS and MESSAGE value each
    struct Rows(Vec<(&'static str, &'static str)>);

    impl RowSource for Rows {
        fn row_count(&self) -> usize {
            self.0.len()
        }

        fn cell_text(&self, row: usize, column: Column) -> Option<String> {
            let (process, message) = self.0.get(row)?;
            match column {
                Column::Process => Some(process.to_string()),
                Column::Message => Some(message.to_string()),
                _ => None,
            }
        }
    }

    fn navigator() -> MatchNavigator {
        MatchNavigator::new(Arc::new(ColumnFilterStore::new()))
    }

    #[test]
    fn test_without_patterns_every_row_matches() {
        let nav = navigator();
        let rows = Rows(vec![("a", ""); 4]);
        for from in 0..4 {
            assert_eq!(nav.next(&rows, Some(from)), Some((from + 1) % 4));
        }
        assert_eq!(nav.next(&rows, None), Some(0));
        assert_eq!(nav.previous(&rows, Some(0)), Some(3));
        assert_eq!(nav.previous(&rows, None), Some(3));
    }

    #[test]
    fn test_no_match_after_full_cycle() {
        let nav = navigator();
        nav.filters.set_text(Column::Message, "zzz");
        let rows = Rows(vec![("a", "x"), ("b", "y"), ("c", "z")]);
        let outcome = nav.search(&rows, Some(1), SearchDirection::Forward);
        assert_eq!(outcome, SearchOutcome { hit: None, probes: 3 });
    }

    #[test]
    fn test_wraps_in_both_directions() {
        let nav = navigator();
        nav.filters.set_text(Column::Message, "hit");
        let rows = Rows(vec![("", "hit"), ("", "miss"), ("", "miss"), ("", "HIT")]);
        assert_eq!(nav.next(&rows, Some(3)), Some(0));
        assert_eq!(nav.next(&rows, Some(0)), Some(3));
        assert_eq!(nav.previous(&rows, Some(0)), Some(3));
        assert_eq!(nav.previous(&rows, Some(3)), Some(0));
    }

    #[test]
    fn test_any_column_hit_is_enough() {
        let nav = navigator();
        nav.filters.set_text(Column::Process, "^7$");
        nav.filters.set_text(Column::Message, "boot");
        let rows = Rows(vec![("1", "idle"), ("7", "idle"), ("2", "boot done")]);
        assert_eq!(nav.next(&rows, None), Some(1));
        assert_eq!(nav.next(&rows, Some(1)), Some(2));
        assert_eq!(nav.next(&rows, Some(2)), Some(1));
    }

    #[test]
    fn test_invalid_pattern_hits_nothing() {
        let nav = navigator();
        nav.filters.set_text(Column::Message, r"\1");
        let rows = Rows(vec![("", "a"), ("", "b")]);
        assert_eq!(nav.next(&rows, None), None);
    }

    #[test]
    fn test_empty_and_stale_positions() {
        let nav = navigator();
        assert_eq!(nav.search(&Rows(vec![]), Some(3), SearchDirection::Forward).probes, 0);
        let rows = Rows(vec![("", ""), ("", "")]);
        assert_eq!(nav.next(&rows, Some(10)), Some(0));
    }
}
