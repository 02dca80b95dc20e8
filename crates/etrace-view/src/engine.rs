use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;

use etrace_types::{Column, FilterMode};

use crate::annotations::RowAnnotation;
use crate::filter_store::ColumnFilterStore;
use crate::predicate::RegexPredicate;
use crate::store::{CellPredicate, TraceStore};

/// Fade applied to rows failing a filter: 37% foreground, 63% background
pub const DEFAULT_FADE_LEVEL: f32 = 0.37;

/// Logical AND across columns: every non-empty pattern must pass
pub fn passes_all<F>(active: &[(Column, Arc<RegexPredicate>)], cell: F) -> bool
where
    F: Fn(Column) -> Option<String>,
{
    active
        .iter()
        .all(|(column, p)| p.passes(&cell(*column).unwrap_or_default()))
}

/// Turns column patterns into visibility and fade decisions.
///
/// Every pattern change followed by [`apply_filters`](Self::apply_filters)
/// bumps a generation counter. Fade values are cached per row together with
/// the generation they were computed under and recomputed lazily only when
/// that generation is stale, so a repaint costs O(painted rows).
pub struct FilterEngine {
    filters: Arc<ColumnFilterStore>,

    generation: AtomicI64,

    fade_level: f32,

    mode: Mutex<FilterMode>,
}

impl FilterEngine {
    pub fn new(filters: Arc<ColumnFilterStore>) -> Self {
        Self {
            filters,
            generation: AtomicI64::new(0),
            fade_level: DEFAULT_FADE_LEVEL,
            mode: Mutex::new(FilterMode::default()),
        }
    }

    /// Set the fade used for non-matching rows (clamped to 0..=1)
    pub fn with_fade_level(mut self, level: f32) -> Self {
        self.fade_level = level.clamp(0.0, 1.0);
        self
    }

    pub fn with_mode(self, mode: FilterMode) -> Self {
        *self.mode.lock() = mode;
        self
    }

    pub fn filters(&self) -> &Arc<ColumnFilterStore> {
        &self.filters
    }

    pub fn fade_level(&self) -> f32 {
        self.fade_level
    }

    /// Current filter generation; only ever increases
    pub fn generation(&self) -> i64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn mode(&self) -> FilterMode {
        *self.mode.lock()
    }

    /// Switch mode, returning whether it changed. Callers re-apply filters.
    pub fn set_mode(&self, mode: FilterMode) -> bool {
        let mut current = self.mode.lock();
        let changed = *current != mode;
        *current = mode;
        changed
    }

    /// Snapshot of the AND-combined column predicates for the store.
    ///
    /// In fade mode every row stays visible.
    pub fn visibility_predicate(&self) -> CellPredicate {
        if self.mode() == FilterMode::Fade {
            return Arc::new(|_, _| true);
        }
        let predicates: Vec<Arc<RegexPredicate>> = Column::ALL
            .iter()
            .map(|&c| self.filters.predicate(c))
            .collect();
        Arc::new(move |column, text| predicates[column.index()].passes(text))
    }

    /// Push the current patterns down to the store and invalidate cached fades
    pub fn apply_filters(&self, store: &dyn TraceStore) -> i64 {
        store.set_visibility_predicate(self.visibility_predicate());
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        store.apply_filters();
        tracing::debug!(generation, mode = self.mode().label(), "filter generation advanced");
        generation
    }

    /// Fade for a row from scratch: full emphasis when every non-empty
    /// pattern matches, the configured fade level otherwise
    pub fn compute_fade<F>(&self, cell: F) -> f32
    where
        F: Fn(Column) -> Option<String>,
    {
        if passes_all(&self.filters.active(), cell) {
            1.0
        } else {
            self.fade_level
        }
    }

    /// Cached fade for a row, recomputed only under a newer generation
    pub fn fade_for<F>(&self, annotation: &RowAnnotation, cell: F) -> f32
    where
        F: Fn(Column) -> Option<String>,
    {
        let generation = self.generation();
        if annotation.last_generation() == generation {
            return annotation.fade();
        }
        let fade = self.compute_fade(cell);
        annotation.store_fade(fade, generation);
        fade
    }
}
