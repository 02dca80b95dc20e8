use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use parking_lot::RwLock;

/// Generation value of an annotation whose fade was never computed
pub const NEVER_COMPUTED: i64 = -1;

/// Per-row derived state.
///
/// Fields are atomics so the render path and the grouping action can update
/// them without holding the store lock.
#[derive(Debug)]
pub struct RowAnnotation {
    /// `f32` bits; 1.0 is full emphasis, toward 0.0 fades into the background
    fade: AtomicU32,

    /// Filter generation the fade was computed under
    generation: AtomicI64,

    /// 0 = no group
    group: AtomicU32,
}

impl RowAnnotation {
    fn new() -> Self {
        Self {
            fade: AtomicU32::new(1.0f32.to_bits()),
            generation: AtomicI64::new(NEVER_COMPUTED),
            group: AtomicU32::new(0),
        }
    }

    pub fn fade(&self) -> f32 {
        f32::from_bits(self.fade.load(Ordering::Acquire))
    }

    pub fn last_generation(&self) -> i64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn group(&self) -> u32 {
        self.group.load(Ordering::Acquire)
    }

    /// Cache a fade value computed under `generation`
    pub(crate) fn store_fade(&self, fade: f32, generation: i64) {
        self.fade.store(fade.to_bits(), Ordering::Release);
        self.generation.store(generation, Ordering::Release);
    }

    pub(crate) fn set_group(&self, group: u32) {
        self.group.store(group, Ordering::Release);
    }
}

/// Lazily grown arena of row annotations, indexed by row.
///
/// Creation takes the write lock and fills every slot up to the requested
/// index, so concurrent callers asking for the same row always get the same
/// annotation.
#[derive(Default)]
pub struct RowAnnotationStore {
    rows: RwLock<Vec<Arc<RowAnnotation>>>,
}

impl RowAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotation for `row`, creating it (and any missing lower rows) on first use
    pub fn get_or_create(&self, row: usize) -> Arc<RowAnnotation> {
        if let Some(existing) = self.rows.read().get(row) {
            return Arc::clone(existing);
        }

        let mut rows = self.rows.write();
        while rows.len() <= row {
            rows.push(Arc::new(RowAnnotation::new()));
        }
        Arc::clone(&rows[row])
    }

    /// Annotation for `row` if it has been created
    pub fn get(&self, row: usize) -> Option<Arc<RowAnnotation>> {
        self.rows.read().get(row).cloned()
    }

    /// Group id of `row`, 0 when ungrouped or never annotated
    pub fn group_of(&self, row: usize) -> u32 {
        self.get(row).map(|a| a.group()).unwrap_or(0)
    }

    /// Number of annotated rows
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Discard every annotation
    pub fn clear(&self) {
        self.rows.write().clear();
    }

    /// Discard every annotation while running `f` under the same lock.
    ///
    /// Used to clear the backing row store in the same critical section, so
    /// no annotation can be created for a row that is about to vanish.
    pub fn clear_with<R>(&self, f: impl FnOnce() -> R) -> R {
        let mut rows = self.rows.write();
        let result = f();
        rows.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_annotation_defaults() {
        let store = RowAnnotationStore::new();
        let a = store.get_or_create(3);
        assert_eq!(a.fade(), 1.0);
        assert_eq!(a.last_generation(), NEVER_COMPUTED);
        assert_eq!(a.group(), 0);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let store = RowAnnotationStore::new();
        let a = store.get_or_create(0);
        a.set_group(7);
        let b = store.get_or_create(0);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.group_of(0), 7);
        assert_eq!(store.group_of(99), 0);
    }

    #[test]
    fn test_concurrent_creation_yields_one_annotation() {
        let store = Arc::new(RowAnnotationStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.get_or_create(500))
            })
            .collect();
        let created: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for a in &created[1..] {
            assert!(Arc::ptr_eq(&created[0], a));
        }
        assert_eq!(store.len(), 501);
    }

    #[test]
    fn test_clear_with_runs_under_lock() {
        let store = RowAnnotationStore::new();
        store.get_or_create(10);
        let value = store.clear_with(|| 42);
        assert_eq!(value, 42);
        assert!(store.is_empty());
        assert!(store.get(0).is_none());
    }
}
