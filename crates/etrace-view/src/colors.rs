use std::collections::HashMap;

use parking_lot::Mutex;

use etrace_types::{ColorPair, Column, Rgb};

/// Fixed highlight palette, indexed by first-seen ordinal
pub const PALETTE: [Rgb; 11] = [
    Rgb::new(0xFF, 0x00, 0x00),
    Rgb::new(0x00, 0xFF, 0x00),
    Rgb::new(0x00, 0x00, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x00),
    Rgb::new(0xFF, 0x00, 0xFF),
    Rgb::new(0x00, 0xFF, 0xFF),
    Rgb::new(0xFF, 0xFF, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x88),
    Rgb::new(0xFF, 0x88, 0x88),
    Rgb::new(0x88, 0xFF, 0x88),
    Rgb::new(0x88, 0x88, 0xFF),
];

/// Dark or near-black backgrounds get white text
pub fn use_white_text(c: Rgb) -> bool {
    c.max_channel() < 0x80 || (c.r < 0x10 && c.g < 0x10)
}

/// Background plus contrasting foreground
pub fn contrast_pair(background: Rgb) -> ColorPair {
    let foreground = if use_white_text(background) {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    };
    ColorPair::new(background, foreground)
}

/// Palette color for an ordinal
pub fn palette_color(ordinal: usize) -> Rgb {
    PALETTE[ordinal % PALETTE.len()]
}

/// Color bookkeeping for one distinct value in one column
#[derive(Clone, Debug)]
pub struct ColorEntry {
    /// Occurrences seen so far; only used to detect the first one
    pub count: u64,

    /// Assignment order, used as palette index
    pub ordinal: usize,

    /// Unset until the value is first painted with emphasis
    pub colors: Option<ColorPair>,

    /// Set by an explicit user override; never replaced by the palette
    pub custom: bool,
}

/// Distinct values of one column
#[derive(Default)]
struct ColorTable {
    entries: HashMap<String, ColorEntry>,
}

impl ColorTable {
    fn assign_or_get(&mut self, key: &str) -> &mut ColorEntry {
        let next = self.entries.len();
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| ColorEntry {
                count: 0,
                ordinal: next,
                colors: None,
                custom: false,
            });
        entry.count += 1;
        entry
    }

    fn materialize(entry: &mut ColorEntry) -> (ColorPair, bool) {
        match entry.colors {
            Some(pair) => (pair, false),
            None => {
                let pair = contrast_pair(palette_color(entry.ordinal));
                entry.colors = Some(pair);
                (pair, true)
            }
        }
    }
}

/// One color table per column.
///
/// Entries accumulate for the lifetime of the trace and are dropped only by
/// [`reset`](Self::reset). Tables are locked individually because values are
/// registered from the sync path while the render path materializes them.
pub struct ColorAssigner {
    tables: Vec<Mutex<ColorTable>>,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self {
            tables: Column::ALL
                .iter()
                .map(|_| Mutex::new(ColorTable::default()))
                .collect(),
        }
    }

    /// Record one occurrence of `key`, allocating its ordinal on first sight
    pub fn assign_or_get(&self, column: Column, key: &str) -> ColorEntry {
        self.tables[column.index()]
            .lock()
            .assign_or_get(key)
            .clone()
    }

    /// Look up an entry without counting an occurrence
    pub fn get(&self, column: Column, key: &str) -> Option<ColorEntry> {
        self.tables[column.index()].lock().entries.get(key).cloned()
    }

    /// Colors for `key`, computing them from the palette if not yet set.
    ///
    /// A key that was never registered is registered first.
    pub fn materialize(&self, column: Column, key: &str) -> ColorPair {
        let mut table = self.tables[column.index()].lock();
        if let Some(entry) = table.entries.get_mut(key) {
            return ColorTable::materialize(entry).0;
        }
        let entry = table.assign_or_get(key);
        ColorTable::materialize(entry).0
    }

    /// Materialize every entry of a column, returning whether any was new
    pub fn materialize_all(&self, column: Column) -> bool {
        let mut table = self.tables[column.index()].lock();
        let mut any_new = false;
        for entry in table.entries.values_mut() {
            any_new |= ColorTable::materialize(entry).1;
        }
        any_new
    }

    /// Permanently replace the colors of `key` with a user-chosen background
    pub fn override_color(&self, column: Column, key: &str, background: Rgb) -> ColorPair {
        let mut table = self.tables[column.index()].lock();
        if !table.entries.contains_key(key) {
            table.assign_or_get(key);
        }
        let pair = contrast_pair(background);
        if let Some(entry) = table.entries.get_mut(key) {
            entry.colors = Some(pair);
            entry.custom = true;
        }
        pair
    }

    /// Number of distinct values seen in a column
    pub fn distinct_count(&self, column: Column) -> usize {
        self.tables[column.index()].lock().entries.len()
    }

    /// Forget every entry in every column
    pub fn reset(&self) {
        for table in &self.tables {
            table.lock().entries.clear();
        }
    }
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new()
    }
}
