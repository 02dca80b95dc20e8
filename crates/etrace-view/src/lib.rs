//! Filtering and highlighting engine for etrace
//!
//! This crate owns everything between the trace store and the screen:
//! per-column regex filters, fade and visibility decisions, value colors,
//! row groups, match navigation and export.

mod annotations;
mod colors;
mod engine;
mod error;
mod export;
mod filter_store;
mod groups;
mod navigator;
mod predicate;
mod store;
mod view;

pub use annotations::{NEVER_COMPUTED, RowAnnotation, RowAnnotationStore};
pub use colors::{ColorAssigner, ColorEntry, PALETTE, contrast_pair, palette_color, use_white_text};
pub use engine::{DEFAULT_FADE_LEVEL, FilterEngine, passes_all};
pub use error::{Result, ViewError};
pub use export::{export_rows, header_line, parse_header, write_tsv};
pub use filter_store::ColumnFilterStore;
pub use groups::GroupManager;
pub use navigator::{MatchNavigator, RowSource, SearchDirection, SearchOutcome, hits_any};
pub use predicate::RegexPredicate;
pub use store::{CellPredicate, MemoryTraceStore, TraceStore};
pub use view::TraceView;

// Re-export types used in our public API
pub use etrace_types::{ColorPair, Column, FilterMode, Rgb, TraceEvent};
