//! TUI components for etrace
//!
//! This crate provides the terminal user interface for etrace,
//! including UI state, keybindings, event handling, and the trace table.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, InputMode, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{FilterBar, FilterEntry, HelpOverlay, StatusBar};
pub use ui::screens::TraceTableScreen;
pub use ui::{Layout, Theme};
