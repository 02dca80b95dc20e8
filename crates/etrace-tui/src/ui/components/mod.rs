mod filter_bar;
mod help_overlay;
mod status_bar;

pub use filter_bar::{FilterBar, FilterEntry};
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, input_hints, table_hints};
