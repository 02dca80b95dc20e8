//! Shared types for etrace
//!
//! This crate contains the value types passed between the view engine,
//! the capture sources and the terminal front end.

use chrono::{DateTime, Local};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

// ============================================================================
// Colors
// ============================================================================

/// A 24-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Largest of the three channels
    pub fn max_channel(&self) -> u8 {
        self.r.max(self.g).max(self.b)
    }

    /// Blend from `self` toward `other`; `t = 0.0` is `self`, `t = 1.0` is `other`
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| ((1.0 - t) * a as f32 + t * b as f32).round() as u8;
        Rgb::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }

    /// Parse `#RRGGBB` or `RRGGBB`
    pub fn parse_hex(s: &str) -> Option<Rgb> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Background/foreground pair used to paint one cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorPair {
    pub background: Rgb,
    pub foreground: Rgb,
}

impl ColorPair {
    pub const fn new(background: Rgb, foreground: Rgb) -> Self {
        Self {
            background,
            foreground,
        }
    }

    /// Black on white
    pub const fn plain() -> Self {
        Self::new(Rgb::WHITE, Rgb::BLACK)
    }

    /// Exchange background and foreground
    pub fn swapped(self) -> Self {
        Self::new(self.foreground, self.background)
    }
}

impl Default for ColorPair {
    fn default() -> Self {
        Self::plain()
    }
}

// ============================================================================
// Columns
// ============================================================================

/// The fixed set of columns displayed for every trace row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Group,
    Id,
    Log,
    Process,
    Thread,
    File,
    Function,
    Timestamp,
    Message,
}

impl Column {
    /// All columns in display order
    pub const ALL: [Column; 9] = [
        Column::Group,
        Column::Id,
        Column::Log,
        Column::Process,
        Column::Thread,
        Column::File,
        Column::Function,
        Column::Timestamp,
        Column::Message,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Header text
    pub fn name(&self) -> &'static str {
        match self {
            Self::Group => "GROUP",
            Self::Id => "ID",
            Self::Log => "LOG",
            Self::Process => "PROCESS",
            Self::Thread => "THREAD",
            Self::File => "FILE",
            Self::Function => "FUNCTION",
            Self::Timestamp => "TIMESTAMP",
            Self::Message => "MESSAGE",
        }
    }

    /// Position in display order
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether the user can type a filter pattern for this column.
    /// Group membership is assigned, not filtered.
    pub fn is_filterable(&self) -> bool {
        !matches!(self, Self::Group)
    }

    /// Relative width hint used by the table layout
    pub fn width_weight(&self) -> u16 {
        match self {
            Self::Group | Self::Id | Self::Process | Self::Thread => 1,
            Self::Log | Self::File | Self::Function | Self::Timestamp => 2,
            Self::Message => 6,
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Rows
// ============================================================================

/// How active column filters affect rows that do not satisfy them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Rows failing any filter are not enumerated
    #[default]
    Hide,
    /// Every row is enumerated; rows failing a filter are faded
    Fade,
}

impl FilterMode {
    pub fn toggled(&self) -> Self {
        match self {
            Self::Hide => Self::Fade,
            Self::Fade => Self::Hide,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Fade => "fade",
        }
    }
}

/// One trace event as delivered by a source
#[derive(Clone, Debug)]
pub struct TraceEvent {
    /// Wall-clock time the event was produced or received
    pub timestamp: DateTime<Local>,

    /// Source module or device (LOG column)
    pub module: String,

    pub process_id: String,
    pub thread_id: String,
    pub source_file: String,
    pub function: String,
    pub message: String,
}

impl TraceEvent {
    /// A message-only event, the shape produced by line-oriented sources
    pub fn message(timestamp: DateTime<Local>, module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            module: module.into(),
            process_id: String::new(),
            thread_id: String::new(),
            source_file: String::new(),
            function: String::new(),
            message: message.into(),
        }
    }

    /// Text of a column owned by the event itself.
    ///
    /// `Id` and `Group` are positional/assigned and live outside the event,
    /// so they yield `None`.
    pub fn field(&self, column: Column) -> Option<&str> {
        match column {
            Column::Log => Some(&self.module),
            Column::Process => Some(&self.process_id),
            Column::Thread => Some(&self.thread_id),
            Column::File => Some(&self.source_file),
            Column::Function => Some(&self.function),
            Column::Message => Some(&self.message),
            Column::Id | Column::Group | Column::Timestamp => None,
        }
    }

    /// Mutable access to an owned text column
    pub fn field_mut(&mut self, column: Column) -> Option<&mut String> {
        match column {
            Column::Log => Some(&mut self.module),
            Column::Process => Some(&mut self.process_id),
            Column::Thread => Some(&mut self.thread_id),
            Column::File => Some(&mut self.source_file),
            Column::Function => Some(&mut self.function),
            Column::Message => Some(&mut self.message),
            Column::Id | Column::Group | Column::Timestamp => None,
        }
    }

    /// Display form of the timestamp
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format("%H:%M:%S%.3f").to_string()
    }
}
