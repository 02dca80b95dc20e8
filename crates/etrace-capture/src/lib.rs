//! Row sources for etrace
//!
//! This crate provides the serial ingestion bridge, the capture session
//! that owns it, and the log-file loader.

mod bridge;
mod error;
mod logfile;
mod session;

pub use bridge::{BridgeConfig, DeviceOpener, IngestionBridge, SerialOpener, source_name, split_lines};
pub use error::{CaptureError, Result};
pub use logfile::load_log_file;
pub use session::SerialCapture;
