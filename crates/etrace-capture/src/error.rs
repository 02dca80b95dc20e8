use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read log file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("capture of {device} is already running")]
    AlreadyRunning { device: String },
}

pub type Result<T> = std::result::Result<T, CaptureError>;
