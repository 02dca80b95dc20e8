use std::path::Path;

use chrono::{DateTime, Local, NaiveTime, TimeZone};

use etrace_types::{Column, TraceEvent};
use etrace_view::{RowAnnotationStore, TraceStore, parse_header};

use crate::error::{CaptureError, Result};

/// Load a text file into the store, returning the number of rows added.
///
/// A file starting with an exported header line is mapped back column by
/// column. Anything else becomes one MESSAGE row per non-empty line, tagged
/// with the file name.
pub fn load_log_file(path: &Path, store: &dyn TraceStore, annotations: &RowAnnotationStore) -> Result<usize> {
    let bytes = std::fs::read(path).map_err(|source| CaptureError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let loaded_at = Local::now();

    let mut lines = text.lines();
    let header = lines.clone().next().and_then(parse_header);
    if header.is_some() {
        lines.next();
    }

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut added = 0;
    for line in lines {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            continue;
        }
        let event = match &header {
            Some(columns) => from_exported(columns, trimmed, loaded_at),
            None => TraceEvent::message(loaded_at, source.as_str(), trimmed.trim_end()),
        };
        let row = store.append_row(event);
        annotations.get_or_create(row);
        added += 1;
    }

    tracing::info!(path = %path.display(), rows = added, exported = header.is_some(), "log file loaded");
    Ok(added)
}

fn from_exported(columns: &[Column], line: &str, loaded_at: DateTime<Local>) -> TraceEvent {
    let mut event = TraceEvent::message(loaded_at, "", "");
    for (&column, value) in columns.iter().zip(line.split('\t')) {
        match column {
            Column::Timestamp => {
                if let Some(ts) = parse_time_of_day(value, loaded_at) {
                    event.timestamp = ts;
                }
            }
            other => {
                if let Some(field) = event.field_mut(other) {
                    *field = value.to_string();
                }
            }
        }
    }
    event
}

/// Exported timestamps carry only the time of day; place them on the load date
fn parse_time_of_day(text: &str, on: DateTime<Local>) -> Option<DateTime<Local>> {
    let time = NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&on.date_naive().and_time(time))
        .earliest()
}
