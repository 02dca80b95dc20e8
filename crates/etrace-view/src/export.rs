use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use etrace_types::Column;

use crate::error::{Result, ViewError};

/// Tab-separated header line naming every column
pub fn header_line() -> String {
    Column::ALL
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join("\t")
}

/// Recognise the header line written by [`header_line`], returning the
/// column of each tab-separated field.
///
/// Only the complete header counts, so a log whose first line happens to be
/// a column name ("Thread", "Message") is still read as plain text.
pub fn parse_header(line: &str) -> Option<Vec<Column>> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() != Column::COUNT {
        return None;
    }
    fields
        .iter()
        .zip(Column::ALL.iter())
        .all(|(field, column)| Column::from_name(field) == Some(*column))
        .then(|| Column::ALL.to_vec())
}

/// Cell text with the separators this format reserves replaced by spaces
fn sanitize(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}

/// Write a header line and one line per row
pub fn write_tsv<W, F>(out: &mut W, rows: &[usize], cell: F) -> io::Result<usize>
where
    W: Write,
    F: Fn(usize, Column) -> Option<String>,
{
    writeln!(out, "{}", header_line())?;
    for &row in rows {
        let line = Column::ALL
            .iter()
            .map(|&c| sanitize(&cell(row, c).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(out, "{}", line)?;
    }
    Ok(rows.len())
}

/// Export rows to `path`, creating missing directories.
///
/// Data goes to a sibling temporary file that is renamed over `path` only
/// after everything was written, so a failure never leaves a truncated file.
pub fn export_rows<F>(path: &Path, rows: &[usize], cell: F) -> Result<usize>
where
    F: Fn(usize, Column) -> Option<String>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ViewError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp = temp_path(path);
    let written = write_file(&temp, rows, cell).and_then(|count| {
        fs::rename(&temp, path)?;
        Ok(count)
    });

    match written {
        Ok(count) => {
            tracing::info!(path = %path.display(), rows = count, "rows exported");
            Ok(count)
        }
        Err(source) => {
            let _ = fs::remove_file(&temp);
            tracing::warn!(path = %path.display(), error = %source, "export failed");
            Err(ViewError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn write_file<F>(path: &Path, rows: &[usize], cell: F) -> io::Result<usize>
where
    F: Fn(usize, Column) -> Option<String>,
{
    let mut out = BufWriter::new(File::create(path)?);
    let count = write_tsv(&mut out, rows, cell)?;
    out.flush()?;
    out.get_ref().sync_all()?;
    Ok(count)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{}.partial", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cell(row: usize, column: Column) -> Option<String> {
        match column {
            Column::Id => Some(row.to_string()),
            Column::Message => Some(format!("line\t{}", row)),
            _ => None,
        }
    }

    #[test]
    fn test_header_round_trip() {
        assert_eq!(parse_header(&header_line()), Some(Column::ALL.to_vec()));
        assert_eq!(parse_header(&format!("{}\r\n", header_line())), Some(Column::ALL.to_vec()));
        assert_eq!(parse_header("just a log line"), None);
    }

    #[test]
    fn test_partial_header_is_not_a_header() {
        assert_eq!(parse_header("Thread"), None);
        assert_eq!(parse_header("Message"), None);
        assert_eq!(parse_header("ID\tMessage"), None);

        // every name present but out of order
        let mut names: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        names.swap(1, 2);
        assert_eq!(parse_header(&names.join("\t")), None);
    }

    #[test]
    fn test_write_tsv_sanitizes_cells() {
        let mut out = Vec::new();
        let count = write_tsv(&mut out, &[3], cell).unwrap();
        assert_eq!(count, 1);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields.len(), Column::COUNT);
        assert_eq!(fields[Column::Id.index()], "3");
        assert_eq!(fields[Column::Message.index()], "line 3");
    }

    #[test]
    fn test_export_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.tsv");
        let count = export_rows(&path, &[0, 1], cell).unwrap();
        assert_eq!(count, 2);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_export_failure_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        // a directory where the file should go makes the rename fail
        let path = dir.path().join("taken");
        fs::create_dir_all(path.join("inner")).unwrap();
        let result = export_rows(&path, &[0], cell);
        assert!(matches!(result, Err(ViewError::Write { .. })));
        assert!(!temp_path(&path).exists());
    }
}
