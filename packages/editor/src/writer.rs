//! # Round-trip writer
//!
//! Writes spritesheets back into the file they came from, replacing only the
//! lines their blocks occupied. Everything else is copied byte for byte.
//!
//! ```text
//! checksum ok? → backup → serialize → splice backup into temp → rename
//! ```
//!
//! All sheets are emitted as one blob where the first of their old blocks
//! started, so after a save they sit in a single contiguous range.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::{checksum, Document};
use crate::errors::SaveError;
use crate::options::EditorOptions;
use crate::spritesheet::LineRange;

/// Whether an in-place save may proceed over an externally modified file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Refuse with [`SaveError::ChecksumMismatch`]
    Guarded,
    /// The caller confirmed losing the external changes
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReport {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
    /// Lines the serialized spritesheets occupy
    pub blob_lines: usize,
    /// Where they now sit in the file
    pub line_range: LineRange,
}

pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn count_lines(text: &str) -> usize {
    text.lines().count()
}

/// Splice the document back into the file at `path`
pub fn save_in_place(
    doc: &mut Document,
    path: &Path,
    overwrite: Overwrite,
    options: &EditorOptions,
) -> Result<SaveReport, SaveError> {
    let io_error = |source: std::io::Error| SaveError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(expected) = doc.checksum() {
        let found = checksum(&fs::read(path).map_err(io_error)?);
        if found != expected {
            if overwrite == Overwrite::Guarded {
                return Err(SaveError::ChecksumMismatch {
                    path: path.to_path_buf(),
                    expected,
                    found,
                });
            }
            warn!(path = %path.display(), "overwriting external changes");
        }
    }

    let backup = backup_path(path, &options.backup_suffix);
    fs::copy(path, &backup).map_err(|source| SaveError::Backup {
        path: backup.clone(),
        source,
    })?;
    debug!(backup = %backup.display(), "wrote backup");

    let blob = doc.serialize_all();
    let blob_lines = count_lines(&blob);
    let ranges: Vec<LineRange> = doc.spritesheets().filter_map(|s| s.line_range).collect();

    let reader = BufReader::new(File::open(&backup).map_err(io_error)?);
    let (output, blob_start) = splice(reader, &ranges, &blob).map_err(io_error)?;

    write_atomically(path, &output).map_err(io_error)?;

    let line_range = LineRange::new(blob_start, blob_start + blob_lines.max(1) - 1);
    doc.mark_saved(path, checksum(&output), line_range);

    info!(
        path = %path.display(),
        lines = blob_lines,
        start = blob_start,
        "saved spritesheets in place"
    );

    Ok(SaveReport {
        path: path.to_path_buf(),
        backup: Some(backup),
        blob_lines,
        line_range,
    })
}

/// Write the document as the entire content of a new file
pub fn save_as_new(doc: &mut Document, path: &Path) -> Result<SaveReport, SaveError> {
    let blob = doc.serialize_all();
    let blob_lines = count_lines(&blob);

    write_atomically(path, blob.as_bytes()).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let line_range = LineRange::new(1, blob_lines.max(1));
    doc.mark_saved(path, checksum(blob.as_bytes()), line_range);

    info!(path = %path.display(), lines = blob_lines, "saved spritesheets to new file");

    Ok(SaveReport {
        path: path.to_path_buf(),
        backup: None,
        blob_lines,
        line_range,
    })
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Copy `reader` line by line, replacing every line inside `ranges` with one
/// copy of `blob`. Returns the new content and the line the blob starts on.
fn splice(
    mut reader: impl BufRead,
    ranges: &[LineRange],
    blob: &str,
) -> std::io::Result<(Vec<u8>, usize)> {
    let mut output = Vec::new();
    let mut line = Vec::new();
    let mut line_number = 0;
    let mut written_lines = 0;
    let mut blob_start = None;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_number += 1;

        if ranges.iter().any(|range| range.contains(line_number)) {
            if blob_start.is_none() {
                if line_number == 1 && line.starts_with(UTF8_BOM) {
                    output.extend_from_slice(UTF8_BOM);
                }
                blob_start = Some(written_lines + 1);
                output.extend_from_slice(blob.as_bytes());
                written_lines += count_lines(blob);
            }
            continue;
        }

        output.extend_from_slice(&line);
        written_lines += 1;
    }

    let blob_start = match blob_start {
        Some(start) => start,
        None => {
            if !output.is_empty() && !output.ends_with(b"\n") {
                output.push(b'\n');
            }
            output.extend_from_slice(blob.as_bytes());
            written_lines + 1
        }
    };

    Ok((output, blob_start))
}

/// Write to a sibling temp file, then rename it over `path`
fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&temp, contents)?;
    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(err);
    }
    Ok(())
}
