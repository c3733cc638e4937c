//! Whole-file line I/O for the catalog.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Reads every line of `path`. A missing file reads as no lines.
///
/// Lines are split on `\n` only; a `\r` before it stays part of the line so
/// that CRLF lines are written back byte-for-byte.
pub(crate) fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text.split_terminator('\n').map(str::to_string).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Replaces `path` with `lines`, each newline-terminated.
///
/// Writes a temp file in the same directory, syncs it, then renames it over
/// the target, so readers see either the old file or the new one.
pub(crate) fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> io::Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    for line in lines {
        temp.write_all(line.as_ref().as_bytes())?;
        temp.write_all(b"\n")?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Whether the file these lines came from uses CRLF terminators.
pub(crate) fn uses_crlf<S: AsRef<str>>(lines: &[S]) -> bool {
    lines.first().is_some_and(|l| l.as_ref().ends_with('\r'))
}

/// Creates an empty file at `path` (and its directory) unless one exists.
pub(crate) fn ensure_exists(path: &Path) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    fs::create_dir_all(parent_dir(path))?;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    Ok(true)
}

/// Copies `legacy` to `target` when only the former exists.
pub(crate) fn copy_if_missing(legacy: &Path, target: &Path) -> io::Result<bool> {
    if target.exists() || !legacy.exists() {
        return Ok(false);
    }
    fs::create_dir_all(parent_dir(target))?;
    fs::copy(legacy, target)?;
    Ok(true)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
