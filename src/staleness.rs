//! Modification-time staleness checks.
//!
//! The only gate on work in the pipeline: an output is regenerated when it
//! is missing or older than its source. Equal timestamps count as fresh, so
//! a second run over an untouched tree does nothing.

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Decide whether `destination` must be regenerated from `source`.
///
/// Returns `Ok(true)` when the destination does not exist, otherwise
/// `mtime(source) > mtime(destination)`. Callers only pass sources they have
/// already seen on disk; any other filesystem error is returned as-is.
pub fn needs_update(source: &Path, destination: &Path) -> io::Result<bool> {
    let Some(dest_mtime) = mtime_if_exists(destination)? else {
        return Ok(true);
    };
    let source_mtime = std::fs::metadata(source)?.modified()?;
    Ok(source_mtime > dest_mtime)
}

/// True if any of `destinations` is missing or older than `source`.
///
/// Sprite exports produce a data file and a sheet image; both must be
/// current for the sprite to count as fresh.
pub fn needs_update_any<P: AsRef<Path>>(source: &Path, destinations: &[P]) -> io::Result<bool> {
    for destination in destinations {
        if needs_update(source, destination.as_ref())? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn mtime_if_exists(path: &Path) -> io::Result<Option<SystemTime>> {
    match std::fs::metadata(path) {
        Ok(meta) => meta.modified().map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
