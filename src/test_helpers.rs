//! Shared test utilities: file creation and mtime control.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let src = write_file(&tmp.path().join("maps/world/a.tmx"), "<map/>");
//! set_mtime(&src, SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Write `contents` to `path`, creating parent directories. Returns the path.
pub fn write_file(path: &Path, contents: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}

/// Create an empty file (and its parents) if it does not exist.
pub fn touch(path: &Path) -> PathBuf {
    if !path.exists() {
        write_file(path, "");
    }
    path.to_path_buf()
}

/// Set the modification time of an existing file.
pub fn set_mtime(path: &Path, time: SystemTime) {
    let file = fs::File::options()
        .write(true)
        .open(path)
        .unwrap_or_else(|e| panic!("open {} for mtime: {e}", path.display()));
    file.set_modified(time).unwrap();
}
