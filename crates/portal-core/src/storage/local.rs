use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::storage::error::StorageSystemError;
use crate::storage::provider::StorageResult;

/// Replace `path` with `contents` through a temp file in the same directory,
/// so readers see either the old file or the new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent)
        .map_err(|e| StorageSystemError::io(e, "create_dir_all", parent.to_path_buf()))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .map_err(|e| StorageSystemError::io(e, "create_temp_file", parent.to_path_buf()))?;

    temp_file
        .write_all(contents)
        .map_err(|e| StorageSystemError::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;

    temp_file
        .persist(path)
        .map_err(|e| StorageSystemError::io(e.error, "persist_temp_file", path.to_path_buf()))?;

    Ok(())
}

/// Read a file, treating a missing file as `None`.
pub fn read_optional(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageSystemError::io(e, "read_file", path.to_path_buf())),
    }
}
