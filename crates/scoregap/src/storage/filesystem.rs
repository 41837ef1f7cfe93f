use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Sibling temp path: `dir/.name.tmp`. Same directory, so the final rename
/// never crosses a filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scoregap".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Replaces `path` with `content` so readers see either the old or the new
/// file, never a torn one: write temp, fsync, rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    ensure_parent(path)?;
    let tmp = temp_path(path);

    let write = |tmp: &Path| -> std::io::Result<()> {
        let mut file = File::create(tmp)?;
        file.write_all(content)?;
        file.sync_all()
    };
    if let Err(e) = write(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(StorageError::WriteFile {
            path: tmp,
            source: e,
        });
    }

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        StorageError::Replace {
            from: tmp.clone(),
            to: path.to_path_buf(),
            source: e,
        }
    })
}

/// Appends `content` and syncs it. Returns the new file length.
pub fn append(path: &Path, content: &[u8]) -> Result<u64, StorageError> {
    let write_err = |e: std::io::Error| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(content).map_err(write_err)?;
    file.sync_data().map_err(write_err)?;
    let len = file.metadata().map_err(write_err)?.len();
    Ok(len)
}

/// Cuts `path` back to `len` bytes. Fails if the file is shorter than that.
pub fn truncate_to(path: &Path, len: u64) -> Result<(), StorageError> {
    let actual = file_len(path)?;
    if actual < len {
        return Err(StorageError::TooShort {
            path: path.to_path_buf(),
            expected: len,
            actual,
        });
    }
    if actual == len {
        return Ok(());
    }

    let write_err = |e: std::io::Error| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(write_err)?;
    file.set_len(len).map_err(write_err)?;
    file.sync_all().map_err(write_err)
}

/// Length in bytes; a missing file counts as empty.
pub fn file_len(path: &Path) -> Result<u64, StorageError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(StorageError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Removes `path`; a missing file is not an error.
pub fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::RemoveFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
