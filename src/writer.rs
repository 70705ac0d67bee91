//! Crash-safe replacement of the output artifact.
//!
//! `commit` writes `<path>.TMP`, hard-links the current `<path>` as
//! `<path>.old` and finally renames the temp file over `<path>`. At every
//! step `<path>` is either the previous or the new complete file.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BlackholeError, Result};
use crate::fs_abstraction::FileSystem;

/// `path` with `suffix` appended to its file name
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Path of the retained previous version
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".old")
}

/// Replace `path` with `text`, keeping the previous version at `path.old`
pub fn commit(fs: &dyn FileSystem, path: &Path, text: &str) -> Result<()> {
    let tmp = with_suffix(path, ".TMP");
    let old = backup_path(path);

    fs.write(&tmp, text.as_bytes())
        .map_err(|e| BlackholeError::io(&tmp, e))?;

    if fs.exists(path) {
        debug!("Keeping previous version as {:?}", old);
        match fs.remove_file(&old) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(BlackholeError::io(&old, e));
            }
            _ => {}
        }
        fs.hard_link(path, &old)
            .map_err(|e| BlackholeError::io(&old, e))?;
    }

    fs.rename(&tmp, path)
        .map_err(|e| BlackholeError::io(path, e))?;

    Ok(())
}
