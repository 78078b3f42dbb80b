//! Physical file moves
//!
//! `rename(2)` first; across filesystems fall back to copy + remove.

use crate::error::{GraphplotError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Create a directory tree if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| GraphplotError::Relocate {
        from: dir.to_path_buf(),
        to: dir.to_path_buf(),
        source,
    })
}

/// Move `from` into `to_dir` as `new_name`, replacing any existing file.
pub fn move_file(from: &Path, to_dir: &Path, new_name: &str) -> Result<PathBuf> {
    let to = to_dir.join(new_name);
    let wrap = |source: io::Error| GraphplotError::Relocate {
        from: from.to_path_buf(),
        to: to.clone(),
        source,
    };

    match fs::rename(from, &to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(wrap(e)),
        Err(e) => {
            debug!("rename {} failed ({}), copying instead", from.display(), e);
            fs::copy(from, &to).map_err(wrap)?;
            fs::remove_file(from).map_err(wrap)?;
        }
    }
    debug!("Moved {} -> {}", from.display(), to.display());
    Ok(to)
}

/// Copy `from` into `to_dir` as `new_name`, replacing any existing file.
pub fn copy_file(from: &Path, to_dir: &Path, new_name: &str) -> Result<PathBuf> {
    let to = to_dir.join(new_name);
    fs::copy(from, &to).map_err(|source| GraphplotError::Relocate {
        from: from.to_path_buf(),
        to: to.clone(),
        source,
    })?;
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn move_renames_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        ensure_dir(&src).unwrap();
        ensure_dir(&dst).unwrap();
        fs::write(src.join("a.tif"), b"new").unwrap();
        fs::write(dst.join("b.tif"), b"old").unwrap();

        let moved = move_file(&src.join("a.tif"), &dst, "b.tif").unwrap();
        assert_eq!(moved, dst.join("b.tif"));
        assert!(!src.join("a.tif").exists());
        assert_eq!(fs::read(&moved).unwrap(), b"new");
    }

    #[test]
    fn moving_a_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = move_file(&temp.path().join("gone"), temp.path(), "x").unwrap_err();
        assert!(matches!(err, GraphplotError::Relocate { .. }));
    }

    #[test]
    fn copy_keeps_source() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), b"1").unwrap();
        let out = temp.path().join("out");
        ensure_dir(&out).unwrap();
        copy_file(&temp.path().join("a"), &out, "b").unwrap();
        assert!(temp.path().join("a").exists());
        assert!(out.join("b").exists());
    }
}
