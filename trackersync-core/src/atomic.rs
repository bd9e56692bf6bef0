//! Whole-file writes that never leave a truncated target behind.
//!
//! Write flow: `<name>.tmp` sibling → `chmod 0600` → `rename`. On failure the
//! `.tmp` file is removed and the target keeps its previous content (or stays
//! absent).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Replace `path` with `contents`, readable by the owner only.
pub fn write_private(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    let tmp_path = tmp_sibling(path);
    let written = fs::write(&tmp_path, contents)
        .and_then(|()| set_file_permissions(&tmp_path))
        .and_then(|()| fs::rename(&tmp_path, path));

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
