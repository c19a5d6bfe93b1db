//! Whole-file writes that are never observed half-done.
//!
//! Content goes to a temporary file in the destination directory, which is
//! then renamed over the target. Rename within one directory is atomic on
//! the platforms we care about.
//!
//! Temporary files start out owner-only. On unix the replacement takes the
//! mode of the file it replaces, or `0644` for a new file, so the output
//! stays readable by whatever serves it.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Mode for files that do not exist yet.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// A temporary file in `dir` that will later be renamed to `dest`.
pub(crate) fn temp_file_for(dest: &Path, dir: &Path, prefix: &str) -> io::Result<NamedTempFile> {
    let tmp = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Set explicitly so the umask does not apply.
        let permissions = fs::metadata(dest)
            .map(|m| m.permissions())
            .unwrap_or_else(|_| fs::Permissions::from_mode(NEW_FILE_MODE));
        tmp.as_file().set_permissions(permissions)?;
    }
    #[cfg(not(unix))]
    let _ = dest;
    Ok(tmp)
}

/// Replace `path` with `contents`, creating parent directories as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = temp_file_for(path, dir, ".tmp-")?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
