//! Atomic single-target file primitives.
//!
//! Write path: temp file beside the final path, flushed to disk, then
//! renamed over the final path. Readers of the final path see either the
//! old content or the new content, never a prefix of it. A crash leaves at
//! most a stray `.tmp` file.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Suffix used for in-flight temp files.
pub const TEMP_SUFFIX: &str = "tmp";

fn temp_path_for(final_path: &Path) -> io::Result<PathBuf> {
    let dir = final_path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", final_path.display()),
        )
    })?;
    let name = final_path
        .file_name()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", final_path.display()),
            )
        })?
        .to_string_lossy();
    Ok(dir.join(format!(
        ".{name}.{}.{TEMP_SUFFIX}",
        Uuid::new_v4().simple()
    )))
}

async fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(())
}

/// Write `content` to `final_path` atomically, creating parent directories.
pub async fn write_atomic(final_path: &Path, content: &[u8]) -> io::Result<()> {
    let temp = temp_path_for(final_path)?;
    if let Some(dir) = final_path.parent() {
        fs::create_dir_all(dir).await?;
    }

    if let Err(e) = write_synced(&temp, content).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }

    // Windows refuses to rename over an existing file.
    #[cfg(windows)]
    if let Err(e) = remove_if_present(final_path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp, final_path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }
    Ok(())
}

/// Delete a file; returns whether it existed. Absence is not an error.
pub async fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn file_exists(path: &Path) -> io::Result<bool> {
    fs::try_exists(path).await
}
