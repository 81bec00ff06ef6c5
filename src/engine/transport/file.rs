//! Local filesystem transport.
//!
//! Sources that resolve to a path are copied rather than linked, so the
//! destination never aliases files the caller does not own.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::engine::Metadata;
use crate::engine::error::EngineError;
use crate::engine::source::Transport;

/// Copies a local file or directory tree into `into_dir`.
pub(super) async fn fetch(location: &str, into_dir: &Path) -> Result<Metadata, EngineError> {
    let source = PathBuf::from(location);
    let meta = fs::metadata(&source)
        .await
        .map_err(|e| EngineError::io(&source, e))?;

    if meta.is_dir() {
        copy_dir(&source, into_dir).await?;
        return Ok(Metadata {
            transport: Transport::File,
            artifact: None,
            revision: None,
            bytes: None,
        });
    }

    let name = match source.file_name() {
        Some(name) => PathBuf::from(name),
        None => PathBuf::from("artifact"),
    };
    let dest = into_dir.join(&name);
    fs::copy(&source, &dest)
        .await
        .map_err(|e| EngineError::io(&dest, e))?;

    Ok(Metadata {
        transport: Transport::File,
        artifact: Some(name),
        revision: None,
        bytes: Some(meta.len()),
    })
}

/// Recursively copies the contents of `src` into `dest`, creating `dest` if
/// needed.
pub(super) async fn copy_dir(src: &Path, dest: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(dest)
        .await
        .map_err(|e| EngineError::io(dest, e))?;

    let mut entries = fs::read_dir(src)
        .await
        .map_err(|e| EngineError::io(src, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| EngineError::io(src, e))?
    {
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| EngineError::io(&src_path, e))?;

        if file_type.is_dir() {
            // Recursion through a boxed future keeps the async fn sized.
            Box::pin(copy_dir(&src_path, &dest_path)).await?;
        } else {
            fs::copy(&src_path, &dest_path)
                .await
                .map_err(|e| EngineError::io(&dest_path, e))?;
        }
    }
    Ok(())
}

/// Moves every entry of `from` into `to`, falling back to copy-and-delete
/// when a rename crosses filesystems.
pub(crate) async fn move_contents(from: &Path, to: &Path) -> Result<(), EngineError> {
    let mut entries = fs::read_dir(from)
        .await
        .map_err(|e| EngineError::io(from, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| EngineError::io(from, e))?
    {
        let src_path = entry.path();
        let dest_path = to.join(entry.file_name());

        if fs::rename(&src_path, &dest_path).await.is_ok() {
            continue;
        }

        let file_type = entry
            .file_type()
            .await
            .map_err(|e| EngineError::io(&src_path, e))?;
        if file_type.is_dir() {
            copy_dir(&src_path, &dest_path).await?;
            fs::remove_dir_all(&src_path)
                .await
                .map_err(|e| EngineError::io(&src_path, e))?;
        } else {
            fs::copy(&src_path, &dest_path)
                .await
                .map_err(|e| EngineError::io(&dest_path, e))?;
            fs::remove_file(&src_path)
                .await
                .map_err(|e| EngineError::io(&src_path, e))?;
        }
    }
    Ok(())
}
