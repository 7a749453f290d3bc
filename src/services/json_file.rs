use crate::error::AppResult;
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

// Missing and unparseable files both come back as `None`.
pub async fn read_document<T: DeserializeOwned>(path: &Path) -> AppResult<Option<T>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} does not exist yet", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable document {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Rewrites the whole document. The new content lands in a sibling file first
/// and is renamed over the old one, so readers never observe a partial write.
pub async fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    let body = serde_json::to_vec_pretty(value)?;
    let tmp = tmp_path(path);

    tokio::fs::write(&tmp, &body).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    tracing::debug!("Wrote {} ({} bytes)", path.display(), body.len());
    Ok(())
}

pub async fn ensure_document<T: Serialize + ?Sized>(path: &Path, initial: &T) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    if !tokio::fs::try_exists(path).await? {
        write_document(path, initial).await?;
        tracing::info!("Initialized {}", path.display());
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
