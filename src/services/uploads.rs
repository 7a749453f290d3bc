use crate::error::{AppError, AppResult};
use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};

pub const UPLOADS_ROUTE: &str = "/uploads";

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ValidatedImage {
    // Includes the leading dot.
    pub extension: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn validate(&self, file: IncomingFile) -> AppResult<ValidatedImage> {
        if file.bytes.len() > self.max_bytes {
            return Err(AppError::UploadRejected(format!(
                "file exceeds {} bytes",
                self.max_bytes
            )));
        }

        let extension = Path::new(&file.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| ALLOWED_IMAGE_TYPES.contains(&e.to_ascii_lowercase().as_str()))
            .ok_or_else(|| AppError::UploadRejected("Only image files are allowed!".into()))?
            .to_string();

        let mime_ok = file
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .and_then(|ct| ct.trim().to_ascii_lowercase().strip_prefix("image/").map(str::to_owned))
            .map(|subtype| ALLOWED_IMAGE_TYPES.contains(&subtype.as_str()))
            .unwrap_or(false);
        if !mime_ok {
            return Err(AppError::UploadRejected(
                "Only image files are allowed!".into(),
            ));
        }

        Ok(ValidatedImage {
            extension: format!(".{}", extension),
            bytes: file.bytes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
}

impl UploadStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn init(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub async fn persist(&self, image: &ValidatedImage) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = generate_file_name(&image.extension);
        tokio::fs::write(self.dir.join(&file_name), &image.bytes).await?;

        tracing::info!(file = %file_name, bytes = image.bytes.len(), "Stored uploaded image");
        Ok(format!("{}/{}", UPLOADS_ROUTE, file_name))
    }

    // Paths outside the uploads route are left alone; failures are only logged.
    pub async fn remove(&self, public_path: &str) -> bool {
        let Some(path) = self.resolve(public_path) else {
            return false;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Removed replaced upload {}", path.display());
                true
            }
            Err(e) => {
                tracing::warn!("Error deleting old upload {}: {}", path.display(), e);
                false
            }
        }
    }

    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let rest = public_path.strip_prefix(UPLOADS_ROUTE)?.strip_prefix('/')?;
        // Only a bare file name is ever generated; anything else is not ours.
        let name = Path::new(rest).file_name()?;
        if name != rest {
            return None;
        }
        Some(self.dir.join(name))
    }
}

fn generate_file_name(extension: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!(
        "qr-code-{}-{}{}",
        Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, size: usize) -> IncomingFile {
        IncomingFile {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn accepts_known_image_types() {
        let policy = UploadPolicy::new(1024);
        for (name, mime) in [
            ("a.png", "image/png"),
            ("a.JPG", "image/jpeg"),
            ("a.jpeg", "image/jpeg"),
            ("a.gif", "image/gif; charset=binary"),
        ] {
            let file = IncomingFile {
                file_name: name.into(),
                content_type: Some(mime.into()),
                bytes: vec![1, 2, 3],
            };
            assert!(policy.validate(file).is_ok(), "{} should pass", name);
        }
    }

    #[test]
    fn keeps_original_extension() {
        let image = UploadPolicy::new(1024).validate(png("Code.PNG", 4)).unwrap();
        assert_eq!(image.extension, ".PNG");
    }

    #[test]
    fn rejects_wrong_extension_or_mime() {
        let policy = UploadPolicy::new(1024);

        let mut pdf = png("qr.pdf", 4);
        pdf.content_type = Some("application/pdf".into());
        assert!(matches!(policy.validate(pdf), Err(AppError::UploadRejected(_))));

        let mut disguised = png("qr.png", 4);
        disguised.content_type = Some("text/html".into());
        assert!(matches!(policy.validate(disguised), Err(AppError::UploadRejected(_))));

        let mut untyped = png("qr.png", 4);
        untyped.content_type = None;
        assert!(matches!(policy.validate(untyped), Err(AppError::UploadRejected(_))));

        assert!(matches!(
            policy.validate(png("noext", 4)),
            Err(AppError::UploadRejected(_))
        ));
    }

    #[test]
    fn enforces_size_limit() {
        let policy = UploadPolicy::new(5 * 1024 * 1024);
        assert!(policy.validate(png("qr.png", 5 * 1024 * 1024)).is_ok());
        assert!(matches!(
            policy.validate(png("qr.png", 5 * 1024 * 1024 + 1)),
            Err(AppError::UploadRejected(_))
        ));
    }

    #[test]
    fn generated_names_follow_pattern() {
        let name = generate_file_name(".png");
        let parts: Vec<&str> = name
            .strip_prefix("qr-code-")
            .and_then(|n| n.strip_suffix(".png"))
            .unwrap()
            .split('-')
            .collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].parse::<i64>().is_ok());
        assert!(parts[1].parse::<u32>().unwrap() < 1_000_000_000);
    }

    #[tokio::test]
    async fn persist_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());
        let image = UploadPolicy::new(1024).validate(png("qr.png", 8)).unwrap();

        let public = storage.persist(&image).await.unwrap();
        assert!(public.starts_with("/uploads/qr-code-"));
        let on_disk = dir.path().join(public.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(&on_disk).unwrap().len(), 8);

        assert!(storage.remove(&public).await);
        assert!(!on_disk.exists());
        assert!(!storage.remove(&public).await);
    }

    #[tokio::test]
    async fn remove_ignores_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().join("uploads"));
        std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();

        assert!(!storage.remove("").await);
        assert!(!storage.remove("https://cdn.example.com/qr.png").await);
        assert!(!storage.remove("/uploads/../secret.txt").await);
        assert!(dir.path().join("secret.txt").exists());
    }
}
