use crate::{
    error::AppResult,
    models::Settings,
    services::{
        json_file,
        uploads::{IncomingFile, UploadPolicy, UploadStorage},
    },
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> AppResult<Settings>;
    async fn save(&self, settings: &Settings) -> AppResult<()>;
}

pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn init(&self) -> AppResult<()> {
        json_file::ensure_document(&self.path, &Settings::default()).await
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> AppResult<Settings> {
        Ok(json_file::read_document(&self.path)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, settings: &Settings) -> AppResult<()> {
        json_file::write_document(&self.path, settings).await
    }
}

pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    uploads: UploadStorage,
    policy: UploadPolicy,
    lock: Mutex<()>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>, uploads: UploadStorage, policy: UploadPolicy) -> Self {
        Self {
            store,
            uploads,
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        self.policy
    }

    pub async fn get(&self) -> AppResult<Settings> {
        self.store.load().await
    }

    /// Validates the image first; a rejected file leaves every setting as it was.
    /// Once the new settings are written the replaced image is deleted.
    pub async fn save(&self, upi_id: Option<String>, qr_code: Option<IncomingFile>) -> AppResult<Settings> {
        let image = qr_code.map(|file| self.policy.validate(file)).transpose()?;

        let _guard = self.lock.lock().await;

        let new_qr_code = match &image {
            Some(image) => Some(self.uploads.persist(image).await?),
            None => None,
        };

        let mut settings = self.store.load().await?;
        let previous_qr_code = settings.qr_code.clone();
        settings.merge(upi_id.as_deref(), new_qr_code.clone());

        if let Err(e) = self.store.save(&settings).await {
            if let Some(path) = &new_qr_code {
                self.uploads.remove(path).await;
            }
            return Err(e);
        }

        if new_qr_code.is_some() && !previous_qr_code.is_empty() && previous_qr_code != settings.qr_code {
            self.uploads.remove(&previous_qr_code).await;
        }

        tracing::info!(
            upi_id = %settings.upi_id,
            qr_code = %settings.qr_code,
            "Admin settings saved"
        );
        Ok(settings)
    }
}
