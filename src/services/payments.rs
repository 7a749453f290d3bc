use crate::{
    error::{AppError, AppResult},
    models::{PaymentRecord, PaymentStatus, TransitionPolicy},
    services::json_file,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<PaymentRecord>>;

    async fn get(&self, id: &str) -> AppResult<PaymentRecord>;

    async fn insert(&self, record: PaymentRecord) -> AppResult<PaymentRecord>;

    async fn update_status(&self, id: &str, status: PaymentStatus) -> AppResult<PaymentRecord>;

    async fn save(&self, records: &[PaymentRecord]) -> AppResult<()>;
}

// One element of the stored array. Elements that do not read as a record
// (no id, not an object) stay in place across rewrites but are never listed.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Entry {
    Record(PaymentRecord),
    Opaque(Value),
}

impl Entry {
    fn record(&self) -> Option<&PaymentRecord> {
        match self {
            Entry::Record(record) => Some(record),
            Entry::Opaque(_) => None,
        }
    }
}

pub struct JsonPaymentStore {
    path: PathBuf,
    policy: TransitionPolicy,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonPaymentStore {
    pub fn new(path: impl Into<PathBuf>, policy: TransitionPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn init(&self) -> AppResult<()> {
        json_file::ensure_document(&self.path, &Vec::<PaymentRecord>::new()).await
    }

    async fn read_entries(&self) -> AppResult<Vec<Entry>> {
        let elements: Vec<Value> = json_file::read_document(&self.path)
            .await?
            .unwrap_or_default();

        Ok(elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                match serde_json::from_value::<PaymentRecord>(element.clone()) {
                    Ok(record) => Entry::Record(record),
                    Err(e) => {
                        tracing::warn!(
                            "Skipping unreadable payment at index {} in {}: {}",
                            index,
                            self.path.display(),
                            e
                        );
                        Entry::Opaque(element)
                    }
                }
            })
            .collect())
    }

    async fn read_all(&self) -> AppResult<Vec<PaymentRecord>> {
        Ok(self
            .read_entries()
            .await?
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Record(record) => Some(record),
                Entry::Opaque(_) => None,
            })
            .collect())
    }
}

#[async_trait]
impl PaymentStore for JsonPaymentStore {
    async fn list(&self) -> AppResult<Vec<PaymentRecord>> {
        self.read_all().await
    }

    async fn get(&self, id: &str) -> AppResult<PaymentRecord> {
        self.read_all()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn insert(&self, record: PaymentRecord) -> AppResult<PaymentRecord> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;

        if entries
            .iter()
            .filter_map(Entry::record)
            .any(|p| p.id == record.id)
        {
            return Err(AppError::InvalidArgument(format!(
                "payment {} already exists",
                record.id
            )));
        }

        entries.push(Entry::Record(record.clone()));
        json_file::write_document(&self.path, &entries).await?;

        tracing::info!(payment_id = %record.id, "Payment request recorded");
        Ok(record)
    }

    async fn update_status(&self, id: &str, status: PaymentStatus) -> AppResult<PaymentRecord> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;

        let payment = entries
            .iter_mut()
            .find_map(|entry| match entry {
                Entry::Record(record) if record.id == id => Some(record),
                _ => None,
            })
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        if !self.policy.allows(&payment.status, status) {
            return Err(AppError::TransitionNotAllowed {
                from: payment.status.to_string(),
                to: status.to_string(),
            });
        }

        let previous = std::mem::replace(&mut payment.status, status.into());
        payment.updated_at = Some(Utc::now().into());
        let updated = payment.clone();

        json_file::write_document(&self.path, &entries).await?;

        tracing::info!(
            payment_id = %id,
            from = %previous,
            to = %status,
            "Payment status updated"
        );
        Ok(updated)
    }

    async fn save(&self, records: &[PaymentRecord]) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        json_file::write_document(&self.path, records).await
    }
}
