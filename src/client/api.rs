use crate::{
    error::ErrorResponse,
    models::{PaymentRecord, PaymentStatus, Settings, Statistics, StatusUpdate},
};
use anyhow::{bail, Context, Result};
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub async fn list_payments(&self) -> Result<Vec<PaymentRecord>> {
        let response = self.http.get(self.url("/api/payments")).send().await?;
        decode(response).await
    }

    pub async fn get_payment(&self, id: &str) -> Result<PaymentRecord> {
        let response = self
            .http
            .get(self.url(&format!("/api/payments/{}", id)))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_status(&self, id: &str, status: PaymentStatus) -> Result<PaymentRecord> {
        let response = self
            .http
            .patch(self.url(&format!("/api/payments/{}/status", id)))
            .json(&StatusUpdate {
                status: status.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        let response = self.http.get(self.url("/api/statistics")).send().await?;
        decode(response).await
    }

    pub async fn settings(&self) -> Result<Settings> {
        let response = self.http.get(self.url("/api/admin/settings")).send().await?;
        decode(response).await
    }

    pub async fn save_settings(&self, upi_id: Option<&str>, qr_code: Option<&Path>) -> Result<Settings> {
        let mut form = multipart::Form::new();

        if let Some(upi_id) = upi_id {
            form = form.text("upiId", upi_id.to_string());
        }

        if let Some(path) = qr_code {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("qr-code")
                .to_string();
            let part = multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(image_mime(path))?;
            form = form.part("qrCode", part);
        }

        let response = self
            .http
            .post(self.url("/api/admin/settings"))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => bail!("{} ({})", err.error, status),
            Err(_) => bail!("Request failed with {}: {}", status, body),
        }
    }

    response
        .json::<T>()
        .await
        .context("Failed to decode response body")
}
