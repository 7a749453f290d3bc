use crate::{
    app::AppState,
    error::{AppError, AppResult},
    models::Settings,
    services::IncomingFile,
};
use axum::{
    extract::{Multipart, State},
    Json,
};

pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<Settings>> {
    Ok(Json(state.settings.get().await?))
}

pub async fn save_settings(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Settings>> {
    let max_bytes = state.settings.upload_policy().max_bytes;
    let mut upi_id = None;
    let mut qr_code: Option<IncomingFile> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "upiId" => upi_id = Some(field.text().await?),
            "qrCode" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_owned);

                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(AppError::UploadRejected(format!(
                            "file exceeds {} bytes",
                            max_bytes
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                // Browsers send an empty part when no file was picked.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if qr_code.is_some() {
                    return Err(AppError::UploadRejected(
                        "only one qrCode file is accepted".into(),
                    ));
                }

                qr_code = Some(IncomingFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            other => tracing::debug!("Ignoring unexpected settings field {:?}", other),
        }
    }

    let settings = state.settings.save(upi_id, qr_code).await?;
    Ok(Json(settings))
}
