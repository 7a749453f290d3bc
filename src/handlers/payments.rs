use crate::{
    app::AppState,
    error::{AppError, AppResult},
    models::{NewPayment, PaymentRecord, PaymentStatus, StatusUpdate},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

pub async fn list_payments(State(state): State<AppState>) -> AppResult<Json<Vec<PaymentRecord>>> {
    let payments = state.payments.list().await?;
    Ok(Json(payments))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PaymentRecord>> {
    let payment = state.payments.get(&id).await?;
    Ok(Json(payment))
}

pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<NewPayment>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PaymentRecord>)> {
    let Json(new_payment) = payload.map_err(|e| AppError::InvalidArgument(e.body_text()))?;

    if new_payment.user_name.trim().is_empty() || new_payment.package_name.trim().is_empty() {
        return Err(AppError::InvalidArgument(
            "userName and packageName are required".into(),
        ));
    }

    let record = new_payment.into_record(Uuid::new_v4().to_string(), Utc::now());
    let record = state.payments.insert(record).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> AppResult<Json<PaymentRecord>> {
    let Json(update) = payload.map_err(|e| AppError::InvalidStatus(e.body_text()))?;
    let status = update.status.parse::<PaymentStatus>().map_err(AppError::InvalidStatus)?;

    let payment = state.payments.update_status(&id, status).await?;
    Ok(Json(payment))
}
