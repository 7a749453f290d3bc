use crate::{app::AppState, error::AppResult, models::Statistics, services::compute_statistics};
use axum::{extract::State, Json};

pub async fn get_statistics(State(state): State<AppState>) -> AppResult<Json<Statistics>> {
    let payments = state.payments.list().await?;
    Ok(Json(compute_statistics(&payments)))
}
