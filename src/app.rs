use crate::{
    config::Config,
    error::AppResult,
    handlers::*,
    services::{
        JsonPaymentStore, JsonSettingsStore, PaymentStore, SettingsService, UploadPolicy,
        UploadStorage, UPLOADS_ROUTE,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

// Room for the text fields and multipart framing around the image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<dyn PaymentStore>,
    pub settings: Arc<SettingsService>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub async fn open(config: Config) -> AppResult<Self> {
        let payments = JsonPaymentStore::new(config.payments_file(), config.status_policy);
        payments.init().await?;

        let settings_store = JsonSettingsStore::new(config.settings_file());
        settings_store.init().await?;

        let uploads = UploadStorage::new(&config.uploads_dir);
        uploads.init().await?;

        let settings = SettingsService::new(
            Arc::new(settings_store),
            uploads,
            UploadPolicy::new(config.max_upload_bytes),
        );

        Ok(Self {
            payments: Arc::new(payments),
            settings: Arc::new(settings),
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    // Oversized uploads must reach the handler's own size check so they are
    // reported as rejected uploads rather than a bare 413.
    let settings_body_limit = state.config.max_upload_bytes * 2 + MULTIPART_OVERHEAD_BYTES;
    let uploads = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/payments", get(list_payments).post(create_payment))
        .route("/api/payments/:id", get(get_payment))
        .route("/api/payments/:id/status", patch(update_payment_status))
        .route("/api/statistics", get(get_statistics))
        .route(
            "/api/admin/settings",
            get(get_settings)
                .post(save_settings)
                .layer(DefaultBodyLimit::max(settings_body_limit)),
        )
        .nest_service(UPLOADS_ROUTE, uploads)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
