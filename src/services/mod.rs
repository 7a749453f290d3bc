pub mod json_file;
pub mod payments;
pub mod settings;
pub mod statistics;
pub mod uploads;

pub use payments::{JsonPaymentStore, PaymentStore};
pub use settings::{JsonSettingsStore, SettingsService, SettingsStore};
pub use statistics::compute_statistics;
pub use uploads::{IncomingFile, UploadPolicy, UploadStorage, UPLOADS_ROUTE};
