use crate::models::TransitionPolicy;
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Flat-file storage
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,

    // Uploads
    pub max_upload_bytes: usize,

    pub status_policy: TransitionPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;

        let config = Self {
            environment,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid PORT")?,

            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            uploads_dir: std::env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),

            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(raw) => raw.parse().context("Invalid MAX_UPLOAD_BYTES")?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },

            status_policy: std::env::var("STATUS_POLICY")
                .unwrap_or_else(|_| "permissive".to_string())
                .parse::<TransitionPolicy>()
                .map_err(|e| anyhow!("Invalid STATUS_POLICY: {}", e))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration rooted at a single directory, used by tests and local tooling.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: root.join("data"),
            uploads_dir: root.join("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            status_policy: TransitionPolicy::Permissive,
        }
    }

    pub fn payments_file(&self) -> PathBuf {
        self.data_dir.join("payments.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        if self.data_dir.as_os_str().is_empty() || self.uploads_dir.as_os_str().is_empty() {
            bail!("DATA_DIR and UPLOADS_DIR must not be empty");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
