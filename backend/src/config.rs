use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup and handed to every
/// component that needs it instead of ambient environment lookups.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root directory for stored templates, uploaded datasets and batch
    /// working directories.
    pub storage_root: PathBuf,
    pub database_path: PathBuf,
    /// Binary invoked for native-to-PDF conversion.
    pub converter_bin: String,
}

impl AppConfig {
    /// Build the configuration from the environment (a `.env` file is
    /// honored when present), falling back to local defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let storage_root = PathBuf::from(
            env::var("CERTMILL_STORAGE").unwrap_or_else(|_| "./data".to_string()),
        );
        AppConfig {
            host: env::var("CERTMILL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("CERTMILL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_path: env::var("CERTMILL_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| storage_root.join("certmill.sqlite")),
            converter_bin: env::var("CERTMILL_CONVERTER")
                .unwrap_or_else(|_| "libreoffice".to_string()),
            storage_root,
        }
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.storage_root.join("templates")
    }

    pub fn datasets_dir(&self) -> PathBuf {
        self.storage_root.join("datasets")
    }

    /// Working directory owned exclusively by one batch's run.
    pub fn batch_dir(&self, batch_id: &str) -> PathBuf {
        self.storage_root.join("batches").join(batch_id)
    }
}
