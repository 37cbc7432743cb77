//! Configuration module
//!
//! Process-level settings read once at startup from the environment (and an
//! optional `.env` file). Per-file pipeline behaviour lives in
//! [`crate::settings::PipelineConfig`] instead, because that may change while
//! the daemon runs.

use std::env;
use std::path::PathBuf;

use crate::constants::DEFAULT_REMOTE_TARGET;

// Common constants
const WATCH_DIR: &str = "/watchdir";
const DATA_DIR: &str = "/app/data";
const WORKER_MAX: usize = 4;
const QUEUE_CAPACITY: usize = 1024;
const UPLOAD_TIMEOUT_SECS: u64 = 6 * 3600;
const NOTIFY_TIMEOUT_SECS: u64 = 10;
const DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct DaemonConfig {
    pub watch_dir: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub settings_file: PathBuf,
    pub rclone_log_file: PathBuf,
    pub rclone_remote: String,
    pub rclone_binary: String,
    pub rclone_config: Option<PathBuf>,
    pub rclone_log_level: String,
    pub worker_max: usize,
    pub queue_capacity: usize,
    /// Upper bound on a single sync tool invocation.
    pub upload_timeout_secs: u64,
    /// Per-channel notification timeout.
    pub notify_timeout_secs: u64,
    /// Periodic full re-scan of the watch root. 0 = disabled.
    pub rescan_interval_secs: u64,
    pub db_max_connections: u32,
    pub log_format: String,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| DATA_DIR.to_string()));

        let config = DaemonConfig {
            watch_dir: PathBuf::from(
                env::var("WATCH_DIR").unwrap_or_else(|_| WATCH_DIR.to_string()),
            ),
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("uploads.db")),
            settings_file: env::var("SETTINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("settings.json")),
            rclone_log_file: env::var("RCLONE_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("rclone.log")),
            rclone_remote: env::var("RCLONE_REMOTE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REMOTE_TARGET.to_string()),
            rclone_binary: env::var("RCLONE_BINARY").unwrap_or_else(|_| "rclone".to_string()),
            rclone_config: env::var("RCLONE_CONFIG")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            rclone_log_level: env::var("RCLONE_LOG_LEVEL")
                .unwrap_or_else(|_| "INFO".to_string())
                .to_uppercase(),
            worker_max: parse_or("WORKER_MAX", WORKER_MAX),
            queue_capacity: parse_or("QUEUE_CAPACITY", QUEUE_CAPACITY),
            upload_timeout_secs: parse_or("UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS),
            notify_timeout_secs: parse_or("NOTIFY_TIMEOUT_SECS", NOTIFY_TIMEOUT_SECS),
            rescan_interval_secs: parse_or("RESCAN_INTERVAL_SECS", 0),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
            data_dir,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.worker_max == 0 {
            return Err(anyhow::anyhow!("WORKER_MAX must be at least 1"));
        }

        if self.queue_capacity == 0 {
            return Err(anyhow::anyhow!("QUEUE_CAPACITY must be at least 1"));
        }

        if self.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_TIMEOUT_SECS must be greater than 0"));
        }

        if self.notify_timeout_secs == 0 {
            return Err(anyhow::anyhow!("NOTIFY_TIMEOUT_SECS must be greater than 0"));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(anyhow::anyhow!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            ));
        }

        if self.rclone_binary.trim().is_empty() {
            return Err(anyhow::anyhow!("RCLONE_BINARY cannot be empty"));
        }

        Ok(())
    }

    pub fn rescan_enabled(&self) -> bool {
        self.rescan_interval_secs > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DaemonConfig {
        DaemonConfig {
            watch_dir: PathBuf::from("/watchdir"),
            data_dir: PathBuf::from("/app/data"),
            database_path: PathBuf::from("/app/data/uploads.db"),
            settings_file: PathBuf::from("/app/data/settings.json"),
            rclone_log_file: PathBuf::from("/app/data/rclone.log"),
            rclone_remote: "remote:/".into(),
            rclone_binary: "rclone".into(),
            rclone_config: None,
            rclone_log_level: "INFO".into(),
            worker_max: 4,
            queue_capacity: 16,
            upload_timeout_secs: 60,
            notify_timeout_secs: 10,
            rescan_interval_secs: 0,
            db_max_connections: 5,
            log_format: "text".into(),
        }
    }

    #[test]
    fn sample_config_is_valid() {
        let config = sample();
        assert!(config.validate().is_ok());
        assert!(!config.rescan_enabled());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = DaemonConfig {
            worker_max: 0,
            ..sample()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_format_rejected() {
        let config = DaemonConfig {
            log_format: "xml".into(),
            ..sample()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("LOG_FORMAT"));
    }
}
