//! Service configuration
//!
//! Resolution follows the priority order used across the codebase:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The admin credential pair is never compiled in: it comes from the config
//! file or environment, and login stays disabled until both halves are set.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the admin username.
pub const ENV_ADMIN_USER: &str = "RESEARCHDIR_ADMIN_USER";
/// Environment variable holding the hex SHA-256 digest of the admin password.
pub const ENV_ADMIN_PASSWORD_SHA256: &str = "RESEARCHDIR_ADMIN_PASSWORD_SHA256";

/// Researcher directory configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// SQLite database path
    pub database: PathBuf,

    /// Directory where uploaded photos are written
    pub upload_dir: PathBuf,

    /// Photo extension allow-list (matched case-insensitively against the
    /// last dot-delimited segment of the uploaded filename)
    pub allowed_extensions: Vec<String>,

    /// Admin username; login is disabled while unset
    pub admin_username: Option<String>,

    /// Hex-encoded SHA-256 digest of the admin password; login is disabled
    /// while unset
    pub admin_password_sha256: Option<String>,

    /// Privileged session lifetime in seconds
    pub session_ttl_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5730".to_string(),
            database: PathBuf::from("researchdir.db"),
            upload_dir: PathBuf::from("uploads"),
            allowed_extensions: ["png", "jpg", "jpeg", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            admin_username: None,
            admin_password_sha256: None,
            session_ttl_seconds: 3600,
        }
    }
}

impl Config {
    /// True when both halves of the admin credential pair are configured
    pub fn login_enabled(&self) -> bool {
        self.admin_username.is_some() && self.admin_password_sha256.is_some()
    }
}

/// Command-line overrides applied on top of file/env/default values
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
}

/// Resolve effective configuration from overrides, environment, and file
pub fn resolve(overrides: Overrides) -> Result<Config> {
    let mut config = match &overrides.config {
        Some(path) => load_file(path)?,
        None => Config::default(),
    };

    // Environment overrides file values; CLI overrides both.
    if let Ok(user) = std::env::var(ENV_ADMIN_USER) {
        config.admin_username = Some(user);
    }
    if let Ok(digest) = std::env::var(ENV_ADMIN_PASSWORD_SHA256) {
        config.admin_password_sha256 = Some(digest);
    }

    if let Some(bind) = overrides.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = overrides.database {
        config.database = database;
    }
    if let Some(upload_dir) = overrides.upload_dir {
        config.upload_dir = upload_dir;
    }

    if config.allowed_extensions.is_empty() {
        return Err(Error::Config(
            "allowed_extensions must not be empty".to_string(),
        ));
    }

    Ok(config)
}

/// Load configuration from a TOML file
fn load_file(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&raw)
        .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))
}
