use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// One hundred years.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Where team images are written. Defaults to `<data_dir>/uploads/teams`.
    pub uploads_dir: Option<PathBuf>,
    /// Session lifetime. If not set, sessions last until logout.
    pub session_ttl_hours: Option<i64>,
    /// Marks the session cookie `Secure`. Enable when served over HTTPS.
    pub secure_cookies: bool,
    /// Reject scores above the activity's `max_score`.
    pub enforce_max_score: bool,
}

impl ServerConfig {
    /// Loads a TOML config file. Keys missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| Error::Config(format!("invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ttl) = self.session_ttl_hours {
            if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl) {
                return Err(Error::Config(format!(
                    "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"
                )));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("scoresheet.db")
    }

    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads").join("teams"))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            uploads_dir: None,
            session_ttl_hours: None,
            secure_cookies: false,
            enforce_max_score: false,
        }
    }
}
