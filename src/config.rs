//! Configuration loading and validation
//!
//! The whole roster lives in one TOML file, loaded once at startup: the
//! shared Icecast credential block, the global admin list, the Telegram bot
//! token, and one `[stations.<id>]` table per station. Nothing here is
//! hot-reloaded; adding or removing stations at runtime goes through the
//! registry and does not survive a restart.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Telegram user identifier
pub type UserId = i64;

/// Top-level settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub icecast: IcecastConfig,

    /// Global admins, authorized for every station
    #[serde(default)]
    pub admins: Vec<UserId>,

    pub telegram: TelegramConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Station roster keyed by station id
    #[serde(default)]
    pub stations: HashMap<String, StationConfig>,
}

/// Shared broadcast server credential block
#[derive(Debug, Clone, Deserialize)]
pub struct IcecastConfig {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    pub password: String,
}

/// One station's immutable configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    /// Display name announced on the stream
    pub name: String,
    /// Mount path on the Icecast server, e.g. "/jazz"
    pub mount: String,
    /// Directory scanned for playlist tracks
    pub playlist: PathBuf,
    /// Admins for this station only
    #[serde(default)]
    pub admins: Vec<UserId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Selected-station session behavior for the command router
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity after which a caller's station selection is
    /// forgotten. Unset means selections never expire.
    pub expiry_secs: Option<u64>,
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_username() -> String {
    "source".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Settings {
    /// Load and validate settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let settings: Settings = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.token.is_empty() {
            return Err(Error::Config("telegram.token must not be empty".to_string()));
        }
        if self.icecast.password.is_empty() {
            return Err(Error::Config("icecast.password must not be empty".to_string()));
        }
        for (id, station) in &self.stations {
            if station.name.is_empty() {
                return Err(Error::Config(format!("station '{}': name must not be empty", id)));
            }
            if !station.mount.starts_with('/') {
                return Err(Error::Config(format!(
                    "station '{}': mount '{}' must start with '/'",
                    id, station.mount
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        admins = [100, 200]

        [icecast]
        server = "ice.example.org"
        password = "hackme"

        [telegram]
        token = "123:abc"

        [stations.jazz]
        name = "Jazz FM"
        mount = "/jazz"
        playlist = "/srv/music/jazz"
        admins = [300]

        [stations.rock]
        name = "Rock FM"
        mount = "/rock"
        playlist = "/srv/music/rock"
    "#;

    #[test]
    fn parses_full_roster() {
        let settings: Settings = toml::from_str(SAMPLE).unwrap();
        settings.validate().unwrap();

        assert_eq!(settings.admins, vec![100, 200]);
        assert_eq!(settings.icecast.server, "ice.example.org");
        assert_eq!(settings.icecast.port, 8000);
        assert_eq!(settings.icecast.username, "source");
        assert_eq!(settings.stations.len(), 2);

        let jazz = &settings.stations["jazz"];
        assert_eq!(jazz.name, "Jazz FM");
        assert_eq!(jazz.mount, "/jazz");
        assert_eq!(jazz.admins, vec![300]);
        assert!(settings.stations["rock"].admins.is_empty());
    }

    #[test]
    fn defaults_apply() {
        let settings: Settings = toml::from_str(
            r#"
            [icecast]
            password = "pw"

            [telegram]
            token = "t"
            "#,
        )
        .unwrap();

        assert_eq!(settings.icecast.server, "localhost");
        assert_eq!(settings.http.bind, "127.0.0.1:5000");
        assert_eq!(settings.telegram.poll_timeout_secs, 30);
        assert!(settings.session.expiry_secs.is_none());
        assert!(settings.stations.is_empty());
    }

    #[test]
    fn rejects_bad_mount() {
        let mut settings: Settings = toml::from_str(SAMPLE).unwrap();
        settings.stations.get_mut("jazz").unwrap().mount = "jazz".to_string();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_empty_token() {
        let mut settings: Settings = toml::from_str(SAMPLE).unwrap();
        settings.telegram.token.clear();
        assert!(settings.validate().is_err());
    }
}
