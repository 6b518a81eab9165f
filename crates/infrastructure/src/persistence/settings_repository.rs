//! Client settings loading.
//!
//! Settings come from `<config_dir>/anistream/settings.json` (all fields
//! optional, missing file means defaults), then environment overrides.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anistream_domain::{ClientSettings, DomainError};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::serialization::{SerializationError, from_json_bytes, to_json_pretty_bytes};

/// Overrides `base_url`.
pub const ENV_BASE_URL: &str = "ANISTREAM_BASE_URL";
/// Overrides `request_timeout_ms`.
pub const ENV_TIMEOUT_MS: &str = "ANISTREAM_TIMEOUT_MS";
/// Overrides `page_size`.
pub const ENV_PAGE_SIZE: &str = "ANISTREAM_PAGE_SIZE";

/// Errors raised while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for [`ClientSettings`].
    #[error("settings file is invalid: {0}")]
    Parse(#[from] SerializationError),

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidOverride {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// The resulting settings failed validation.
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// The platform has no config directory.
    #[error("no configuration directory available")]
    NoConfigDir,
}

/// Loads and saves [`ClientSettings`].
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    path: PathBuf,
}

impl SettingsRepository {
    /// Uses an explicit settings file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `<config_dir>/anistream/settings.json`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoConfigDir`] if the platform has no config directory.
    pub fn in_config_dir() -> Result<Self, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::new(dir.join("anistream").join("settings.json")))
    }

    /// Path of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, applies process environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or invalid, an override
    /// cannot be parsed, or the result fails validation.
    pub async fn load(&self) -> Result<ClientSettings, SettingsError> {
        self.load_with(|name| std::env::var(name).ok()).await
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientSettings, SettingsError> {
        let mut settings = match fs::read(&self.path).await {
            Ok(content) => from_json_bytes(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                ClientSettings::default()
            }
            Err(e) => return Err(e.into()),
        };

        apply_overrides(&mut settings, lookup)?;
        settings.validate()?;
        info!(base_url = %settings.base_url, page_size = settings.page_size, "settings loaded");
        Ok(settings)
    }

    /// Writes `settings` to the file, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written.
    pub async fn save(&self, settings: &ClientSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, to_json_pretty_bytes(settings)?).await?;
        Ok(())
    }
}

/// Applies `ANISTREAM_*` overrides found through `lookup`.
///
/// # Errors
///
/// Returns [`SettingsError::InvalidOverride`] for a value that does not parse.
pub fn apply_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    if let Some(base_url) = lookup(ENV_BASE_URL) {
        settings.base_url = base_url;
    }
    if let Some(value) = lookup(ENV_TIMEOUT_MS) {
        settings.request_timeout_ms = parse_override(ENV_TIMEOUT_MS, value)?;
    }
    if let Some(value) = lookup(ENV_PAGE_SIZE) {
        settings.page_size = parse_override(ENV_PAGE_SIZE, value)?;
    }
    Ok(())
}

fn parse_override<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidOverride { name, value })
}
