//! File-based credential persistence.
//!
//! The session token is kept in `<config_dir>/anistream/credentials.json`,
//! readable by the current user only.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anistream_application::ports::{CredentialPersistence, PersistenceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_pretty_bytes};

/// On-disk record.
///
/// ```json
/// {
///   "token": "Bearer 9f2c...",
///   "saved_at": "2025-01-04T10:12:00Z"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct CredentialRecord {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Stores the normalized token in a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialPersistence {
    path: PathBuf,
}

impl FileCredentialPersistence {
    /// Uses an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses the default location in the user's config directory.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NoConfigDir`] if the platform has no config directory.
    pub fn in_config_dir() -> Result<Self, PersistenceError> {
        let dir = dirs::config_dir().ok_or(PersistenceError::NoConfigDir)?;
        Ok(Self::new(Self::default_path(&dir)))
    }

    fn default_path(config_dir: &Path) -> PathBuf {
        config_dir.join("anistream").join("credentials.json")
    }

    /// Path of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file for writing, owner-only from the moment it exists.
    async fn open_private(&self) -> Result<fs::File, PersistenceError> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let file = options.open(&self.path).await?;

        // `mode` only applies on creation; tighten a file left by an older version.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(file)
    }
}

#[async_trait]
impl CredentialPersistence for FileCredentialPersistence {
    async fn load(&self) -> Result<Option<String>, PersistenceError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: CredentialRecord =
            from_json_bytes(&content).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
        debug!(saved_at = %record.saved_at, "credential loaded");
        Ok(Some(record.token))
    }

    async fn store(&self, token: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let record = CredentialRecord {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let content =
            to_json_pretty_bytes(&record).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;

        let mut file = self.open_private().await?;
        file.write_all(&content).await?;
        file.flush().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
