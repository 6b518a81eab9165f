//! File-backed persistence for credentials and settings.

mod credential_file;
mod settings_repository;

pub use credential_file::FileCredentialPersistence;
pub use settings_repository::{
    ENV_BASE_URL, ENV_PAGE_SIZE, ENV_TIMEOUT_MS, SettingsError, SettingsRepository,
    apply_overrides,
};
