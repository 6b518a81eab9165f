//! Logout use case.

use tracing::info;

use crate::auth::CredentialStore;
use crate::error::ApplicationResult;

/// Use case for ending the session locally.
#[derive(Debug, Clone)]
pub struct Logout {
    store: CredentialStore,
}

impl Logout {
    /// Creates a new `Logout` use case.
    #[must_use]
    pub const fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Clears the stored token. Logging out twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted token cannot be removed; the
    /// session is logged out regardless.
    pub async fn execute(&self) -> ApplicationResult<()> {
        self.store.clear().await?;
        info!("logged out");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::MemoryPersistence;
    use anistream_domain::AuthState;

    #[tokio::test]
    async fn test_logout_twice() {
        let persistence = MemoryPersistence::with_value("Bearer abc");
        let store = CredentialStore::open(persistence.clone()).await.unwrap();
        let logout = Logout::new(store.clone());

        logout.execute().await.unwrap();
        logout.execute().await.unwrap();
        assert_eq!(store.auth_state(), AuthState::LoggedOut);
        assert_eq!(persistence.value(), None);
    }
}
