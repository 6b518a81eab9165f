//! Login use case.

use anistream_domain::{ApiRequest, ApiResult, ErrorKind, LoginCredentials};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::auth::CredentialStore;
use crate::ports::Transport;
use crate::retry::RetryAction;

/// Body returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Raw session token, without the authorization scheme.
    pub token: String,
}

/// Use case for exchanging a username and password for a session.
pub struct Login<T> {
    client: ApiClient<T>,
    store: CredentialStore,
}

impl<T> Clone for Login<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T: Transport + 'static> Login<T> {
    /// Creates a new `Login` use case.
    #[must_use]
    pub const fn new(client: ApiClient<T>, store: CredentialStore) -> Self {
        Self { client, store }
    }

    /// Logs in and stores the returned token.
    ///
    /// Blank fields fail with [`ErrorKind::NoCredentialsSupplied`] without
    /// contacting the server. A rejected password is
    /// [`ErrorKind::IncorrectCredentials`].
    pub async fn execute(&self, credentials: LoginCredentials) -> ApiResult<()> {
        if !credentials.is_complete() {
            return ApiResult::failure(ErrorKind::NoCredentialsSupplied);
        }

        let request = ApiRequest::post("auth/login").with_json(json!({
            "username": &credentials.username,
            "password": &credentials.password,
        }));
        let response: LoginResponse = match self.client.login(request).await {
            ApiResult::Success(response) => response,
            ApiResult::Failure(failure) => return ApiResult::Failure(failure),
        };

        if response.token.trim().is_empty() {
            warn!("login succeeded without a token");
            return ApiResult::failure(ErrorKind::SerializationFailure);
        }

        match self.store.save(&response.token).await {
            Ok(_) => {
                info!(username = %credentials.username, "logged in");
                ApiResult::Success(())
            }
            Err(error) => {
                warn!(%error, "could not store the session token");
                ApiResult::failure(ErrorKind::Unknown)
            }
        }
    }

    /// Wraps a login attempt so it can be run through the retry coordinator.
    pub fn action(&self, credentials: LoginCredentials) -> RetryAction<LoginCredentials, ApiResult<()>> {
        let login = self.clone();
        RetryAction::new(credentials, move |credentials| {
            let login = login.clone();
            async move { login.execute(credentials).await }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::retry::RetryCoordinator;
    use crate::testing::{MemoryPersistence, Scripted, ScriptedTransport};
    use anistream_domain::AuthState;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn login(transport: &Arc<ScriptedTransport>) -> (Login<ScriptedTransport>, CredentialStore) {
        let store = CredentialStore::empty(Arc::new(MemoryPersistence::default()));
        (Login::new(ApiClient::new(transport.clone()), store.clone()), store)
    }

    #[tokio::test]
    async fn test_blank_fields_never_reach_the_server() {
        let transport = ScriptedTransport::queue(Vec::new());
        let (login, store) = login(&transport);

        for (user, password) in [("", "secret"), ("mika", " "), ("", "")] {
            let result = login.execute(LoginCredentials::new(user, password)).await;
            assert_eq!(result.error_kind(), Some(ErrorKind::NoCredentialsSupplied));
        }
        assert_eq!(transport.request_count(), 0);
        assert_eq!(store.auth_state(), AuthState::LoggedOut);
    }

    #[tokio::test]
    async fn test_success_saves_normalized_token() {
        let transport =
            ScriptedTransport::queue(vec![Scripted::json(200, &json!({ "token": "t0k" }))]);
        let (login, store) = login(&transport);

        let result = login.execute(LoginCredentials::new("mika", "secret")).await;
        assert_eq!(result, ApiResult::Success(()));
        assert_eq!(store.snapshot().unwrap().as_str(), "Bearer t0k");

        let request = &transport.requests()[0];
        assert_eq!(request.path, "auth/login");
        assert_eq!(request.authorization, None);
        assert_eq!(
            request.body,
            Some(json!({ "username": "mika", "password": "secret" }))
        );
    }

    #[tokio::test]
    async fn test_rejected_password_has_no_retry() {
        let transport = ScriptedTransport::queue(vec![Scripted::status(401)]);
        let (login, store) = login(&transport);
        let (coordinator, mut effects) = RetryCoordinator::new();

        let result = coordinator
            .run(login.action(LoginCredentials::new("mika", "wrong")))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::IncorrectCredentials));
        assert_eq!(store.auth_state(), AuthState::LoggedOut);

        let effect = effects.try_recv().unwrap();
        assert_eq!(effect.kind, ErrorKind::IncorrectCredentials);
        assert!(effect.retry.is_none());
    }

    #[tokio::test]
    async fn test_server_error_retry_logs_in() {
        let transport = ScriptedTransport::queue(vec![
            Scripted::status(500),
            Scripted::json(200, &json!({ "token": "t0k" })),
        ]);
        let (login, store) = login(&transport);
        let (coordinator, mut effects) = RetryCoordinator::new();

        let result = coordinator
            .run(login.action(LoginCredentials::new("mika", "secret")))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::ServerError));

        let retry = effects.try_recv().unwrap().retry.unwrap();
        assert!(!retry.label().contains("secret"));
        assert_eq!(retry.invoke().await, ApiResult::Success(()));
        assert_eq!(store.auth_state(), AuthState::LoggedIn);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let transport =
            ScriptedTransport::queue(vec![Scripted::json(200, &json!({ "token": "" }))]);
        let (login, store) = login(&transport);

        let result = login.execute(LoginCredentials::new("mika", "secret")).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::SerializationFailure));
        assert_eq!(store.snapshot(), None);
    }
}
