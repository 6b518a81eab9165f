//! Typed calls over a [`Transport`].

use std::sync::Arc;

use anistream_domain::{ApiRequest, ApiResult, CredentialToken, ErrorKind};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::classifier::{decode_json, safe_call, safe_login_call};
use crate::ports::Transport;

/// Issues classified JSON calls against the backend.
pub struct ApiClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client over `transport`.
    #[must_use]
    pub const fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Sends `request` and decodes the JSON response.
    pub async fn fetch<R: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<R> {
        debug!(method = %request.method, path = %request.path, "sending request");
        safe_call(|| self.transport.send(request), decode_json).await
    }

    /// Sends `request` with `token` attached.
    ///
    /// Without a usable token nothing is sent and the result is
    /// [`ErrorKind::Unauthorized`].
    pub async fn fetch_authenticated<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
        token: Option<CredentialToken>,
    ) -> ApiResult<R> {
        let Some(token) = token.filter(|token| !token.is_blank()) else {
            debug!(path = %request.path, "no credential, request not sent");
            return ApiResult::failure(ErrorKind::Unauthorized);
        };
        self.fetch(request.with_authorization(token)).await
    }

    /// Sends a request to the login endpoint, where 401 means bad credentials.
    pub async fn login<R: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<R> {
        debug!(path = %request.path, "sending login request");
        safe_login_call(|| self.transport.send(request), decode_json).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::{Scripted, ScriptedTransport};
    use anistream_domain::UserProfile;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_decodes_payload() {
        let transport = ScriptedTransport::queue(vec![Scripted::json(
            200,
            &json!({ "id": 3, "username": "mika" }),
        )]);
        let client = ApiClient::new(transport);

        let profile: ApiResult<UserProfile> = client.fetch(ApiRequest::get("me")).await;
        assert_eq!(profile.success().unwrap().username, "mika");
    }

    #[tokio::test]
    async fn test_missing_token_sends_nothing() {
        let transport = ScriptedTransport::queue(Vec::new());
        let client = ApiClient::new(transport.clone());

        let result: ApiResult<UserProfile> =
            client.fetch_authenticated(ApiRequest::get("me"), None).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::Unauthorized));

        let blank = CredentialToken::normalize(" ");
        let result: ApiResult<UserProfile> = client
            .fetch_authenticated(ApiRequest::get("me"), Some(blank))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_token_is_attached() {
        let transport = ScriptedTransport::queue(vec![Scripted::json(200, &json!(null))]);
        let client = ApiClient::new(transport.clone());

        let token = CredentialToken::normalize("abc");
        let result: ApiResult<()> = client
            .fetch_authenticated(ApiRequest::get("me"), Some(token.clone()))
            .await;
        assert!(result.is_success());
        assert_eq!(transport.requests()[0].authorization, Some(token));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_no_connectivity() {
        let transport = ScriptedTransport::queue(vec![Scripted::fault(
            crate::ports::TransportFault::ConnectionRefused {
                host: "api.anistream.app".to_string(),
                port: 443,
            },
        )]);
        let client = ApiClient::new(transport);

        let result: ApiResult<UserProfile> = client.fetch(ApiRequest::get("me")).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::NoConnectivity));
    }

    #[tokio::test]
    async fn test_login_reads_401_as_bad_credentials() {
        let transport = ScriptedTransport::queue(vec![Scripted::status(401)]);
        let client = ApiClient::new(transport);

        let result: ApiResult<()> = client.login(ApiRequest::post("auth/login")).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::IncorrectCredentials));
    }
}
