//! Command implementations over the request pipeline.

use std::error::Error;
use std::fmt::Debug;
use std::io::{self, Write};
use std::sync::Arc;

use anistream_application::use_cases::{
    BrowseCatalog, Login, Logout, ResolveStream, WatchProfile,
};
use anistream_application::{
    ApiClient, CredentialPersistence, CredentialStore, Demand, PageOutcome, RetryAction,
    RetryCoordinator, UiEffect,
};
use anistream_domain::{
    AnimeSummary, ApiResult, AuthState, CatalogFilter, ClientSettings, EpisodeId, ErrorKind,
    LoginCredentials,
};
use anistream_infrastructure::ReqwestTransport;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// One process worth of client state.
pub struct App {
    client: ApiClient<ReqwestTransport>,
    store: CredentialStore,
    coordinator: RetryCoordinator,
    effects: mpsc::UnboundedReceiver<UiEffect>,
    page_size: usize,
    retries: u32,
}

impl App {
    /// Builds the transport and restores the persisted session.
    pub async fn connect(
        settings: &ClientSettings,
        persistence: Arc<dyn CredentialPersistence>,
        retries: u32,
    ) -> Result<Self, Box<dyn Error>> {
        let transport = Arc::new(ReqwestTransport::new(settings)?);
        let store = CredentialStore::open(persistence).await?;
        let (coordinator, effects) = RetryCoordinator::new();

        Ok(Self {
            client: ApiClient::new(transport),
            coordinator: coordinator.with_session(store.clone()),
            store,
            effects,
            page_size: settings.page_size,
            retries,
        })
    }

    pub async fn login(&mut self, credentials: LoginCredentials, out: &mut impl Write) -> CommandResult {
        let action = Login::new(self.client.clone(), self.store.clone()).action(credentials);
        if self.run(action, out).await?.is_some() {
            writeln!(out, "logged in")?;
        }
        Ok(())
    }

    pub async fn logout(&mut self, out: &mut impl Write) -> CommandResult {
        Logout::new(self.store.clone()).execute().await?;
        writeln!(out, "logged out")?;
        Ok(())
    }

    pub fn status(&self, out: &mut impl Write) -> CommandResult {
        match self.store.auth_state() {
            AuthState::LoggedIn => writeln!(out, "logged in")?,
            AuthState::LoggedOut => writeln!(out, "logged out")?,
        }
        Ok(())
    }

    pub async fn me(&mut self, out: &mut impl Write) -> CommandResult {
        let profile = Arc::new(WatchProfile::new(self.client.clone(), self.store.clone()));
        // Each attempt subscribes afresh and takes the first answer.
        let action = RetryAction::new((), move |()| {
            let mut stream = profile.stream();
            async move {
                stream
                    .next()
                    .await
                    .unwrap_or_else(|| ApiResult::failure(ErrorKind::Unknown))
            }
        });
        if let Some(profile) = self.run(action, out).await? {
            writeln!(out, "{} (#{})", profile.username, profile.id)?;
        }
        Ok(())
    }

    pub async fn search(
        &mut self,
        filter: CatalogFilter,
        pages: usize,
        out: &mut impl Write,
    ) -> CommandResult {
        let browse = BrowseCatalog::new(self.client.clone(), self.store.clone(), self.page_size);
        let (_filters, criteria) = watch::channel(filter);
        let demand = Demand::new();
        let mut stream = browse.pages(criteria, &demand);

        let mut shown = 0;
        let mut attempts = 0;
        let mut next = stream.next().await;
        while let Some(outcome) = next.take() {
            match outcome {
                PageOutcome::Loaded(page) => {
                    for item in &page.items {
                        write_summary(out, item)?;
                    }
                    shown += 1;
                    if page.is_last {
                        writeln!(out, "-- end of results --")?;
                    } else if shown < pages {
                        demand.request_more();
                        next = stream.next().await;
                    }
                }
                PageOutcome::Failed { failure, retry } => {
                    self.coordinator.report_page(failure, retry.clone()).await;
                    self.show_effects(out)?;
                    if let Some(retry) = retry.filter(|_| attempts < self.retries) {
                        attempts += 1;
                        info!(attempt = attempts, request = ?retry.params(), "retrying page");
                        next = Some(retry.invoke().await);
                    }
                }
                other => debug!(?other, "page outcome skipped"),
            }
        }
        Ok(())
    }

    pub async fn play(&mut self, episode: EpisodeId, out: &mut impl Write) -> CommandResult {
        let resolve = ResolveStream::new(
            self.client.clone(),
            self.store.clone(),
            self.coordinator.clone(),
        );
        if let Some(source) = self.run(resolve.action(episode), out).await? {
            match source.quality {
                Some(quality) => writeln!(out, "{} [{quality}]", source.url)?,
                None => writeln!(out, "{}", source.url)?,
            }
        }
        Ok(())
    }

    /// Runs `action` through the coordinator, reissuing it while the
    /// failure offers a retry and attempts remain.
    async fn run<P, R>(
        &mut self,
        action: RetryAction<P, ApiResult<R>>,
        out: &mut impl Write,
    ) -> io::Result<Option<R>>
    where
        P: Clone + Debug + Send + Sync + 'static,
        R: Send + 'static,
    {
        let mut attempts = 0;
        loop {
            let result = self.coordinator.run(action.clone()).await;
            let retryable = self.show_effects(out)?;
            match result {
                ApiResult::Success(value) => return Ok(Some(value)),
                ApiResult::Failure(_) if retryable && attempts < self.retries => {
                    attempts += 1;
                    info!(attempt = attempts, params = ?action.params(), "retrying");
                }
                ApiResult::Failure(_) => return Ok(None),
            }
        }
    }

    /// Prints queued effects; returns true if the last one offered a retry.
    fn show_effects(&mut self, out: &mut impl Write) -> io::Result<bool> {
        let mut retryable = false;
        while let Ok(effect) = self.effects.try_recv() {
            writeln!(out, "error: {} [{}]", effect.kind, effect.message_id)?;
            retryable = effect.retry.is_some();
        }
        Ok(retryable)
    }
}

fn write_summary(out: &mut impl Write, item: &AnimeSummary) -> io::Result<()> {
    match item.episodes {
        Some(episodes) => writeln!(out, "{:>8}  {} ({episodes} eps)", item.id, item.title),
        None => writeln!(out, "{:>8}  {}", item.id, item.title),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use anistream_infrastructure::FileCredentialPersistence;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn app(server: &MockServer, dir: &TempDir, retries: u32) -> App {
        let settings = ClientSettings {
            base_url: format!("{}/v1", server.uri()),
            page_size: 2,
            ..ClientSettings::default()
        };
        let persistence = Arc::new(FileCredentialPersistence::new(dir.path().join("credentials.json")));
        App::connect(&settings, persistence, retries).await.unwrap()
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_login_then_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t0k" })))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 0).await;

        let mut out = Vec::new();
        app.login(LoginCredentials::new("mika", "secret"), &mut out).await.unwrap();
        app.status(&mut out).unwrap();
        assert_eq!(text(out), "logged in\nlogged in\n");
    }

    #[tokio::test]
    async fn test_bad_password_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 3).await;

        let mut out = Vec::new();
        app.login(LoginCredentials::new("mika", "wrong"), &mut out).await.unwrap();
        assert_eq!(
            text(out),
            "error: Incorrect username or password [error.incorrect_credentials]\n"
        );
    }

    #[tokio::test]
    async fn test_search_shows_requested_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/anime"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [
                { "id": 1, "title": "Frieren", "episodes": 28 },
                { "id": 2, "title": "Mushishi" }
            ] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/anime"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [
                { "id": 3, "title": "Haikyu" }
            ] })))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 0).await;
        app.store.save("abc").await.unwrap();

        let mut out = Vec::new();
        app.search(CatalogFilter::default(), 5, &mut out).await.unwrap();
        assert_eq!(
            text(out),
            "       1  Frieren (28 eps)\n       2  Mushishi\n       3  Haikyu\n-- end of results --\n"
        );
    }

    #[tokio::test]
    async fn test_search_stops_after_page_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/anime"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [
                { "id": 1, "title": "Frieren" },
                { "id": 2, "title": "Mushishi" }
            ] })))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 0).await;
        app.store.save("abc").await.unwrap();

        let mut out = Vec::new();
        app.search(CatalogFilter::default(), 1, &mut out).await.unwrap();
        assert_eq!(text(out).lines().count(), 2);
    }

    #[tokio::test]
    async fn test_search_retries_failed_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/anime"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/anime"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [
                { "id": 7, "title": "Planetes" }
            ] })))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 1).await;
        app.store.save("abc").await.unwrap();

        let mut out = Vec::new();
        app.search(CatalogFilter::default(), 1, &mut out).await.unwrap();
        assert_eq!(
            text(out),
            "error: Server error [error.server_error]\n       7  Planetes\n-- end of results --\n"
        );
    }

    #[tokio::test]
    async fn test_search_while_logged_out_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 2).await;

        let mut out = Vec::new();
        app.search(CatalogFilter::search("frieren"), 1, &mut out).await.unwrap();
        assert_eq!(text(out), "error: Session expired [error.unauthorized]\n");
    }

    #[tokio::test]
    async fn test_play_retries_recoverable_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/episodes/12/stream"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/episodes/12/stream"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://cdn.example/ep12.m3u8",
                "quality": "1080p"
            })))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 1).await;
        app.store.save("abc").await.unwrap();

        let mut out = Vec::new();
        app.play(EpisodeId(12), &mut out).await.unwrap();
        assert_eq!(
            text(out),
            "error: Too many requests [error.too_many_requests]\nhttps://cdn.example/ep12.m3u8 [1080p]\n"
        );
    }

    #[tokio::test]
    async fn test_rejected_session_logs_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = app(&server, &dir, 0).await;
        app.store.save("stale").await.unwrap();

        let mut out = Vec::new();
        app.me(&mut out).await.unwrap();
        app.status(&mut out).unwrap();
        assert_eq!(
            text(out),
            "error: Session expired [error.unauthorized]\nlogged out\n"
        );
        assert!(!dir.path().join("credentials.json").exists());
    }
}
