//! Anistream - command-line client.
//!
//! Settings come from `<config_dir>/anistream/settings.json` and
//! `ANISTREAM_*` variables; the session token is kept next to them.

mod app;
mod cli;

use std::sync::Arc;

use anistream_domain::{CatalogFilter, EpisodeId, LoginCredentials};
use anistream_infrastructure::{FileCredentialPersistence, SettingsRepository};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = SettingsRepository::in_config_dir()?.load().await?;
    let persistence = Arc::new(FileCredentialPersistence::in_config_dir()?);
    let mut app = App::connect(&settings, persistence, cli.retries).await?;

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Login { username, password } => {
            app.login(LoginCredentials::new(username, password), &mut out)
                .await?;
        }
        Command::Logout => app.logout(&mut out).await?,
        Command::Status => app.status(&mut out)?,
        Command::Me => app.me(&mut out).await?,
        Command::Search {
            query,
            genres,
            pages,
        } => {
            let filter = genres
                .into_iter()
                .fold(CatalogFilter::search(query), CatalogFilter::with_genre);
            app.search(filter, pages, &mut out).await?;
        }
        Command::Play { episode } => app.play(EpisodeId(episode), &mut out).await?,
    }

    Ok(())
}
