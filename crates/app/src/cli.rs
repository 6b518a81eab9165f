//! Command-line arguments.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse and watch anime from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Retry a recoverable failure up to this many times
    #[arg(long, global = true, default_value_t = 0)]
    pub retries: u32,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login {
        /// Account name or e-mail
        username: String,
        /// Account password
        #[arg(long, env = "ANISTREAM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Show the logged-in profile
    Me,
    /// Search the catalog
    Search {
        /// Text to search for; empty lists everything
        #[arg(default_value = "")]
        query: String,
        /// Only titles with this genre (repeatable)
        #[arg(long = "genre")]
        genres: Vec<String>,
        /// Number of pages to show
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print the stream URL of an episode
    Play {
        /// Episode identifier
        episode: u64,
    },
}
