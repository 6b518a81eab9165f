//! Catalog entities returned by the streaming backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A catalog entry as shown in list screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeSummary {
    /// Backend identifier.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Number of released episodes, if known.
    #[serde(default)]
    pub episodes: Option<u32>,
    /// Cover image URL.
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// Filter applied to the catalog list endpoint.
///
/// Used as pager criteria: two filters are the same sequence iff they are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Free-text search; empty lists everything.
    #[serde(default)]
    pub query: String,
    /// Genre slugs every result must have.
    #[serde(default)]
    pub genres: Vec<String>,
}

impl CatalogFilter {
    /// Creates a text search filter.
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            genres: Vec::new(),
        }
    }

    /// Restricts the filter to a genre.
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }
}

/// Profile of the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account identifier.
    pub id: u64,
    /// Display name.
    pub username: String,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Identifier of a single episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(pub u64);

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved, playable media location handed to the video engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    /// Media URL (HLS playlist or progressive file).
    pub url: String,
    /// Quality label, e.g. `1080p`.
    #[serde(default)]
    pub quality: Option<String>,
}
