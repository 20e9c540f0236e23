//! Types for the search aggregation pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Content category a search is scoped to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Games,
    Movies,
}

impl Category {
    /// All known categories, in display order.
    pub const ALL: [Category; 2] = [Category::Games, Category::Movies];

    /// Returns the string representation used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Games => "games",
            Category::Movies => "movies",
        }
    }

    /// Parse a wire category. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-initiated search. Immutable once dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    text: String,
    category: Category,
}

impl SearchQuery {
    /// Create a query, rejecting empty text. Whitespace is passed through
    /// untouched; providers decide what it matches.
    pub fn new(text: impl Into<String>, category: Category) -> Result<Self, SearchError> {
        let text = text.into();
        if text.is_empty() {
            return Err(SearchError::MissingQuery);
        }
        Ok(Self { text, category })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// How a link behaves when the user activates it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// `magnet:` URI, handed to the registered OS handler.
    Magnet,
    /// URL of a `.torrent` file to download.
    TorrentFile,
    /// Anything else; opened in a new browsing context.
    Redirect,
}

/// A classified download link.
///
/// On the wire a link is its plain URL string. Deserializing classifies it,
/// so each side of the wire inspects the raw string exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Link {
    url: String,
    kind: LinkKind,
}

impl Link {
    /// Classify a raw URL by its scheme and suffix.
    pub fn classify(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = if has_magnet_scheme(&url) {
            LinkKind::Magnet
        } else if has_torrent_suffix(&url) {
            LinkKind::TorrentFile
        } else {
            LinkKind::Redirect
        };
        Self { url, kind }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }
}

impl From<String> for Link {
    fn from(url: String) -> Self {
        Link::classify(url)
    }
}

impl From<Link> for String {
    fn from(link: Link) -> Self {
        link.url
    }
}

fn has_magnet_scheme(url: &str) -> bool {
    url.get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("magnet:"))
}

fn has_torrent_suffix(url: &str) -> bool {
    // Query strings and fragments don't count toward the suffix.
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    path.to_ascii_lowercase().ends_with(".torrent")
}

/// A provider hit mapped into the unified schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub title: String,
    /// Hostname of `page`, or "unknown".
    pub provider: String,
    pub page: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub links: Vec<Link>,
}

/// Errors surfaced by the search pipeline.
///
/// Provider-level failures never appear here; they are isolated per provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing search query")]
    MissingQuery,

    #[error("Aggregation failed: {0}")]
    Aggregation(String),
}
