//! Link activation.
//!
//! Magnet links are handed to the OS handler, `.torrent` URLs are downloaded
//! into the download directory, and anything else is opened separately.
//! Activation never fails from the caller's point of view: errors are logged.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;
use thiserror::Error;
use tordemand_core::{Link, LinkKind};
use tracing::{debug, info, warn};
use url::Url;

/// Save-as name used when the URL does not carry one.
pub const DEFAULT_TORRENT_NAME: &str = "file.torrent";

const TORRENT_EXTENSION: &str = ".torrent";

/// Upper bound on a torrent file download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Numbered names tried before giving up on a crowded download directory.
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to open {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Torrent download failed: {0}")]
    Fetch(String),

    #[error("Torrent download returned HTTP {0}")]
    Status(u16),

    #[error("Torrent download timed out")]
    Timeout,

    #[error("Failed to save torrent file: {0}")]
    Io(#[from] io::Error),
}

/// Where activating a link leads.
///
/// Implementations may block; the dispatcher calls them off the async runtime.
pub trait Navigator: Send + Sync {
    /// Replace the current context with `url`.
    fn navigate(&self, url: &str) -> Result<(), DispatchError>;

    /// Open `url` without touching the current context.
    fn open_new_context(&self, url: &str) -> Result<(), DispatchError>;
}

/// [`Navigator`] backed by the OS default handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
    fn navigate(&self, url: &str) -> Result<(), DispatchError> {
        open::that_detached(url).map_err(|source| DispatchError::Navigation {
            url: url.to_string(),
            source,
        })
    }

    fn open_new_context(&self, url: &str) -> Result<(), DispatchError> {
        open::that_detached(url).map_err(|source| DispatchError::Navigation {
            url: url.to_string(),
            source,
        })
    }
}

/// What an activation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Navigated,
    OpenedNewContext,
    Saved(PathBuf),
}

pub struct LinkDispatcher {
    client: reqwest::Client,
    navigator: Arc<dyn Navigator>,
    download_dir: PathBuf,
}

impl LinkDispatcher {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        download_dir: impl Into<PathBuf>,
    ) -> Result<Self, DispatchError> {
        Self::with_fetch_timeout(navigator, download_dir, DEFAULT_FETCH_TIMEOUT)
    }

    /// Dispatcher whose torrent downloads give up after `timeout`.
    pub fn with_fetch_timeout(
        navigator: Arc<dyn Navigator>,
        download_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            navigator,
            download_dir: download_dir.into(),
        })
    }

    /// Dispatcher using the OS handlers.
    pub fn system(download_dir: impl Into<PathBuf>) -> Result<Self, DispatchError> {
        Self::new(Arc::new(SystemNavigator), download_dir)
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Activate a link, logging any failure.
    pub async fn activate(&self, link: &Link) {
        match self.try_activate(link).await {
            Ok(activation) => debug!(url = %link.url(), ?activation, "Link activated"),
            Err(e) => warn!(url = %link.url(), kind = ?link.kind(), error = %e, "Failed to activate link"),
        }
    }

    /// Activate a link, returning what happened.
    pub async fn try_activate(&self, link: &Link) -> Result<Activation, DispatchError> {
        match link.kind() {
            LinkKind::Magnet => {
                self.hand_off(link.url(), |nav, url| nav.navigate(url)).await?;
                Ok(Activation::Navigated)
            }
            LinkKind::TorrentFile => {
                let path = self.download_torrent(link.url()).await?;
                Ok(Activation::Saved(path))
            }
            LinkKind::Redirect => {
                self.hand_off(link.url(), |nav, url| nav.open_new_context(url))
                    .await?;
                Ok(Activation::OpenedNewContext)
            }
        }
    }

    /// Run a navigator call on the blocking pool.
    async fn hand_off<F>(&self, url: &str, call: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&dyn Navigator, &str) -> Result<(), DispatchError> + Send + 'static,
    {
        let navigator = Arc::clone(&self.navigator);
        let url = url.to_string();
        tokio::task::spawn_blocking(move || call(navigator.as_ref(), &url))
            .await
            .map_err(|e| DispatchError::Io(io::Error::other(e)))?
    }

    async fn download_torrent(&self, url: &str) -> Result<PathBuf, DispatchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(fetch_error)?;

        let dir = self.download_dir.clone();
        let name = torrent_file_name(url);
        let saved = tokio::task::spawn_blocking(move || save_staged(&dir, &name, &bytes))
            .await
            .map_err(|e| DispatchError::Io(io::Error::other(e)))??;

        info!(path = %saved.display(), "Torrent file saved");
        Ok(saved)
    }
}

fn fetch_error(e: reqwest::Error) -> DispatchError {
    if e.is_timeout() {
        DispatchError::Timeout
    } else {
        DispatchError::Fetch(e.to_string())
    }
}

/// Write `bytes` to a temp file in `dir`, then move it to `name`, or to the
/// first free numbered variant if `name` is taken. Existing files are never
/// replaced. The temp file is removed on every early return.
fn save_staged(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, DispatchError> {
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let target = dir.join(numbered_name(name, attempt));
        match staged.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => staged = e.file,
            Err(e) => return Err(e.error.into()),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for {}", name),
    )
    .into())
}

/// `game.torrent`, then `game (1).torrent`, `game (2).torrent`, ...
fn numbered_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    let (stem, extension) = name.split_at(name.len() - TORRENT_EXTENSION.len());
    format!("{} ({}){}", stem, attempt, extension)
}

/// Last path segment when it names a `.torrent` file, else [`DEFAULT_TORRENT_NAME`].
pub fn torrent_file_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(str::to_string)
        })
        .filter(|name| {
            name.len() > TORRENT_EXTENSION.len()
                && name.to_ascii_lowercase().ends_with(TORRENT_EXTENSION)
                && !name.contains('\\')
        })
        .unwrap_or_else(|| DEFAULT_TORRENT_NAME.to_string())
}
