//! Drives a [`SearchSession`] through a search.
//!
//! The controller owns the session inside a `watch` channel so a UI can
//! render every state change. A search runs as one async call to
//! [`SearchController::submit`]; its exit delay, entrance pre-roll and
//! request all race against supersession, so starting a newer search
//! cancels the older one outright.

use std::time::Duration;

use tokio::sync::watch;
use tordemand_core::{Category, SearchQuery};
use tracing::{debug, info, warn};

use crate::backend::{SearchBackend, TransportError};
use crate::session::{SearchSession, SessionToken, Transition};

/// Message shown when a search fails; the cause is only logged.
pub const SEARCH_FAILED: &str = "Search failed";

/// Fixed delays of the results transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTimings {
    /// Fade-out of the previous results.
    pub exit: Duration,
    /// Pre-roll after clearing, before the request is issued.
    pub entry: Duration,
    /// Upper bound on the request itself.
    pub request_timeout: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            exit: Duration::from_millis(300),
            entry: Duration::from_millis(300),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Why a submission did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyQuery,
    /// A search is already searching or loading.
    Busy,
}

/// How a call to [`SearchController::submit`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    /// A newer search took over before this one finished.
    Superseded,
    /// Results are displayed; carries their count.
    Ready(usize),
    Failed,
}

pub struct SearchController<B> {
    backend: B,
    timings: TransitionTimings,
    session: watch::Sender<SearchSession>,
}

impl<B: SearchBackend> SearchController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_timings(backend, TransitionTimings::default())
    }

    pub fn with_timings(backend: B, timings: TransitionTimings) -> Self {
        let (session, _) = watch::channel(SearchSession::new());
        Self {
            backend,
            timings,
            session,
        }
    }

    /// Receive every session change, starting from the current one.
    pub fn subscribe(&self) -> watch::Receiver<SearchSession> {
        self.session.subscribe()
    }

    /// Current session value.
    pub fn snapshot(&self) -> SearchSession {
        self.session.borrow().clone()
    }

    pub fn timings(&self) -> TransitionTimings {
        self.timings
    }

    /// Run a search triggered by the user. Ignored while another search is
    /// searching or loading.
    pub async fn submit(&self, text: &str, category: Category) -> SubmitOutcome {
        let Some(query) = user_query(text, category) else {
            return SubmitOutcome::Ignored(IgnoreReason::EmptyQuery);
        };

        let mut token = None;
        self.session.send_if_modified(|session| {
            token = session.begin(query.clone());
            token.is_some()
        });

        match token {
            Some(token) => self.run(token, query).await,
            None => {
                debug!(query = %text, "Search already in progress, ignoring submit");
                SubmitOutcome::Ignored(IgnoreReason::Busy)
            }
        }
    }

    /// Run a search even if one is in progress, cancelling it.
    pub async fn restart(&self, text: &str, category: Category) -> SubmitOutcome {
        let Some(query) = user_query(text, category) else {
            return SubmitOutcome::Ignored(IgnoreReason::EmptyQuery);
        };

        let mut token = SessionToken::default();
        self.session.send_modify(|session| {
            token = session.supersede(query.clone());
        });

        self.run(token, query).await
    }

    async fn run(&self, token: SessionToken, query: SearchQuery) -> SubmitOutcome {
        info!(
            token = token.value(),
            category = %query.category(),
            query = %query.text(),
            "Search started"
        );

        if self.apply(|s| s.begin_exit(token)).is_applied() {
            if !self.pause(token, self.timings.exit).await {
                return SubmitOutcome::Superseded;
            }
            if self.apply(|s| s.clear_for_entry(token)) == Transition::Stale {
                return SubmitOutcome::Superseded;
            }
            if !self.pause(token, self.timings.entry).await {
                return SubmitOutcome::Superseded;
            }
        }

        if !self.apply(|s| s.start_loading(token)).is_applied() {
            return SubmitOutcome::Superseded;
        }

        let response = tokio::select! {
            response = tokio::time::timeout(self.timings.request_timeout, self.backend.search(&query)) => {
                response.unwrap_or(Err(TransportError::Timeout))
            }
            _ = self.superseded(token) => {
                debug!(token = token.value(), "Request cancelled by a newer search");
                return SubmitOutcome::Superseded;
            }
        };

        match response {
            Ok(results) => {
                let count = results.len();
                match self.apply(|s| s.complete(token, results)) {
                    Transition::Applied => {
                        info!(token = token.value(), results = count, "Search completed");
                        SubmitOutcome::Ready(count)
                    }
                    _ => SubmitOutcome::Superseded,
                }
            }
            Err(e) => {
                warn!(token = token.value(), error = %e, "Search request failed");
                match self.apply(|s| s.fail(token, SEARCH_FAILED)) {
                    Transition::Applied => SubmitOutcome::Failed,
                    _ => SubmitOutcome::Superseded,
                }
            }
        }
    }

    /// Apply a transition, notifying subscribers only if it changed the session.
    fn apply(&self, transition: impl FnOnce(&mut SearchSession) -> Transition) -> Transition {
        let mut outcome = Transition::Rejected;
        self.session.send_if_modified(|session| {
            outcome = transition(session);
            outcome.is_applied()
        });
        if outcome == Transition::Stale {
            debug!("Discarding transition of a superseded search");
        }
        outcome
    }

    /// Wait `delay` unless a newer search starts first. Returns whether the
    /// search is still current.
    async fn pause(&self, token: SessionToken, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.superseded(token) => false,
        }
    }

    /// Resolves once the session no longer belongs to `token`.
    async fn superseded(&self, token: SessionToken) {
        let mut rx = self.session.subscribe();
        let changed = rx.wait_for(|session| session.token() != token).await.is_ok();
        if !changed {
            // The sender lives as long as `self`.
            std::future::pending::<()>().await;
        }
    }
}

/// A search box holding only whitespace does not trigger a search.
fn user_query(text: &str, category: Category) -> Option<SearchQuery> {
    if text.trim().is_empty() {
        return None;
    }
    SearchQuery::new(text, category).ok()
}
