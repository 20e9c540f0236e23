//! Client-side search session state machine.
//!
//! A [`SearchSession`] is the record of the latest user-initiated search.
//! Every mutation goes through a named transition that carries the
//! [`SessionToken`] handed out when the search began; a transition issued
//! with an older token is stale and leaves the session untouched.

use serde::Serialize;
use std::fmt;
use tordemand_core::{CanonicalResult, SearchQuery};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Searching,
    /// Outgoing results are fading out.
    TransitioningOut,
    Loading,
    Ready,
    Error,
}

impl SessionStatus {
    /// Whether a search is in progress and new submissions are ignored.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionStatus::Searching | SessionStatus::Loading)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Searching => "searching",
            SessionStatus::TransitioningOut => "transitioning_out",
            SessionStatus::Loading => "loading",
            SessionStatus::Ready => "ready",
            SessionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Identifies one search within a session's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Outcome of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The token belongs to a superseded search; nothing changed.
    Stale,
    /// The transition is not valid from the current status; nothing changed.
    Rejected,
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

/// A result as rendered, with a key unique within its result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayResult {
    pub key: String,
    #[serde(flatten)]
    pub result: CanonicalResult,
}

/// The state of the latest search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSession {
    token: SessionToken,
    status: SessionStatus,
    query: Option<SearchQuery>,
    results: Vec<DisplayResult>,
    error: Option<String>,
    searched: bool,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            token: SessionToken::default(),
            status: SessionStatus::Idle,
            query: None,
            results: Vec::new(),
            error: None,
            searched: false,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn results(&self) -> &[DisplayResult] {
        &self.results
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    /// Flat, user-facing message of the last failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether any search was ever started. The landing logo is hidden after
    /// the first one.
    pub fn has_searched(&self) -> bool {
        self.searched
    }

    /// Start a new search unless one is already searching or loading.
    ///
    /// Results of the previous search stay visible until they are faded out.
    pub fn begin(&mut self, query: SearchQuery) -> Option<SessionToken> {
        if self.status.is_busy() {
            return None;
        }
        Some(self.supersede(query))
    }

    /// Start a new search unconditionally. Whatever search was in flight
    /// becomes stale.
    pub fn supersede(&mut self, query: SearchQuery) -> SessionToken {
        self.token = SessionToken(self.token.0 + 1);
        self.status = SessionStatus::Searching;
        self.query = Some(query);
        self.error = None;
        self.searched = true;
        self.token
    }

    /// searching -> transitioningOut, only while previous results are shown.
    pub fn begin_exit(&mut self, token: SessionToken) -> Transition {
        if token != self.token {
            return Transition::Stale;
        }
        if self.status != SessionStatus::Searching || self.results.is_empty() {
            return Transition::Rejected;
        }
        self.status = SessionStatus::TransitioningOut;
        Transition::Applied
    }

    /// Drop the faded-out results ahead of the entrance pre-roll.
    pub fn clear_for_entry(&mut self, token: SessionToken) -> Transition {
        if token != self.token {
            return Transition::Stale;
        }
        if self.status != SessionStatus::TransitioningOut {
            return Transition::Rejected;
        }
        self.results.clear();
        Transition::Applied
    }

    /// Enter `loading` right before the request is issued.
    pub fn start_loading(&mut self, token: SessionToken) -> Transition {
        if token != self.token {
            return Transition::Stale;
        }
        match self.status {
            SessionStatus::Searching if self.results.is_empty() => {}
            SessionStatus::TransitioningOut if self.results.is_empty() => {}
            _ => return Transition::Rejected,
        }
        self.status = SessionStatus::Loading;
        Transition::Applied
    }

    /// loading -> ready, keying each result by query text and position.
    pub fn complete(&mut self, token: SessionToken, results: Vec<CanonicalResult>) -> Transition {
        if token != self.token {
            return Transition::Stale;
        }
        if self.status != SessionStatus::Loading {
            return Transition::Rejected;
        }
        let text = self.query.as_ref().map(SearchQuery::text).unwrap_or_default();
        self.results = results
            .into_iter()
            .enumerate()
            .map(|(idx, result)| DisplayResult {
                key: format!("{}-{}", text, idx),
                result,
            })
            .collect();
        self.status = SessionStatus::Ready;
        Transition::Applied
    }

    /// loading -> error. Results are reset; nothing is retried.
    pub fn fail(&mut self, token: SessionToken, message: impl Into<String>) -> Transition {
        if token != self.token {
            return Transition::Stale;
        }
        if self.status != SessionStatus::Loading {
            return Transition::Rejected;
        }
        self.results.clear();
        self.error = Some(message.into());
        self.status = SessionStatus::Error;
        Transition::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tordemand_core::{Category, Link};

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(text, Category::Games).unwrap()
    }

    fn result(title: &str) -> CanonicalResult {
        CanonicalResult {
            title: title.to_string(),
            provider: "a.example".to_string(),
            page: "https://a.example/p".to_string(),
            kind: "game".to_string(),
            links: vec![Link::classify("magnet:?xt=1")],
        }
    }

    /// A session in `ready` holding the given results.
    fn ready_session(text: &str, titles: &[&str]) -> (SearchSession, SessionToken) {
        let mut session = SearchSession::new();
        let token = session.begin(query(text)).unwrap();
        assert_eq!(session.start_loading(token), Transition::Applied);
        let results = titles.iter().map(|t| result(t)).collect();
        assert_eq!(session.complete(token, results), Transition::Applied);
        (session, token)
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = SearchSession::new();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(!session.has_results());
        assert!(!session.has_searched());
        assert!(session.query().is_none());
    }

    #[test]
    fn test_first_search_skips_exit_transition() {
        let mut session = SearchSession::new();
        let token = session.begin(query("zelda")).unwrap();
        assert_eq!(session.status(), SessionStatus::Searching);
        assert!(session.has_searched());

        assert_eq!(session.begin_exit(token), Transition::Rejected);
        assert_eq!(session.start_loading(token), Transition::Applied);
        assert_eq!(session.status(), SessionStatus::Loading);
    }

    #[test]
    fn test_complete_assigns_keys_by_query_and_position() {
        let (session, _) = ready_session("zelda", &["Zelda", "Zelda"]);
        assert_eq!(session.status(), SessionStatus::Ready);

        let keys: Vec<_> = session.results().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["zelda-0", "zelda-1"]);
    }

    #[test]
    fn test_begin_is_ignored_while_busy() {
        let mut session = SearchSession::new();
        let token = session.begin(query("zelda")).unwrap();
        assert!(session.begin(query("mario")).is_none());

        session.start_loading(token);
        assert!(session.begin(query("mario")).is_none());
        assert_eq!(session.query().unwrap().text(), "zelda");
    }

    #[test]
    fn test_second_search_fades_out_previous_results() {
        let (mut session, _) = ready_session("zelda", &["Zelda"]);

        let token = session.begin(query("mario")).unwrap();
        // Previous results stay visible while fading.
        assert!(session.has_results());
        assert_eq!(session.start_loading(token), Transition::Rejected);

        assert_eq!(session.begin_exit(token), Transition::Applied);
        assert_eq!(session.status(), SessionStatus::TransitioningOut);
        assert_eq!(session.start_loading(token), Transition::Rejected);

        assert_eq!(session.clear_for_entry(token), Transition::Applied);
        assert!(!session.has_results());
        assert_eq!(session.start_loading(token), Transition::Applied);

        session.complete(token, vec![result("Mario")]);
        assert_eq!(session.results()[0].key, "mario-0");
    }

    #[test]
    fn test_fail_clears_results_and_records_message() {
        let mut session = SearchSession::new();
        let token = session.begin(query("zelda")).unwrap();
        session.start_loading(token);

        assert_eq!(session.fail(token, "Search failed"), Transition::Applied);
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.error(), Some("Search failed"));
        assert!(!session.has_results());

        // A new search clears the error.
        session.begin(query("zelda")).unwrap();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_stale_token_is_discarded() {
        let mut session = SearchSession::new();
        let first = session.begin(query("zelda")).unwrap();
        session.start_loading(first);

        let second = session.supersede(query("mario"));
        assert!(second > first);
        session.start_loading(second);
        assert_eq!(session.complete(second, vec![result("Mario")]), Transition::Applied);

        // The first response arrives last and must not overwrite anything.
        assert_eq!(session.complete(first, vec![result("Zelda")]), Transition::Stale);
        assert_eq!(session.fail(first, "Search failed"), Transition::Stale);
        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.results()[0].result.title, "Mario");
        assert_eq!(session.query().unwrap().text(), "mario");
    }

    #[test]
    fn test_transitions_rejected_out_of_order() {
        let mut session = SearchSession::new();
        let token = session.begin(query("zelda")).unwrap();

        assert_eq!(session.complete(token, vec![]), Transition::Rejected);
        assert_eq!(session.fail(token, "x"), Transition::Rejected);
        assert_eq!(session.clear_for_entry(token), Transition::Rejected);
        assert_eq!(session.status(), SessionStatus::Searching);
    }

    #[test]
    fn test_ready_session_can_start_again() {
        let (mut session, first) = ready_session("zelda", &[]);
        let second = session.begin(query("zelda")).unwrap();
        assert_ne!(first, second);
        assert_eq!(session.start_loading(second), Transition::Applied);
    }

    #[test]
    fn test_display_result_serializes_flat() {
        let (session, _) = ready_session("zelda", &["Zelda"]);
        let json = serde_json::to_value(&session.results()[0]).unwrap();
        assert_eq!(json["key"], "zelda-0");
        assert_eq!(json["title"], "Zelda");
        assert_eq!(json["type"], "game");
        assert_eq!(json["links"][0], "magnet:?xt=1");
    }
}
