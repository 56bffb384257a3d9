use crate::phase::{SearchEvent, SearchPhase};
use crate::LabSearchBackend;
use lablink_core::{rank_by_distance, GeoPoint, LabSearchParams, LabSearchResult};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Point-in-time view of a [`LabSearch`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabSearchState {
    /// Accumulated results in upstream order.
    pub results: Vec<LabSearchResult>,
    pub loading: bool,
    pub error: Option<String>,
    pub next_page_token: Option<String>,
    pub phase: SearchPhase,
}

#[derive(Debug, Default)]
struct Inner {
    results: Vec<LabSearchResult>,
    next_page_token: Option<String>,
    error: Option<String>,
    phase: SearchPhase,
    /// Parameters of the search that produced `next_page_token`, without the token.
    paged_params: LabSearchParams,
    /// Sequence number of the most recently issued request.
    issued: u64,
}

/// Paged lab search state.
///
/// Each request is numbered when issued; only the response to the latest request is applied,
/// so overlapping searches settle on whatever the caller asked for last. The state lock is
/// never held across an `.await`.
///
/// Failures never escape: they land in [`LabSearchState::error`].
#[derive(Debug)]
pub struct LabSearch<B> {
    backend: B,
    inner: Mutex<Inner>,
}

impl<B: LabSearchBackend> LabSearch<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one search. Without a page token the results are replaced; with one, the page is
    /// appended to what is already held.
    pub async fn search(&self, params: LabSearchParams) {
        let append = params.page_token.is_some();

        let seq = {
            let mut inner = self.lock();
            inner.issued += 1;
            inner.phase = inner.phase.on(SearchEvent::Started { append });
            inner.error = None;
            inner.issued
        };

        let outcome = self.backend.search(&params).await;

        let mut inner = self.lock();
        if seq != inner.issued {
            tracing::debug!(seq, latest = inner.issued, "discarding stale lab search response");
            return;
        }

        match outcome {
            Ok(page) => {
                tracing::debug!(seq, count = page.results.len(), append, "lab search page applied");
                if append {
                    inner.results.extend(page.results);
                } else {
                    inner.results = page.results;
                }
                inner.next_page_token = page.next_page_token;
                inner.paged_params = LabSearchParams {
                    page_token: None,
                    ..params
                };
                inner.phase = inner.phase.on(SearchEvent::Succeeded);
            }
            Err(e) => {
                tracing::error!(seq, "lab search failed: {e}");
                inner.error = Some(e.to_string());
                inner.phase = inner.phase.on(SearchEvent::Failed);
            }
        }
    }

    /// Fetches the next page of the results currently held. Does nothing when there is no
    /// next page or while a request is in flight.
    pub async fn load_more(&self) {
        let params = {
            let inner = self.lock();
            if inner.phase.is_loading() {
                return;
            }
            match &inner.next_page_token {
                Some(token) => inner.paged_params.clone().with_page_token(token.clone()),
                None => return,
            }
        };
        self.search(params).await;
    }

    pub fn snapshot(&self) -> LabSearchState {
        let inner = self.lock();
        LabSearchState {
            results: inner.results.clone(),
            loading: inner.phase.is_loading(),
            error: inner.error.clone(),
            next_page_token: inner.next_page_token.clone(),
            phase: inner.phase,
        }
    }

    /// Held results ordered by distance from `user`; upstream order when `user` is unknown.
    pub fn ranked(&self, user: Option<GeoPoint>) -> Vec<LabSearchResult> {
        let results = self.lock().results.clone();
        rank_by_distance(results, user)
    }

    /// Held results whose name contains `query`, case-insensitively.
    pub fn filter_by_name(&self, query: &str) -> Vec<LabSearchResult> {
        let needle = query.trim().to_lowercase();
        self.lock()
            .results
            .iter()
            .filter(|lab| needle.is_empty() || lab.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientError, ClientResult};
    use async_trait::async_trait;
    use lablink_core::LabSearchPage;
    use std::time::Duration;

    /// Scripted backend: pages keyed by page token, an optional delay per keyword.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<LabSearchParams>>,
    }

    fn lab(id: &str, name: &str, at: Option<(f64, f64)>) -> LabSearchResult {
        let mut lab = LabSearchResult::new(id, name);
        lab.location = at.and_then(|(lat, lng)| GeoPoint::new(lat, lng).ok());
        lab
    }

    #[async_trait]
    impl LabSearchBackend for FakeBackend {
        async fn search(&self, params: &LabSearchParams) -> ClientResult<LabSearchPage> {
            self.calls.lock().expect("lock").push(params.clone());

            let keyword = params.keyword.as_ref().map(|k| k.as_str().to_string());
            match keyword.as_deref() {
                Some("slow") => {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    return Ok(LabSearchPage {
                        results: vec![lab("slow-1", "Slow Lab", None)],
                        next_page_token: None,
                    });
                }
                Some("fast") => {
                    return Ok(LabSearchPage {
                        results: vec![lab("fast-1", "Fast Lab", None)],
                        next_page_token: None,
                    });
                }
                Some("broken") => {
                    return Err(ClientError::Service {
                        status: 502,
                        message: "Failed to fetch places".into(),
                    });
                }
                _ => {}
            }

            Ok(match params.page_token.as_deref() {
                None => LabSearchPage {
                    results: vec![
                        lab("a", "Synlab Ikeja", Some((6.6018, 3.3515))),
                        lab("b", "Clina-Lancet Abuja", Some((9.0765, 7.3986))),
                    ],
                    next_page_token: Some("T".into()),
                },
                Some("T") => LabSearchPage {
                    results: vec![lab("c", "Afriglobal Lagos", Some((6.4281, 3.4219)))],
                    next_page_token: None,
                },
                Some(other) => {
                    return Err(ClientError::Service {
                        status: 400,
                        message: format!("unknown token {other}"),
                    })
                }
            })
        }
    }

    fn hook() -> LabSearch<FakeBackend> {
        LabSearch::new(FakeBackend::default())
    }

    fn calls(search: &LabSearch<FakeBackend>) -> Vec<LabSearchParams> {
        search.backend.calls.lock().expect("lock").clone()
    }

    fn ids(results: &[LabSearchResult]) -> Vec<&str> {
        results.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn starts_idle_and_empty() {
        let state = hook().snapshot();
        assert_eq!(state, LabSearchState::default());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn two_page_scenario_appends_in_order() {
        let search = hook();
        search
            .search(LabSearchParams::in_area(None, Some("Lagos")))
            .await;

        let state = search.snapshot();
        assert_eq!(ids(&state.results), vec!["a", "b"]);
        assert_eq!(state.next_page_token.as_deref(), Some("T"));
        assert_eq!(state.phase, SearchPhase::Idle);

        search.load_more().await;
        let state = search.snapshot();
        assert_eq!(ids(&state.results), vec!["a", "b", "c"]);
        assert_eq!(state.next_page_token, None);

        search.load_more().await;
        assert_eq!(ids(&search.snapshot().results), vec!["a", "b", "c"]);

        let sent = calls(&search);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].page_token.as_deref(), Some("T"));
        assert_eq!(sent[1].state, sent[0].state);
    }

    #[tokio::test]
    async fn new_search_replaces_results() {
        let search = hook();
        search
            .search(LabSearchParams::in_area(None, Some("Lagos")))
            .await;
        search.search(LabSearchParams::keyword("fast")).await;
        assert_eq!(ids(&search.snapshot().results), vec!["fast-1"]);
    }

    #[tokio::test]
    async fn load_more_without_token_is_a_no_op() {
        let search = hook();
        search.load_more().await;
        assert!(calls(&search).is_empty());

        search.search(LabSearchParams::keyword("fast")).await;
        search.load_more().await;
        assert_eq!(calls(&search).len(), 1);
        assert_eq!(ids(&search.snapshot().results), vec!["fast-1"]);
    }

    #[tokio::test]
    async fn failure_is_captured_and_previous_results_kept() {
        let search = hook();
        search
            .search(LabSearchParams::in_area(None, Some("Lagos")))
            .await;
        search.search(LabSearchParams::keyword("broken")).await;

        let state = search.snapshot();
        assert_eq!(state.phase, SearchPhase::Error);
        assert_eq!(state.error.as_deref(), Some("Failed to fetch places"));
        assert!(!state.loading);
        assert_eq!(ids(&state.results), vec!["a", "b"]);

        search.search(LabSearchParams::keyword("fast")).await;
        let state = search.snapshot();
        assert_eq!(state.error, None);
        assert_eq!(state.phase, SearchPhase::Idle);
    }

    #[tokio::test]
    async fn load_more_after_failed_search_continues_held_results() {
        let search = hook();
        search
            .search(LabSearchParams::in_area(None, Some("Lagos")))
            .await;
        search.search(LabSearchParams::keyword("broken")).await;
        search.load_more().await;

        let sent = calls(&search);
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].keyword, None);
        assert_eq!(sent[2].state, sent[0].state);
        assert_eq!(sent[2].page_token.as_deref(), Some("T"));

        let state = search.snapshot();
        assert_eq!(ids(&state.results), vec!["a", "b", "c"]);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn load_more_waits_out_a_fresh_search() {
        let search = hook();
        search
            .search(LabSearchParams::in_area(None, Some("Lagos")))
            .await;

        tokio::join!(search.search(LabSearchParams::keyword("slow")), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            search.load_more().await;
        });

        let state = search.snapshot();
        assert_eq!(ids(&state.results), vec!["slow-1"]);
        assert_eq!(state.phase, SearchPhase::Idle);
        assert_eq!(state.next_page_token, None);
        assert_eq!(calls(&search).len(), 2);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let search = hook();

        tokio::join!(search.search(LabSearchParams::keyword("slow")), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            search.search(LabSearchParams::keyword("fast")).await;
        });

        let state = search.snapshot();
        assert_eq!(ids(&state.results), vec!["fast-1"]);
        assert_eq!(state.phase, SearchPhase::Idle);
        assert_eq!(calls(&search).len(), 2);
    }

    #[tokio::test]
    async fn loading_while_in_flight() {
        let search = hook();
        tokio::join!(search.search(LabSearchParams::keyword("slow")), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let state = search.snapshot();
            assert!(state.loading);
            assert_eq!(state.phase, SearchPhase::Searching);
        });
        assert!(!search.snapshot().loading);
    }

    #[tokio::test]
    async fn ranked_and_filtered_views() {
        let search = hook();
        search
            .search(LabSearchParams::in_area(None, Some("Lagos")))
            .await;
        search.load_more().await;

        let abuja = GeoPoint::new(9.0765, 7.3986).expect("point");
        let ranked = search.ranked(Some(abuja));
        assert_eq!(ranked[0].id, "b");
        assert!(ranked.iter().all(|l| l.distance_km.is_some()));

        assert_eq!(ids(&search.ranked(None)), vec!["a", "b", "c"]);
        assert_eq!(ids(&search.filter_by_name("LAGOS")), vec!["c"]);
        assert_eq!(search.filter_by_name("").len(), 3);
    }
}
