//! The search/pagination state machine.
//!
//! The controller owns the query parameters, the page cursor, the accumulated
//! result list and the loading/exhaustion flags. It performs no I/O:
//! `submit_query` and `load_more` return a [`FetchRequest`] describing the
//! HTTP call to make, and [`SearchController::apply`] consumes the
//! [`FetchOutcome`] when it arrives. Stale responses are discarded by
//! comparing the outcome's generation token against the current one.

use tracing::{debug, info, warn};

use crate::api_client::Volume;
use crate::search::params::{SearchParams, PAGE_SIZE};

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No results for the current parameters and no fetch in flight.
    Idle,
    /// Exactly one fetch in flight.
    Loading,
    /// A full page arrived; more pages may exist.
    Loaded,
    /// A short page arrived; no further pages for this query.
    Exhausted,
}

/// A fetch the caller should dispatch to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Generation token at dispatch time. Outcomes carrying an older
    /// generation are discarded on arrival.
    pub generation: u64,
    /// 1-based page being requested.
    pub page: usize,
    /// `(page - 1) * PAGE_SIZE`; page 1 starts at index 0.
    pub start_index: usize,
    pub params: SearchParams,
}

/// What the fetch produced.
#[derive(Debug, Clone)]
pub enum FetchResult {
    Page(Vec<Volume>),
    Failed(String),
}

/// A completed fetch, tagged with the request it answers.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub generation: u64,
    pub page: usize,
    pub result: FetchResult,
}

pub struct SearchController {
    params: SearchParams,
    /// Last requested page for the current query, >= 1.
    page: usize,
    items: Vec<Volume>,
    state: SearchState,
    generation: u64,
}

impl SearchController {
    pub fn new() -> Self {
        Self {
            params: SearchParams::default(),
            page: 1,
            items: Vec::new(),
            state: SearchState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn items(&self) -> &[Volume] {
        &self.items
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.state == SearchState::Loading
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == SearchState::Exhausted
    }

    /// Whether the load-more affordance should be offered at all.
    pub fn can_load_more(&self) -> bool {
        self.state == SearchState::Loaded
    }

    /// Start a fresh query. Every parameter change funnels through here.
    ///
    /// The accumulator is cleared and the cursor reset unconditionally; the
    /// generation bump logically cancels any fetch still in flight. An empty
    /// term issues no request and leaves the controller idle with an empty
    /// result list.
    pub fn submit_query(&mut self, params: SearchParams) -> Option<FetchRequest> {
        self.generation += 1;
        self.params = params;
        self.page = 1;
        self.items.clear();

        if self.params.is_empty() {
            debug!(target: "search", "empty term, clearing results without fetch");
            self.state = SearchState::Idle;
            return None;
        }

        info!(
            target: "search",
            "new query term={:?} category={} sort={} gen={}",
            self.params.term, self.params.category, self.params.sort, self.generation
        );
        self.state = SearchState::Loading;
        Some(self.request_for(1))
    }

    /// Request the next page. No-op unless a full page was previously loaded:
    /// while loading there is already a fetch in flight, and once exhausted
    /// there is nothing left to request.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.state != SearchState::Loaded {
            debug!(target: "search", "load_more ignored in state {:?}", self.state);
            return None;
        }

        self.page += 1;
        self.state = SearchState::Loading;
        debug!(target: "search", "loading page {} gen={}", self.page, self.generation);
        Some(self.request_for(self.page))
    }

    /// Apply a completed fetch. Outcomes from a superseded generation are
    /// discarded without touching state.
    pub fn apply(&mut self, outcome: FetchOutcome) {
        if outcome.generation != self.generation {
            debug!(
                target: "search",
                "discarding stale response gen={} (current {})",
                outcome.generation, self.generation
            );
            return;
        }

        match outcome.result {
            FetchResult::Page(volumes) => {
                let short_page = volumes.len() < PAGE_SIZE;
                info!(
                    target: "search",
                    "page {} arrived with {} items{}",
                    outcome.page,
                    volumes.len(),
                    if short_page { " (end of results)" } else { "" }
                );
                if outcome.page <= 1 {
                    self.items = volumes;
                } else {
                    self.items.extend(volumes);
                }
                self.state = if short_page {
                    SearchState::Exhausted
                } else {
                    SearchState::Loaded
                };
            }
            FetchResult::Failed(err) => {
                warn!(target: "search", "page {} fetch failed: {}", outcome.page, err);
                // Keep the accumulator as last-known-good and roll the cursor
                // back so a later load-more retargets the failed page.
                if self.page > 1 {
                    self.page -= 1;
                }
                self.state = if self.items.is_empty() {
                    SearchState::Idle
                } else {
                    SearchState::Loaded
                };
            }
        }
    }

    fn request_for(&self, page: usize) -> FetchRequest {
        FetchRequest {
            generation: self.generation,
            page,
            start_index: (page - 1) * PAGE_SIZE,
            params: self.params.clone(),
        }
    }
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::params::Category;

    fn volumes(n: usize) -> Vec<Volume> {
        (0..n)
            .map(|i| Volume {
                id: format!("vol-{i}"),
                ..Default::default()
            })
            .collect()
    }

    fn page_outcome(req: &FetchRequest, count: usize) -> FetchOutcome {
        FetchOutcome {
            generation: req.generation,
            page: req.page,
            result: FetchResult::Page(volumes(count)),
        }
    }

    #[test]
    fn test_empty_term_clears_without_fetch() {
        let mut ctl = SearchController::new();
        let req = ctl.submit_query(SearchParams::new("dune")).unwrap();
        ctl.apply(page_outcome(&req, PAGE_SIZE));
        assert_eq!(ctl.items().len(), PAGE_SIZE);

        assert!(ctl.submit_query(SearchParams::new("")).is_none());
        assert_eq!(ctl.state(), SearchState::Idle);
        assert!(ctl.items().is_empty());
        assert_eq!(ctl.page(), 1);
    }

    #[test]
    fn test_full_page_leaves_more_available() {
        let mut ctl = SearchController::new();
        let req = ctl.submit_query(SearchParams::new("dune")).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.start_index, 0);
        assert_eq!(ctl.state(), SearchState::Loading);

        ctl.apply(page_outcome(&req, PAGE_SIZE));
        assert_eq!(ctl.state(), SearchState::Loaded);
        assert!(!ctl.is_exhausted());
    }

    #[test]
    fn test_short_page_exhausts() {
        let mut ctl = SearchController::new();
        let req = ctl.submit_query(SearchParams::new("dune")).unwrap();
        ctl.apply(page_outcome(&req, 12));
        assert_eq!(ctl.state(), SearchState::Exhausted);
        assert!(ctl.load_more().is_none());
    }

    #[test]
    fn test_load_more_noop_while_loading() {
        let mut ctl = SearchController::new();
        let _req = ctl.submit_query(SearchParams::new("dune")).unwrap();
        assert!(ctl.is_loading());
        assert!(ctl.load_more().is_none());
    }

    #[test]
    fn test_stale_generation_discarded() {
        let mut ctl = SearchController::new();
        let old_req = ctl.submit_query(SearchParams::new("dune")).unwrap();
        let new_req = ctl.submit_query(SearchParams::new("foundation")).unwrap();
        assert!(new_req.generation > old_req.generation);

        // Old response arrives after the new query started.
        ctl.apply(page_outcome(&old_req, PAGE_SIZE));
        assert!(ctl.items().is_empty());
        assert_eq!(ctl.state(), SearchState::Loading);

        ctl.apply(page_outcome(&new_req, 5));
        assert_eq!(ctl.items().len(), 5);
        assert_eq!(ctl.state(), SearchState::Exhausted);
    }

    #[test]
    fn test_category_change_resets() {
        let mut ctl = SearchController::new();
        let req = ctl.submit_query(SearchParams::new("rome")).unwrap();
        ctl.apply(page_outcome(&req, PAGE_SIZE));
        assert_eq!(ctl.items().len(), PAGE_SIZE);

        let params = SearchParams::new("rome").with_category(Category::History);
        let req = ctl.submit_query(params).unwrap();
        assert!(ctl.items().is_empty());
        assert_eq!(ctl.page(), 1);
        assert_eq!(req.params.category, Category::History);
        assert_eq!(req.start_index, 0);
    }

    #[test]
    fn test_failure_keeps_last_known_good() {
        let mut ctl = SearchController::new();
        let req = ctl.submit_query(SearchParams::new("dune")).unwrap();
        ctl.apply(page_outcome(&req, PAGE_SIZE));

        let req2 = ctl.load_more().unwrap();
        assert_eq!(req2.page, 2);
        ctl.apply(FetchOutcome {
            generation: req2.generation,
            page: req2.page,
            result: FetchResult::Failed("timeout".to_string()),
        });

        assert_eq!(ctl.items().len(), PAGE_SIZE);
        assert_eq!(ctl.state(), SearchState::Loaded);
        // Cursor rolled back: retry targets page 2 again.
        let retry = ctl.load_more().unwrap();
        assert_eq!(retry.page, 2);
        assert_eq!(retry.start_index, PAGE_SIZE);
    }

    #[test]
    fn test_first_page_failure_returns_to_idle() {
        let mut ctl = SearchController::new();
        let req = ctl.submit_query(SearchParams::new("dune")).unwrap();
        ctl.apply(FetchOutcome {
            generation: req.generation,
            page: req.page,
            result: FetchResult::Failed("connection refused".to_string()),
        });
        assert_eq!(ctl.state(), SearchState::Idle);
        assert!(ctl.items().is_empty());
        assert!(ctl.load_more().is_none());
    }
}
