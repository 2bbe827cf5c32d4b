//! Search and route calculation requests and the tracker of their in-flight state.

use ahash::HashMap;
use log::debug;
use mapsession_types::GeoPoint2d;

use super::{OperationHandle, OperationId, QueryOutcome};
use crate::model::{Landmark, LandmarkCategory, Route, RoutePreferences};

/// Kind of a query operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Landmark search.
    Search,
    /// Route calculation.
    RouteCalculation,
}

/// What to search for.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Free text query.
    Text(String),
    /// All landmarks of a category.
    Category(LandmarkCategory),
}

/// Parameters of a search around a location.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    query: SearchQuery,
    around: GeoPoint2d,
    max_matches: Option<usize>,
    highlight_results: bool,
}

impl SearchRequest {
    /// Creates a request for the given query around the location.
    pub fn new(query: SearchQuery, around: GeoPoint2d) -> Self {
        Self {
            query,
            around,
            max_matches: None,
            highlight_results: true,
        }
    }

    /// Free text search.
    pub fn text(text: impl Into<String>, around: GeoPoint2d) -> Self {
        Self::new(SearchQuery::Text(text.into()), around)
    }

    /// Category search.
    pub fn category(category: LandmarkCategory, around: GeoPoint2d) -> Self {
        Self::new(SearchQuery::Category(category), around)
    }

    /// Limits the number of results. Defaults to
    /// [`SessionConfig::default_max_matches`](crate::SessionConfig::default_max_matches).
    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = Some(max_matches);
        self
    }

    /// Sets whether the results replace the highlight set of the surface. Defaults to `true`.
    pub fn with_highlighted_results(mut self, highlight: bool) -> Self {
        self.highlight_results = highlight;
        self
    }

    /// The query.
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Center of the search.
    pub fn around(&self) -> GeoPoint2d {
        self.around
    }

    /// Explicit result limit, if any.
    pub fn max_matches(&self) -> Option<usize> {
        self.max_matches
    }

    /// Whether the results replace the highlight set.
    pub fn highlights_results(&self) -> bool {
        self.highlight_results
    }
}

/// Parameters of a route calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    waypoints: Vec<GeoPoint2d>,
    preferences: RoutePreferences,
    present_routes: bool,
}

impl RouteRequest {
    /// Creates a request for a route through the waypoints in the given order.
    pub fn new(waypoints: Vec<GeoPoint2d>) -> Self {
        Self {
            waypoints,
            preferences: RoutePreferences::default(),
            present_routes: true,
        }
    }

    /// Sets route preferences.
    pub fn with_preferences(mut self, preferences: RoutePreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Sets whether calculated routes are presented on the surface. Defaults to `true`.
    pub fn with_presented_routes(mut self, present: bool) -> Self {
        self.present_routes = present;
        self
    }

    /// Waypoints of the route.
    pub fn waypoints(&self) -> &[GeoPoint2d] {
        &self.waypoints
    }

    /// Route preferences.
    pub fn preferences(&self) -> &RoutePreferences {
        &self.preferences
    }

    /// Whether calculated routes are presented.
    pub fn presents_routes(&self) -> bool {
        self.present_routes
    }
}

/// Completion callback of a search.
pub type SearchCompletion = Box<dyn FnOnce(QueryOutcome<Landmark>) + Send>;
/// Completion callback of a route calculation.
pub type RouteCompletion = Box<dyn FnOnce(QueryOutcome<Route>) + Send>;

pub(crate) enum QueryCompletion {
    Search {
        max_matches: usize,
        highlight: bool,
        on_complete: SearchCompletion,
    },
    Route {
        present: bool,
        on_complete: RouteCompletion,
    },
}

/// A query waiting for its engine completion.
pub(crate) struct PendingQuery {
    pub(crate) handle: OperationHandle,
    pub(crate) completion: QueryCompletion,
}

impl PendingQuery {
    fn affects_highlights(&self) -> bool {
        match self.completion {
            QueryCompletion::Search { highlight, .. } => highlight,
            QueryCompletion::Route { present, .. } => present,
        }
    }

    /// Fires the callback with [`QueryOutcome::Cancelled`]. Must be called without any session
    /// lock held.
    pub(crate) fn cancel(self) {
        debug!("Query {} cancelled", self.handle.id());
        match self.completion {
            QueryCompletion::Search { on_complete, .. } => on_complete(QueryOutcome::Cancelled),
            QueryCompletion::Route { on_complete, .. } => on_complete(QueryOutcome::Cancelled),
        }
    }
}

/// In-flight queries of a session.
///
/// Queries that apply their results to the surface (highlighted searches, presented routes)
/// compete for the highlight set. Only the most recently submitted one may apply its results:
/// older ones are stale once a newer one is submitted.
#[derive(Default)]
pub(crate) struct QueryTracker {
    pending: HashMap<OperationId, PendingQuery>,
    highlight_owner: Option<OperationId>,
}

impl QueryTracker {
    pub(crate) fn register(&mut self, query: PendingQuery) {
        let id = query.handle.id();
        if query.affects_highlights() {
            self.claim_highlights(id);
        }

        self.pending.insert(id, query);
    }

    /// Records that the operation with the given id is now the latest owner of the highlight set.
    pub(crate) fn claim_highlights(&mut self, id: OperationId) {
        if self.highlight_owner.map_or(true, |owner| owner < id) {
            self.highlight_owner = Some(id);
        }
    }

    pub(crate) fn take(&mut self, id: OperationId) -> Option<PendingQuery> {
        self.pending.remove(&id)
    }

    pub(crate) fn contains(&self, id: OperationId) -> bool {
        self.pending.contains_key(&id)
    }

    /// True if a newer highlight owner was registered after the query was submitted.
    pub(crate) fn is_stale(&self, query: &PendingQuery) -> bool {
        query.affects_highlights()
            && self
                .highlight_owner
                .is_some_and(|owner| owner > query.handle.id())
    }

    /// Removes all pending queries in submission order.
    pub(crate) fn drain(&mut self) -> Vec<PendingQuery> {
        let mut queries: Vec<_> = self.pending.drain().map(|(_, query)| query).collect();
        queries.sort_by_key(|query| query.handle.id());
        queries
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::operation::OperationKind;

    fn search(id: u64, highlight: bool, log: &Arc<Mutex<Vec<u64>>>) -> PendingQuery {
        let log = log.clone();
        PendingQuery {
            handle: OperationHandle::new(
                OperationId::new(id),
                OperationKind::Query(QueryKind::Search),
            ),
            completion: QueryCompletion::Search {
                max_matches: 10,
                highlight,
                on_complete: Box::new(move |outcome| {
                    assert_eq!(outcome, QueryOutcome::Cancelled);
                    log.lock().push(id);
                }),
            },
        }
    }

    #[test]
    fn older_highlighting_query_is_stale() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut tracker = QueryTracker::default();
        tracker.register(search(1, true, &log));
        tracker.register(search(2, true, &log));

        let first = tracker.take(OperationId::new(1)).expect("registered");
        let second = tracker.take(OperationId::new(2)).expect("registered");
        assert!(tracker.is_stale(&first));
        assert!(!tracker.is_stale(&second));
    }

    #[test]
    fn non_highlighting_query_is_never_stale() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut tracker = QueryTracker::default();
        tracker.register(search(1, false, &log));
        tracker.register(search(2, true, &log));

        let first = tracker.take(OperationId::new(1)).expect("registered");
        assert!(!tracker.is_stale(&first));
    }

    #[test]
    fn drain_returns_queries_in_submission_order() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut tracker = QueryTracker::default();
        for id in [3, 1, 2] {
            tracker.register(search(id, true, &log));
        }

        for query in tracker.drain() {
            query.cancel();
        }

        assert_eq!(*log.lock(), vec![1, 2, 3]);
        assert_eq!(tracker.len(), 0);
    }
}
