//! In-memory engine for tests.
//!
//! [`ScriptedEngine`] records every call it receives and keeps the completions of animations
//! and queries until a test resolves them, in any order. [`StaticLocationProvider`] answers
//! location permission requests with preconfigured values.

use std::sync::Arc;
use std::time::Duration;

use ahash::HashMap;
use mapsession_types::GeoPoint2d;
use parking_lot::Mutex;

use crate::engine::{
    AnimationCallback, MapEngine, RouteCallback, RouteStatusCallback, SearchCallback,
    SurfaceEvent, SurfaceEventSink, SurfaceId,
};
use crate::error::EngineError;
use crate::highlight::{Highlight, HighlightId, HighlightRenderSettings};
use crate::location::{Authorization, AuthorizationCallback, LocationProvider};
use crate::model::{
    Landmark, Perspective, QueryCode, Route, RoutePreferences, RouteStatus, TouchBehaviour,
};
use crate::operation::query::SearchQuery;
use crate::operation::OperationId;

/// A call received by [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    /// `create_surface`
    CreateSurface(SurfaceId),
    /// `start_render`
    StartRender(SurfaceId),
    /// `stop_render`
    StopRender(SurfaceId),
    /// `destroy_surface`
    DestroySurface(SurfaceId),
    /// `center_on`
    CenterOn(SurfaceId, GeoPoint2d, u32),
    /// `set_perspective`
    SetPerspective(SurfaceId, Perspective),
    /// `align_north_up`
    AlignNorthUp(SurfaceId),
    /// `start_following_position`
    StartFollowing(SurfaceId),
    /// `stop_following_position`
    StopFollowing(SurfaceId),
    /// `present_routes` with the number of routes
    PresentRoutes(SurfaceId, usize),
    /// `cancel_animation`
    CancelAnimation(SurfaceId),
    /// `search`
    Search(OperationId),
    /// `calculate_route`
    CalculateRoute(OperationId),
    /// `cancel_query`
    CancelQuery(OperationId),
    /// `draw_highlights`
    DrawHighlights(SurfaceId, HighlightId),
    /// `clear_highlights`
    ClearHighlights(SurfaceId, HighlightId),
    /// `set_touch_behaviour`
    SetTouchBehaviour(SurfaceId, TouchBehaviour),
}

#[derive(Default)]
struct SurfaceRecord {
    events: Option<SurfaceEventSink>,
    rendering: bool,
    destroyed: bool,
    highlights: Vec<(HighlightId, Vec<Highlight>)>,
}

struct PendingRoute {
    status: Arc<dyn Fn(RouteStatus) + Send + Sync>,
    done: RouteCallback,
}

#[derive(Default)]
struct EngineState {
    token: Option<String>,
    complete_animations: bool,
    last_surface: u64,
    calls: Vec<EngineCall>,
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    animations: Vec<(SurfaceId, AnimationCallback)>,
    searches: HashMap<OperationId, SearchCallback>,
    routes: HashMap<OperationId, PendingRoute>,
    draw_calls: usize,
}

/// Engine whose asynchronous work is completed by the test.
///
/// Clones share the same state, so a test keeps one clone to drive the engine while the session
/// owns another.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<EngineState>>,
}

impl ScriptedEngine {
    /// Creates an engine accepting any token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that accepts only the given token.
    pub fn with_token(token: &str) -> Self {
        let engine = Self::new();
        engine.state.lock().token = Some(token.to_string());
        engine
    }

    /// Makes camera animations succeed from inside the engine call that starts them.
    pub fn complete_animations_immediately(&self, complete: bool) {
        self.state.lock().complete_animations = complete;
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// Number of received calls matching the predicate.
    pub fn count_calls(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Number of animations waiting for completion.
    pub fn pending_animations(&self) -> usize {
        self.state.lock().animations.len()
    }

    /// Ids of queries waiting for completion, in ascending order.
    pub fn pending_queries(&self) -> Vec<OperationId> {
        let state = self.state.lock();
        let mut ids: Vec<_> = state
            .searches
            .keys()
            .chain(state.routes.keys())
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Completes the oldest pending animation. Returns false if there is none.
    pub fn finish_animation(&self, success: bool) -> bool {
        let pending = {
            let mut state = self.state.lock();
            if state.animations.is_empty() {
                None
            } else {
                Some(state.animations.remove(0))
            }
        };

        match pending {
            Some((_, done)) => {
                done(success);
                true
            }
            None => false,
        }
    }

    /// Completes a pending search. Returns false if the search is not pending.
    pub fn complete_search(&self, id: OperationId, result: Result<Vec<Landmark>, QueryCode>) -> bool {
        let pending = self.state.lock().searches.remove(&id);
        match pending {
            Some(done) => {
                done(result);
                true
            }
            None => false,
        }
    }

    /// Completes a pending route calculation. Returns false if it is not pending.
    pub fn complete_route(&self, id: OperationId, result: Result<Vec<Route>, QueryCode>) -> bool {
        let pending = self.state.lock().routes.remove(&id);
        match pending {
            Some(route) => {
                (route.done)(result);
                true
            }
            None => false,
        }
    }

    /// Reports progress of a pending route calculation. Returns false if it is not pending.
    pub fn report_route_status(&self, id: OperationId, status: RouteStatus) -> bool {
        let callback = self
            .state
            .lock()
            .routes
            .get(&id)
            .map(|route| route.status.clone());
        match callback {
            Some(callback) => {
                callback(status);
                true
            }
            None => false,
        }
    }

    /// Sends a surface event as if the engine detected it. Returns false if the surface is
    /// unknown or destroyed.
    pub fn emit(&self, surface: SurfaceId, event: SurfaceEvent) -> bool {
        let sink = self
            .state
            .lock()
            .surfaces
            .get(&surface)
            .filter(|record| !record.destroyed)
            .and_then(|record| record.events.clone());
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    /// Items of all highlight sets currently drawn over the surface.
    pub fn visible_highlights(&self, surface: SurfaceId) -> Vec<Highlight> {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .map(|record| {
                record
                    .highlights
                    .iter()
                    .flat_map(|(_, items)| items.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of highlight sets currently drawn over the surface.
    pub fn highlight_overlay_count(&self, surface: SurfaceId) -> usize {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .map_or(0, |record| record.highlights.len())
    }

    /// Total number of `draw_highlights` calls.
    pub fn draw_highlight_calls(&self) -> usize {
        self.state.lock().draw_calls
    }

    /// Whether the engine renders into the surface.
    pub fn is_rendering(&self, surface: SurfaceId) -> bool {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .is_some_and(|record| record.rendering)
    }

    /// Whether the surface was destroyed.
    pub fn is_destroyed(&self, surface: SurfaceId) -> bool {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .is_some_and(|record| record.destroyed)
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().calls.push(call);
    }

    fn start_animation(&self, surface: SurfaceId, call: EngineCall, done: AnimationCallback) {
        let immediate = {
            let mut state = self.state.lock();
            state.calls.push(call);
            if state.complete_animations {
                Some(done)
            } else {
                state.animations.push((surface, done));
                None
            }
        };

        if let Some(done) = immediate {
            done(true);
        }
    }
}

impl MapEngine for ScriptedEngine {
    fn authorize(&self, token: &str) -> Result<(), EngineError> {
        match &self.state.lock().token {
            Some(expected) if expected != token => {
                Err(EngineError::Rejected("unknown token".into()))
            }
            _ => Ok(()),
        }
    }

    fn create_surface(&self, events: SurfaceEventSink) -> Result<SurfaceId, EngineError> {
        let mut state = self.state.lock();
        state.last_surface += 1;
        let id = SurfaceId::new(state.last_surface);
        state.surfaces.insert(
            id,
            SurfaceRecord {
                events: Some(events),
                ..Default::default()
            },
        );
        state.calls.push(EngineCall::CreateSurface(id));

        Ok(id)
    }

    fn start_render(&self, surface: SurfaceId) {
        let mut state = self.state.lock();
        if let Some(record) = state.surfaces.get_mut(&surface) {
            record.rendering = true;
        }
        state.calls.push(EngineCall::StartRender(surface));
    }

    fn stop_render(&self, surface: SurfaceId) {
        let mut state = self.state.lock();
        if let Some(record) = state.surfaces.get_mut(&surface) {
            record.rendering = false;
        }
        state.calls.push(EngineCall::StopRender(surface));
    }

    fn destroy_surface(&self, surface: SurfaceId) {
        let mut state = self.state.lock();
        if let Some(record) = state.surfaces.get_mut(&surface) {
            record.destroyed = true;
            record.events = None;
        }
        state.calls.push(EngineCall::DestroySurface(surface));
    }

    fn center_on(
        &self,
        surface: SurfaceId,
        position: GeoPoint2d,
        zoom_level: u32,
        _duration: Duration,
        done: AnimationCallback,
    ) {
        self.start_animation(
            surface,
            EngineCall::CenterOn(surface, position, zoom_level),
            done,
        );
    }

    fn set_perspective(
        &self,
        surface: SurfaceId,
        perspective: Perspective,
        _duration: Duration,
        done: AnimationCallback,
    ) {
        self.start_animation(
            surface,
            EngineCall::SetPerspective(surface, perspective),
            done,
        );
    }

    fn align_north_up(&self, surface: SurfaceId, _duration: Duration, done: AnimationCallback) {
        self.start_animation(surface, EngineCall::AlignNorthUp(surface), done);
    }

    fn start_following_position(
        &self,
        surface: SurfaceId,
        _duration: Duration,
        done: AnimationCallback,
    ) {
        self.start_animation(surface, EngineCall::StartFollowing(surface), done);
    }

    fn stop_following_position(&self, surface: SurfaceId) {
        self.record(EngineCall::StopFollowing(surface));
    }

    fn present_routes(
        &self,
        surface: SurfaceId,
        routes: &[Route],
        _duration: Duration,
        done: AnimationCallback,
    ) {
        self.start_animation(
            surface,
            EngineCall::PresentRoutes(surface, routes.len()),
            done,
        );
    }

    fn cancel_animation(&self, surface: SurfaceId) {
        let interrupted: Vec<_> = {
            let mut state = self.state.lock();
            state.calls.push(EngineCall::CancelAnimation(surface));
            let (interrupted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.animations)
                .into_iter()
                .partition(|(id, _)| *id == surface);
            state.animations = kept;
            interrupted
        };

        for (_, done) in interrupted {
            done(false);
        }
    }

    fn set_touch_behaviour(&self, surface: SurfaceId, behaviour: TouchBehaviour) {
        self.record(EngineCall::SetTouchBehaviour(surface, behaviour));
    }

    fn search(
        &self,
        id: OperationId,
        _query: &SearchQuery,
        _around: GeoPoint2d,
        _max_matches: usize,
        done: SearchCallback,
    ) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Search(id));
        state.searches.insert(id, done);
    }

    fn calculate_route(
        &self,
        id: OperationId,
        _waypoints: &[GeoPoint2d],
        _preferences: &RoutePreferences,
        status: RouteStatusCallback,
        done: RouteCallback,
    ) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::CalculateRoute(id));
        state.routes.insert(
            id,
            PendingRoute {
                status: Arc::from(status),
                done,
            },
        );
    }

    fn cancel_query(&self, id: OperationId) {
        let (search, route) = {
            let mut state = self.state.lock();
            state.calls.push(EngineCall::CancelQuery(id));
            (state.searches.remove(&id), state.routes.remove(&id))
        };

        if let Some(done) = search {
            done(Err(QueryCode::INTERRUPTED));
        }
        if let Some(route) = route {
            (route.done)(Err(QueryCode::INTERRUPTED));
        }
    }

    fn draw_highlights(
        &self,
        surface: SurfaceId,
        id: HighlightId,
        items: &[Highlight],
        _settings: &HighlightRenderSettings,
    ) {
        let mut state = self.state.lock();
        state.draw_calls += 1;
        if let Some(record) = state.surfaces.get_mut(&surface) {
            record.highlights.push((id, items.to_vec()));
        }
        state.calls.push(EngineCall::DrawHighlights(surface, id));
    }

    fn clear_highlights(&self, surface: SurfaceId, id: HighlightId) {
        let mut state = self.state.lock();
        if let Some(record) = state.surfaces.get_mut(&surface) {
            record.highlights.retain(|(drawn, _)| *drawn != id);
        }
        state.calls.push(EngineCall::ClearHighlights(surface, id));
    }
}

struct LocationState {
    authorization: Authorization,
    answer: Option<Authorization>,
    waiting: Vec<AuthorizationCallback>,
    requests: usize,
}

/// Location service with a fixed authorization state.
///
/// Authorization requests are answered immediately with the configured answer, or held until
/// [`StaticLocationProvider::respond`] is called if there is none.
#[derive(Clone)]
pub struct StaticLocationProvider {
    state: Arc<Mutex<LocationState>>,
}

impl StaticLocationProvider {
    /// Creates a provider in the given state.
    pub fn new(authorization: Authorization) -> Self {
        Self {
            state: Arc::new(Mutex::new(LocationState {
                authorization,
                answer: None,
                waiting: vec![],
                requests: 0,
            })),
        }
    }

    /// Answers requests immediately with `answer`.
    pub fn answering(self, answer: Authorization) -> Self {
        self.state.lock().answer = Some(answer);
        self
    }

    /// Number of authorization requests received.
    pub fn requests(&self) -> usize {
        self.state.lock().requests
    }

    /// Answers all held requests. Returns false if there were none.
    pub fn respond(&self, answer: Authorization) -> bool {
        let waiting = {
            let mut state = self.state.lock();
            state.authorization = answer;
            std::mem::take(&mut state.waiting)
        };

        let answered = !waiting.is_empty();
        for done in waiting {
            done(answer);
        }

        answered
    }
}

impl LocationProvider for StaticLocationProvider {
    fn authorization(&self) -> Authorization {
        self.state.lock().authorization
    }

    fn request_authorization(&self, done: AuthorizationCallback) {
        let answer = {
            let mut state = self.state.lock();
            state.requests += 1;
            match state.answer {
                Some(answer) => {
                    state.authorization = answer;
                    answer
                }
                None => {
                    state.waiting.push(done);
                    return;
                }
            }
        };

        done(answer);
    }
}
