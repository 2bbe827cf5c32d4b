//! Session state shared between the coordinator and engine callbacks.
//!
//! Locks are taken in the order `surface` → `inner`, or `surface` → `presenter`. `inner` and
//! `presenter` are never held together. No lock is held while calling into user callbacks or
//! into engine methods that may complete operations synchronously.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use super::SessionState;
use crate::config::SessionConfig;
use crate::engine::{AnimationCallback, EngineHandle, MapEngine, SurfaceEvent, SurfaceId};
use crate::error::{EngineError, SessionError};
use crate::event::{EventHub, EventKind, SessionEvent, Subscription};
use crate::highlight::{Highlight, HighlightPresenter, HighlightRenderSettings, PresentResult};
use crate::location::{Authorization, LocationProvider};
use crate::model::{Landmark, QueryCode, Route, RouteStatus, TouchBehaviour};
use crate::operation::animated::{AnimatedOperation, CameraChannel};
use crate::operation::query::{
    PendingQuery, QueryCompletion, QueryTracker, RouteCompletion, RouteRequest, SearchCompletion,
    SearchRequest,
};
use crate::operation::{
    AnimationKind, CompletionCallback, OperationHandle, OperationId, OperationKind,
    OperationOutcome, OperationSequence, QueryKind, QueryOutcome,
};
use crate::surface::{MapSurface, RenderState};

pub(crate) struct SessionInner {
    rendering: bool,
    state: SessionState,
    is_following: bool,
    touch_behaviour: TouchBehaviour,
    sequence: OperationSequence,
    camera: CameraChannel,
    queries: QueryTracker,
    events: EventHub,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            rendering: false,
            state: SessionState::Idle,
            is_following: false,
            touch_behaviour: TouchBehaviour::default(),
            sequence: OperationSequence::default(),
            camera: CameraChannel::default(),
            queries: QueryTracker::default(),
            events: EventHub::default(),
        }
    }

    fn in_flight(&self) -> usize {
        usize::from(self.camera.is_busy()) + self.queries.len()
    }

    fn new_handle(&mut self, kind: OperationKind) -> OperationHandle {
        OperationHandle::new(self.sequence.next_id(), kind)
    }

    fn refresh_state(&mut self) {
        let state = if !self.rendering {
            SessionState::Idle
        } else if self.in_flight() > 0 {
            SessionState::Busy
        } else {
            SessionState::Active
        };

        if state != self.state {
            trace!("Session state {:?} -> {state:?}", self.state);
            self.state = state;
            self.events.publish(SessionEvent::StateChanged(state));
        }
    }

    fn set_following(&mut self, following: bool) {
        if self.is_following != following {
            self.is_following = following;
            self.events
                .publish(SessionEvent::FollowingPositionChanged(following));
        }
    }
}

fn start_following(
    engine: &dyn MapEngine,
    surface: SurfaceId,
    duration: Duration,
    done: AnimationCallback,
) {
    engine.start_following_position(surface, duration, done)
}

pub(crate) struct Shared {
    engine: EngineHandle,
    surface_id: SurfaceId,
    config: SessionConfig,
    location: Option<Arc<dyn LocationProvider>>,
    surface: Mutex<MapSurface>,
    inner: Mutex<SessionInner>,
    presenter: Mutex<HighlightPresenter>,
}

impl Shared {
    pub(crate) fn new(
        surface: MapSurface,
        config: SessionConfig,
        location: Option<Arc<dyn LocationProvider>>,
    ) -> Self {
        let surface_id = surface.id();
        Self {
            engine: surface.engine().clone(),
            surface_id,
            config,
            location,
            surface: Mutex::new(surface),
            inner: Mutex::new(SessionInner::new()),
            presenter: Mutex::new(HighlightPresenter::new(surface_id)),
        }
    }

    fn engine(&self) -> &dyn MapEngine {
        self.engine.engine()
    }

    pub(crate) fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub(crate) fn render_state(&self) -> RenderState {
        self.surface.lock().render_state()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.inner.lock().in_flight()
    }

    pub(crate) fn is_following(&self) -> bool {
        self.inner.lock().is_following
    }

    pub(crate) fn touch_behaviour(&self) -> TouchBehaviour {
        self.inner.lock().touch_behaviour
    }

    pub(crate) fn active_animation(&self) -> Option<OperationHandle> {
        self.inner.lock().camera.current().cloned()
    }

    pub(crate) fn highlights(&self) -> Vec<Highlight> {
        self.presenter.lock().current().to_vec()
    }

    pub(crate) fn subscribe(&self, kind: EventKind) -> Subscription {
        self.inner.lock().events.subscribe(kind)
    }

    pub(crate) fn start_render(&self) -> Result<(), SessionError> {
        let mut surface = self.surface.lock();
        surface.start_render()?;

        let mut inner = self.inner.lock();
        inner.rendering = true;
        inner.refresh_state();

        Ok(())
    }

    /// Stops rendering and cancels everything in flight.
    pub(crate) fn stop_render(&self) -> Result<(), SessionError> {
        let (animation, queries) = {
            let mut surface = self.surface.lock();
            surface.stop_render()?;

            let mut inner = self.inner.lock();
            inner.rendering = false;
            let animation = inner.camera.take();
            let queries = inner.queries.drain();
            inner.refresh_state();
            (animation, queries)
        };

        if animation.is_some() || !queries.is_empty() {
            debug!(
                "Stopping {} cancels {} operations",
                self.surface_id,
                usize::from(animation.is_some()) + queries.len()
            );
        }

        if let Some(animation) = animation {
            self.engine().cancel_animation(self.surface_id);
            animation.complete(OperationOutcome::Cancelled);
        }

        for query in queries {
            self.engine().cancel_query(query.handle.id());
            query.cancel();
        }

        Ok(())
    }

    /// Stops rendering if needed, clears highlights and destroys the surface. Outstanding
    /// operations complete with `Cancelled`; engine callbacks arriving later are ignored.
    pub(crate) fn teardown(&self) {
        if self.surface.lock().is_destroyed() {
            return;
        }

        if let Err(err) = self.stop_render() {
            warn!("Failed to stop {} on teardown: {err}", self.surface_id);
            return;
        }

        self.presenter.lock().clear_displayed(self.engine());
        if let Err(err) = self.surface.lock().destroy() {
            warn!("Failed to destroy {} on teardown: {err}", self.surface_id);
        }
    }

    pub(crate) fn submit_animated(
        self: &Arc<Self>,
        kind: AnimationKind,
        duration: Duration,
        on_complete: CompletionCallback,
        start: impl FnOnce(&dyn MapEngine, SurfaceId, Duration, AnimationCallback),
    ) -> Result<OperationHandle, SessionError> {
        let handle = self.enqueue_animated(kind, duration, on_complete)?;
        self.start_animated(handle.id(), kind, duration, start);
        Ok(handle)
    }

    /// Makes a new operation the running one on the camera channel and cancels the one it
    /// supersedes. The engine is not called for the new operation yet.
    fn enqueue_animated(
        &self,
        kind: AnimationKind,
        duration: Duration,
        on_complete: CompletionCallback,
    ) -> Result<OperationHandle, SessionError> {
        let (handle, superseded) = {
            let surface = self.surface.lock();
            surface.ensure_rendering()?;

            let mut inner = self.inner.lock();
            let handle = inner.new_handle(OperationKind::Animated(kind));
            let superseded = inner.camera.begin(AnimatedOperation::new(
                handle.clone(),
                duration,
                on_complete,
            ));
            inner.refresh_state();
            (handle, superseded)
        };

        if let Some(superseded) = superseded {
            debug!(
                "Camera operation {} superseded by {}",
                superseded.handle().id(),
                handle.id()
            );
            self.engine().cancel_animation(self.surface_id);
            superseded.complete(OperationOutcome::Cancelled);
        }

        Ok(handle)
    }

    /// Starts the engine animation of an enqueued operation unless it is no longer the running
    /// one.
    fn start_animated(
        self: &Arc<Self>,
        id: OperationId,
        kind: AnimationKind,
        duration: Duration,
        start: impl FnOnce(&dyn MapEngine, SurfaceId, Duration, AnimationCallback),
    ) {
        if self.inner.lock().camera.current().map(|h| h.id()) != Some(id) {
            debug!("Camera operation {id} finished before it was started");
            return;
        }

        debug!("Starting camera operation {id} ({kind:?}, {duration:?})");
        let weak = Arc::downgrade(self);
        start(
            self.engine(),
            self.surface_id,
            duration,
            Box::new(move |success| {
                if let Some(shared) = weak.upgrade() {
                    shared.finish_animation(id, success);
                }
            }),
        );
    }

    fn finish_animation(&self, id: OperationId, success: bool) {
        let finished = {
            let mut inner = self.inner.lock();
            let finished = inner.camera.finish(id);
            if success
                && finished
                    .as_ref()
                    .is_some_and(|op| op.kind() == Some(AnimationKind::FollowPosition))
            {
                inner.set_following(true);
            }
            inner.refresh_state();
            finished
        };

        match finished {
            Some(operation) => {
                let outcome = if success {
                    OperationOutcome::Succeeded
                } else {
                    OperationOutcome::Failed(EngineError::AnimationFailed.into())
                };
                operation.complete(outcome);
            }
            None => trace!("Ignoring completion of finished camera operation {id}"),
        }
    }

    pub(crate) fn start_following_position(
        self: &Arc<Self>,
        duration: Duration,
        on_complete: CompletionCallback,
    ) -> Result<OperationHandle, SessionError> {
        let start = start_following;

        let Some(location) = self.location.clone() else {
            return self.submit_animated(AnimationKind::FollowPosition, duration, on_complete, start);
        };

        let authorization = location.authorization();
        match authorization {
            Authorization::Authorized => {
                self.submit_animated(AnimationKind::FollowPosition, duration, on_complete, start)
            }
            Authorization::Denied | Authorization::Restricted => {
                warn!("Location access is {authorization:?}, cannot follow position");
                Err(SessionError::PermissionDenied)
            }
            Authorization::NotDetermined => {
                // Waiting for the answer occupies the camera channel like a running animation.
                let handle =
                    self.enqueue_animated(AnimationKind::FollowPosition, duration, on_complete)?;
                let id = handle.id();

                debug!("Requesting location access for {id}");
                let weak = Arc::downgrade(self);
                location.request_authorization(Box::new(move |answer| {
                    let Some(shared) = weak.upgrade() else {
                        return;
                    };

                    if answer.is_granted() {
                        shared.start_animated(id, AnimationKind::FollowPosition, duration, start);
                    } else {
                        warn!("Location access refused: {answer:?}");
                        shared.fail_animation(id, SessionError::PermissionDenied);
                    }
                }));

                Ok(handle)
            }
        }
    }

    fn fail_animation(&self, id: OperationId, err: SessionError) {
        let failed = {
            let mut inner = self.inner.lock();
            let failed = inner.camera.finish(id);
            inner.refresh_state();
            failed
        };

        match failed {
            Some(operation) => operation.complete(OperationOutcome::Failed(err)),
            None => trace!("Camera operation {id} already finished, dropping {err}"),
        }
    }

    pub(crate) fn stop_following_position(&self) {
        let following = {
            let mut inner = self.inner.lock();
            let is_follow = inner.camera.current().map(|h| h.kind())
                == Some(OperationKind::Animated(AnimationKind::FollowPosition));
            let following = if is_follow { inner.camera.take() } else { None };
            inner.set_following(false);
            inner.refresh_state();
            following
        };

        self.engine().stop_following_position(self.surface_id);
        if let Some(operation) = following {
            self.engine().cancel_animation(self.surface_id);
            operation.complete(OperationOutcome::Cancelled);
        }
    }

    pub(crate) fn set_touch_behaviour(&self, behaviour: TouchBehaviour) {
        self.inner.lock().touch_behaviour = behaviour;
        self.engine().set_touch_behaviour(self.surface_id, behaviour);
    }

    pub(crate) fn handle_surface_event(&self, event: SurfaceEvent) {
        let mut inner = self.inner.lock();
        match event {
            SurfaceEvent::FollowingPositionChanged(following) => inner.set_following(following),
            SurfaceEvent::Touched(position) => {
                inner.events.publish(SessionEvent::MapTouched(position))
            }
        }
    }

    pub(crate) fn search_around(
        self: &Arc<Self>,
        request: SearchRequest,
        on_complete: SearchCompletion,
    ) -> Result<OperationHandle, SessionError> {
        let max_matches = request
            .max_matches()
            .unwrap_or(self.config.default_max_matches());
        if max_matches == 0 {
            return Err(SessionError::InvalidArgument(
                "max_matches must be positive".into(),
            ));
        }

        if !request.around().is_valid() {
            return Err(SessionError::InvalidArgument(format!(
                "invalid search location {:?}",
                request.around()
            )));
        }

        let handle = {
            let surface = self.surface.lock();
            surface.ensure_rendering()?;

            let mut inner = self.inner.lock();
            let handle = inner.new_handle(OperationKind::Query(QueryKind::Search));
            inner.queries.register(PendingQuery {
                handle: handle.clone(),
                completion: QueryCompletion::Search {
                    max_matches,
                    highlight: request.highlights_results(),
                    on_complete,
                },
            });
            inner.refresh_state();
            handle
        };

        let id = handle.id();
        debug!(
            "Searching {:?} around {:?} as {id}",
            request.query(),
            request.around()
        );
        let weak = Arc::downgrade(self);
        self.engine().search(
            id,
            request.query(),
            request.around(),
            max_matches,
            Box::new(move |result| {
                if let Some(shared) = weak.upgrade() {
                    shared.finish_search(id, result);
                }
            }),
        );

        Ok(handle)
    }

    fn finish_search(&self, id: OperationId, result: Result<Vec<Landmark>, QueryCode>) {
        let Some((query, stale)) = self.take_query(id) else {
            trace!("Ignoring completion of finished search {id}");
            return;
        };

        let (max_matches, highlight, on_complete) = match query.completion {
            QueryCompletion::Search {
                max_matches,
                highlight,
                on_complete,
            } => (max_matches, highlight, on_complete),
            completion @ QueryCompletion::Route { .. } => {
                warn!("Search results delivered for route calculation {id}");
                PendingQuery {
                    handle: query.handle,
                    completion,
                }
                .cancel();
                return;
            }
        };

        if stale {
            debug!("Discarding stale results of search {id}");
            on_complete(QueryOutcome::Cancelled);
            return;
        }

        match result {
            Ok(mut landmarks) => {
                landmarks.truncate(max_matches);
                debug!("Search {id} found {} landmarks", landmarks.len());

                if highlight {
                    let items = landmarks.iter().cloned().map(Highlight::Landmark).collect();
                    let settings = *self.config.highlight_settings();
                    if self.apply_highlights(id, items, &settings) == PresentResult::Outdated {
                        on_complete(QueryOutcome::Cancelled);
                        return;
                    }
                }

                on_complete(QueryOutcome::Completed(landmarks));
            }
            Err(code) => {
                warn!("Search {id} failed with code {code}");
                on_complete(QueryOutcome::Failed(SessionError::QueryFailed(code)));
            }
        }
    }

    pub(crate) fn calculate_route(
        self: &Arc<Self>,
        request: RouteRequest,
        on_complete: RouteCompletion,
    ) -> Result<OperationHandle, SessionError> {
        if let Some(invalid) = request.waypoints().iter().find(|p| !p.is_valid()) {
            return Err(SessionError::InvalidArgument(format!(
                "invalid waypoint {invalid:?}"
            )));
        }

        let kind = OperationKind::Query(QueryKind::RouteCalculation);
        if request.waypoints().len() < 2 {
            let handle = {
                let surface = self.surface.lock();
                surface.ensure_rendering()?;
                self.inner.lock().new_handle(kind)
            };

            warn!(
                "Route {} requested with {} waypoints",
                handle.id(),
                request.waypoints().len()
            );
            on_complete(QueryOutcome::Failed(SessionError::QueryFailed(
                QueryCode::INSUFFICIENT_WAYPOINTS,
            )));
            return Ok(handle);
        }

        let handle = {
            let surface = self.surface.lock();
            surface.ensure_rendering()?;

            let mut inner = self.inner.lock();
            let handle = inner.new_handle(kind);
            inner.queries.register(PendingQuery {
                handle: handle.clone(),
                completion: QueryCompletion::Route {
                    present: request.presents_routes(),
                    on_complete,
                },
            });
            inner.refresh_state();
            handle
        };

        let id = handle.id();
        debug!(
            "Calculating route through {} waypoints as {id}",
            request.waypoints().len()
        );
        let status_target = Arc::downgrade(self);
        let weak = Arc::downgrade(self);
        self.engine().calculate_route(
            id,
            request.waypoints(),
            request.preferences(),
            Box::new(move |status| {
                if let Some(shared) = status_target.upgrade() {
                    shared.publish_route_status(id, status);
                }
            }),
            Box::new(move |result| {
                if let Some(shared) = weak.upgrade() {
                    shared.finish_route(id, result);
                }
            }),
        );

        Ok(handle)
    }

    fn publish_route_status(&self, id: OperationId, status: RouteStatus) {
        let mut inner = self.inner.lock();
        if inner.queries.contains(id) {
            inner.events.publish(SessionEvent::RouteStatus {
                operation: id,
                status,
            });
        }
    }

    fn finish_route(self: &Arc<Self>, id: OperationId, result: Result<Vec<Route>, QueryCode>) {
        let Some((query, stale)) = self.take_query(id) else {
            trace!("Ignoring completion of finished route calculation {id}");
            return;
        };

        let (present, on_complete) = match query.completion {
            QueryCompletion::Route {
                present,
                on_complete,
            } => (present, on_complete),
            completion @ QueryCompletion::Search { .. } => {
                warn!("Route results delivered for search {id}");
                PendingQuery {
                    handle: query.handle,
                    completion,
                }
                .cancel();
                return;
            }
        };

        if stale {
            debug!("Discarding stale routes of {id}");
            on_complete(QueryOutcome::Cancelled);
            return;
        }

        let routes = match result {
            Ok(routes) => routes,
            Err(code) => {
                warn!("Route calculation {id} failed with code {code}");
                on_complete(QueryOutcome::Failed(SessionError::QueryFailed(code)));
                return;
            }
        };

        debug!("Route calculation {id} found {} routes", routes.len());
        if present {
            if routes.is_empty() {
                let settings = *self.config.highlight_settings();
                self.apply_highlights(id, vec![], &settings);
            } else {
                let presented = self.present_routes(
                    Some(id),
                    routes.clone(),
                    self.config.animation_duration(),
                    Box::new(move |outcome| {
                        debug!("Presentation of routes from {id} finished: {outcome:?}")
                    }),
                );

                match presented {
                    Ok(_) => {}
                    Err(SessionError::Cancelled) => {
                        on_complete(QueryOutcome::Cancelled);
                        return;
                    }
                    Err(err) => warn!("Routes of {id} cannot be presented: {err}"),
                }
            }
        }

        on_complete(QueryOutcome::Completed(routes));
    }

    /// Draws the routes as the highlight set and fits the camera to them. `owner` is the route
    /// calculation that produced them; explicit presentations claim a new owner.
    pub(crate) fn present_routes(
        self: &Arc<Self>,
        owner: Option<OperationId>,
        routes: Vec<Route>,
        duration: Duration,
        on_complete: CompletionCallback,
    ) -> Result<OperationHandle, SessionError> {
        if routes.is_empty() {
            return Err(SessionError::InvalidArgument(
                "cannot present an empty route list".into(),
            ));
        }

        let owner = match owner {
            Some(owner) => owner,
            None => self.claim_highlights()?,
        };

        let items = routes.iter().cloned().map(Highlight::Route).collect();
        let settings = *self.config.highlight_settings();
        if self.apply_highlights(owner, items, &settings) == PresentResult::Outdated {
            return Err(SessionError::Cancelled);
        }

        self.submit_animated(
            AnimationKind::PresentRoutes,
            duration,
            on_complete,
            move |engine, surface, duration, done| {
                engine.present_routes(surface, &routes, duration, done)
            },
        )
    }

    pub(crate) fn present_highlights(
        &self,
        items: Vec<Highlight>,
        settings: &HighlightRenderSettings,
    ) -> Result<(), SessionError> {
        let owner = self.claim_highlights()?;
        self.apply_highlights(owner, items, settings);
        Ok(())
    }

    /// Allocates a new highlight owner. Queries submitted before it become stale.
    fn claim_highlights(&self) -> Result<OperationId, SessionError> {
        let surface = self.surface.lock();
        surface.ensure_rendering()?;

        let mut inner = self.inner.lock();
        let id = inner.sequence.next_id();
        inner.queries.claim_highlights(id);
        Ok(id)
    }

    fn apply_highlights(
        &self,
        owner: OperationId,
        items: Vec<Highlight>,
        settings: &HighlightRenderSettings,
    ) -> PresentResult {
        let (result, count) = {
            let mut presenter = self.presenter.lock();
            let result = presenter.present(self.engine(), owner, items, settings);
            (result, presenter.current().len())
        };

        if result == PresentResult::Applied {
            self.inner
                .lock()
                .events
                .publish(SessionEvent::HighlightsChanged(count));
        }

        result
    }

    fn take_query(&self, id: OperationId) -> Option<(PendingQuery, bool)> {
        let mut inner = self.inner.lock();
        let query = inner.queries.take(id)?;
        let stale = inner.queries.is_stale(&query);
        inner.refresh_state();
        Some((query, stale))
    }

    pub(crate) fn cancel(&self, handle: &OperationHandle) -> bool {
        let id = handle.id();
        let (animation, query) = {
            let mut inner = self.inner.lock();
            let animation = inner.camera.finish(id);
            let query = if animation.is_none() {
                inner.queries.take(id)
            } else {
                None
            };
            inner.refresh_state();
            (animation, query)
        };

        if let Some(animation) = animation {
            self.engine().cancel_animation(self.surface_id);
            animation.complete(OperationOutcome::Cancelled);
            true
        } else if let Some(query) = query {
            self.engine().cancel_query(id);
            query.cancel();
            true
        } else {
            false
        }
    }
}
