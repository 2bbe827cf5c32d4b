//! The session façade consumers talk to.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::channel::oneshot;
use mapsession_types::GeoPoint2d;

use crate::config::SessionConfig;
use crate::engine::{EngineHandle, SurfaceId};
use crate::error::SessionError;
use crate::event::{EventKind, Subscription};
use crate::highlight::{Highlight, HighlightRenderSettings};
use crate::model::{Landmark, Perspective, Route, TouchBehaviour};
use crate::operation::query::{RouteRequest, SearchRequest};
use crate::operation::{AnimationKind, OperationHandle, OperationOutcome, QueryOutcome};
use crate::surface::RenderState;

mod builder;
mod shared;

pub use builder::SessionBuilder;
use shared::Shared;

/// State of a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// The surface exists but is not rendering.
    Idle,
    /// The surface is rendering and no operation is in flight.
    Active,
    /// At least one operation is in flight.
    Busy,
}

/// Façade over one map surface.
///
/// The coordinator exclusively owns its surface. It sequences camera animations, searches,
/// route calculations and highlight presentations against it and republishes engine
/// notifications to [subscribers](SessionCoordinator::subscribe).
///
/// Every operation returns immediately. Its completion callback is called exactly once, possibly
/// on an engine thread, possibly before the submitting method returns. Callbacks may call back
/// into the coordinator.
///
/// Dropping the coordinator stops rendering, cancels outstanding operations and destroys the
/// surface. Engine callbacks arriving after that are ignored.
///
/// ```no_run
/// use std::time::Duration;
///
/// use mapsession::{engine, SessionBuilder};
/// use mapsession::operation::query::SearchRequest;
/// use mapsession_types::latlon;
///
/// # fn run(native_engine: impl mapsession::engine::MapEngine + 'static) -> anyhow::Result<()> {
/// let engine = engine::initialize("sdk-token", native_engine)?;
/// let session = SessionBuilder::new(engine).build()?;
///
/// session.start_render()?;
/// session.center_on(latlon!(45.65, 25.60), 14, Duration::from_millis(800), |_| {})?;
/// session.search_around(SearchRequest::text("coffee", latlon!(45.65, 25.60)), |outcome| {
///     println!("{outcome:?}");
/// })?;
/// # Ok(())
/// # }
/// ```
pub struct SessionCoordinator {
    shared: Arc<Shared>,
}

impl SessionCoordinator {
    /// Starts building a session on the given engine.
    pub fn builder(engine: EngineHandle) -> SessionBuilder {
        SessionBuilder::new(engine)
    }

    /// Engine id of the owned surface.
    pub fn surface_id(&self) -> SurfaceId {
        self.shared.surface_id()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        self.shared.config()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Render state of the owned surface.
    pub fn render_state(&self) -> RenderState {
        self.shared.render_state()
    }

    /// Number of operations in flight.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight()
    }

    /// The running camera operation, if any.
    pub fn active_animation(&self) -> Option<OperationHandle> {
        self.shared.active_animation()
    }

    /// Whether the camera follows the device position.
    pub fn is_following_position(&self) -> bool {
        self.shared.is_following()
    }

    /// Current touch behaviour of the surface.
    pub fn touch_behaviour(&self) -> TouchBehaviour {
        self.shared.touch_behaviour()
    }

    /// Items of the displayed highlight set.
    pub fn highlights(&self) -> Vec<Highlight> {
        self.shared.highlights()
    }

    /// Starts rendering. Call when the host view appears.
    pub fn start_render(&self) -> Result<(), SessionError> {
        self.shared.start_render()
    }

    /// Stops rendering. Call when the host view disappears.
    ///
    /// Does not wait for operations in flight: all of them complete with `Cancelled` before this
    /// method returns.
    pub fn stop_render(&self) -> Result<(), SessionError> {
        self.shared.stop_render()
    }

    /// Moves the camera to the position at the given zoom level.
    pub fn center_on(
        &self,
        position: GeoPoint2d,
        zoom_level: u32,
        duration: Duration,
        on_complete: impl FnOnce(OperationOutcome) + Send + 'static,
    ) -> Result<OperationHandle, SessionError> {
        if !position.is_valid() {
            return Err(SessionError::InvalidArgument(format!(
                "invalid position {position:?}"
            )));
        }

        self.shared.submit_animated(
            AnimationKind::CenterOn,
            duration,
            Box::new(on_complete),
            move |engine, surface, duration, done| {
                engine.center_on(surface, position, zoom_level, duration, done)
            },
        )
    }

    /// Switches the camera perspective.
    pub fn set_perspective(
        &self,
        perspective: Perspective,
        duration: Duration,
        on_complete: impl FnOnce(OperationOutcome) + Send + 'static,
    ) -> Result<OperationHandle, SessionError> {
        self.shared.submit_animated(
            AnimationKind::SetPerspective,
            duration,
            Box::new(on_complete),
            move |engine, surface, duration, done| {
                engine.set_perspective(surface, perspective, duration, done)
            },
        )
    }

    /// Rotates the map so that north points up.
    pub fn align_north_up(
        &self,
        duration: Duration,
        on_complete: impl FnOnce(OperationOutcome) + Send + 'static,
    ) -> Result<OperationHandle, SessionError> {
        self.shared.submit_animated(
            AnimationKind::AlignNorth,
            duration,
            Box::new(on_complete),
            |engine, surface, duration, done| engine.align_north_up(surface, duration, done),
        )
    }

    /// Starts following the device position.
    ///
    /// Fails with [`SessionError::PermissionDenied`] if location access was refused. If the user
    /// was not asked yet, access is requested first and a refusal completes the operation with
    /// `Failed(PermissionDenied)`. While the request is pending the operation occupies the
    /// camera channel: newer camera operations, [`SessionCoordinator::cancel`] and
    /// [`SessionCoordinator::stop_render`] cancel it.
    pub fn start_following_position(
        &self,
        duration: Duration,
        on_complete: impl FnOnce(OperationOutcome) + Send + 'static,
    ) -> Result<OperationHandle, SessionError> {
        self.shared
            .start_following_position(duration, Box::new(on_complete))
    }

    /// Stops following the device position.
    pub fn stop_following_position(&self) {
        self.shared.stop_following_position()
    }

    /// Sets how the surface reacts to touches.
    pub fn set_touch_behaviour(&self, behaviour: TouchBehaviour) {
        self.shared.set_touch_behaviour(behaviour)
    }

    /// Searches landmarks around a location.
    ///
    /// At most `max_matches` results are delivered. Unless disabled in the request, the results
    /// replace the highlight set, provided no newer search, route calculation or presentation
    /// was submitted in the meantime. Results of such a stale search are discarded and the
    /// callback receives [`QueryOutcome::Cancelled`].
    pub fn search_around(
        &self,
        request: SearchRequest,
        on_complete: impl FnOnce(QueryOutcome<Landmark>) + Send + 'static,
    ) -> Result<OperationHandle, SessionError> {
        self.shared.search_around(request, Box::new(on_complete))
    }

    /// Same as [`SessionCoordinator::search_around`], with the outcome delivered through a
    /// future. The search is submitted when this method is called, not when the future is first
    /// polled.
    pub fn search_around_async(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = Result<Vec<Landmark>, SessionError>> + Send + 'static {
        let (sender, receiver) = oneshot::channel();
        let submitted = self.search_around(request, move |outcome| {
            let _ = sender.send(outcome.into_result());
        });

        async move {
            submitted?;
            receiver.await.unwrap_or(Err(SessionError::Cancelled))
        }
    }

    /// Calculates routes through the waypoints.
    ///
    /// Progress is published as [`SessionEvent::RouteStatus`](crate::event::SessionEvent).
    /// Unless disabled in the request, non-empty results are presented on the surface. Requests
    /// with less than two waypoints fail with
    /// [`QueryCode::INSUFFICIENT_WAYPOINTS`](crate::model::QueryCode::INSUFFICIENT_WAYPOINTS).
    pub fn calculate_route(
        &self,
        request: RouteRequest,
        on_complete: impl FnOnce(QueryOutcome<Route>) + Send + 'static,
    ) -> Result<OperationHandle, SessionError> {
        self.shared.calculate_route(request, Box::new(on_complete))
    }

    /// Same as [`SessionCoordinator::calculate_route`], with the outcome delivered through a
    /// future.
    pub fn calculate_route_async(
        &self,
        request: RouteRequest,
    ) -> impl Future<Output = Result<Vec<Route>, SessionError>> + Send + 'static {
        let (sender, receiver) = oneshot::channel();
        let submitted = self.calculate_route(request, move |outcome| {
            let _ = sender.send(outcome.into_result());
        });

        async move {
            submitted?;
            receiver.await.unwrap_or(Err(SessionError::Cancelled))
        }
    }

    /// Draws the routes as the highlight set and fits the camera to them.
    pub fn present_routes(
        &self,
        routes: Vec<Route>,
        duration: Duration,
        on_complete: impl FnOnce(OperationOutcome) + Send + 'static,
    ) -> Result<OperationHandle, SessionError> {
        self.shared
            .present_routes(None, routes, duration, Box::new(on_complete))
    }

    /// Replaces the highlight set. Searches and route calculations submitted before this call
    /// will not overwrite it.
    pub fn present_highlights(
        &self,
        items: Vec<Highlight>,
        settings: &HighlightRenderSettings,
    ) -> Result<(), SessionError> {
        self.shared.present_highlights(items, settings)
    }

    /// Removes the highlight set.
    pub fn clear_highlights(&self) -> Result<(), SessionError> {
        self.shared
            .present_highlights(vec![], self.config().highlight_settings())
    }

    /// Cancels an operation. Its callback fires with a cancelled outcome. Returns false if the
    /// operation already completed.
    pub fn cancel(&self, handle: &OperationHandle) -> bool {
        self.shared.cancel(handle)
    }

    /// Subscribes to events of the given kind.
    pub fn subscribe(&self, kind: EventKind) -> Subscription {
        self.shared.subscribe(kind)
    }

    /// Tears the session down. Same as dropping it.
    pub fn shutdown(self) {
        drop(self)
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}
