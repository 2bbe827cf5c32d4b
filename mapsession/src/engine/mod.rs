//! Boundary to the native map engine.
//!
//! Rendering, search and routing are implemented by a native engine that this crate does not
//! see into. An engine is plugged in by implementing [`MapEngine`]. All of the engine's
//! asynchronous work reports back through boxed callbacks that the engine must call exactly once,
//! from any thread.
//!
//! Render control and highlight drawing methods are synchronous and must not invoke pending
//! operation callbacks or surface events from inside the call. Cancellation methods may invoke
//! the callbacks of the cancelled work synchronously; the session ignores completions of
//! operations it has already finished.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use mapsession_types::GeoPoint2d;

use crate::error::EngineError;
use crate::highlight::{Highlight, HighlightId, HighlightRenderSettings};
use crate::model::{
    Landmark, Perspective, QueryCode, Route, RoutePreferences, RouteStatus, TouchBehaviour,
};
use crate::operation::query::SearchQuery;
use crate::operation::OperationId;

mod handle;

pub use handle::{handle, initialize, teardown, EngineHandle};

/// Identifier of a native rendering surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Creates an id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of the id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for SurfaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Notification sent by the engine about a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The camera started or stopped tracking the device position, e.g. because the user panned
    /// the map.
    FollowingPositionChanged(bool),
    /// The user tapped the map at the given location.
    Touched(GeoPoint2d),
}

/// Receiver of surface events given to [`MapEngine::create_surface`].
pub type SurfaceEventSink = Arc<dyn Fn(SurfaceEvent) + Send + Sync>;
/// Completion of a camera animation. The argument is `true` if the camera reached its target.
pub type AnimationCallback = Box<dyn FnOnce(bool) + Send>;
/// Completion of a search.
pub type SearchCallback = Box<dyn FnOnce(Result<Vec<Landmark>, QueryCode>) + Send>;
/// Progress of a route calculation. May be called any number of times before the completion.
pub type RouteStatusCallback = Box<dyn Fn(RouteStatus) + Send + Sync>;
/// Completion of a route calculation.
pub type RouteCallback = Box<dyn FnOnce(Result<Vec<Route>, QueryCode>) + Send>;

/// Native map engine.
pub trait MapEngine: Send + Sync {
    /// Checks the credential the engine is started with.
    fn authorize(&self, token: &str) -> Result<(), EngineError> {
        let _ = token;
        Ok(())
    }

    /// Allocates a new rendering surface. Surface events are delivered to `events` until the
    /// surface is destroyed.
    fn create_surface(&self, events: SurfaceEventSink) -> Result<SurfaceId, EngineError>;
    /// Starts rendering into the surface.
    fn start_render(&self, surface: SurfaceId);
    /// Stops rendering into the surface.
    fn stop_render(&self, surface: SurfaceId);
    /// Releases the surface. Called only for surfaces that are not rendering.
    fn destroy_surface(&self, surface: SurfaceId);

    /// Moves the camera to the position and zoom level.
    fn center_on(
        &self,
        surface: SurfaceId,
        position: GeoPoint2d,
        zoom_level: u32,
        duration: Duration,
        done: AnimationCallback,
    );
    /// Switches the camera perspective.
    fn set_perspective(
        &self,
        surface: SurfaceId,
        perspective: Perspective,
        duration: Duration,
        done: AnimationCallback,
    );
    /// Rotates the map north up.
    fn align_north_up(&self, surface: SurfaceId, duration: Duration, done: AnimationCallback);
    /// Starts tracking the device position. `done` is called once the camera reached the
    /// position.
    fn start_following_position(
        &self,
        surface: SurfaceId,
        duration: Duration,
        done: AnimationCallback,
    );
    /// Stops tracking the device position.
    fn stop_following_position(&self, surface: SurfaceId);
    /// Draws the routes and fits the camera to them. Never called with an empty slice.
    fn present_routes(
        &self,
        surface: SurfaceId,
        routes: &[Route],
        duration: Duration,
        done: AnimationCallback,
    );
    /// Interrupts the running camera animation of the surface, if any.
    fn cancel_animation(&self, surface: SurfaceId);
    /// Sets how the surface reacts to touches.
    fn set_touch_behaviour(&self, surface: SurfaceId, behaviour: TouchBehaviour);

    /// Searches landmarks around a location. The engine may return more than `max_matches`
    /// results.
    fn search(
        &self,
        id: OperationId,
        query: &SearchQuery,
        around: GeoPoint2d,
        max_matches: usize,
        done: SearchCallback,
    );
    /// Calculates routes through the waypoints.
    fn calculate_route(
        &self,
        id: OperationId,
        waypoints: &[GeoPoint2d],
        preferences: &RoutePreferences,
        status: RouteStatusCallback,
        done: RouteCallback,
    );
    /// Interrupts a running query.
    fn cancel_query(&self, id: OperationId);

    /// Draws a highlight set over the surface.
    fn draw_highlights(
        &self,
        surface: SurfaceId,
        id: HighlightId,
        items: &[Highlight],
        settings: &HighlightRenderSettings,
    );
    /// Removes a previously drawn highlight set.
    fn clear_highlights(&self, surface: SurfaceId, id: HighlightId);
}
