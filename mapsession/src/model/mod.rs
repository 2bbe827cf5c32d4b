//! Values exchanged with the native engine: search results, routes and camera settings.

mod camera;
mod landmark;
mod route;

use std::fmt::{Display, Formatter};

pub use camera::{Perspective, TouchBehaviour};
pub use landmark::{Landmark, LandmarkCategory};
pub use route::{Route, RouteId, RoutePreferences, RouteStatus, TransportMode};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque error code returned by the search and routing backends.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueryCode(pub i32);

impl QueryCode {
    /// Route calculation was requested with less than two waypoints.
    pub const INSUFFICIENT_WAYPOINTS: QueryCode = QueryCode(-1);
    /// Backend could not find a route between the waypoints.
    pub const NO_ROUTE: QueryCode = QueryCode(-2);
    /// Backend requires a network connection that is not available.
    pub const NO_CONNECTION: QueryCode = QueryCode(-3);
    /// The query was interrupted before it finished.
    pub const INTERRUPTED: QueryCode = QueryCode(-4);
}

impl Display for QueryCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::INSUFFICIENT_WAYPOINTS => write!(f, "{} (insufficient waypoints)", self.0),
            Self::NO_ROUTE => write!(f, "{} (no route)", self.0),
            Self::NO_CONNECTION => write!(f, "{} (no connection)", self.0),
            Self::INTERRUPTED => write!(f, "{} (interrupted)", self.0),
            _ => write!(f, "{}", self.0),
        }
    }
}
