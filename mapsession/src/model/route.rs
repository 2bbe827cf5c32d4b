use std::time::Duration;

use mapsession_types::{GeoPoint2d, GeoRect, TypesError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Engine assigned route identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteId(pub u64);

/// A calculated route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    /// Route identifier.
    pub id: RouteId,
    /// Waypoints the route goes through, in travel order.
    pub waypoints: Vec<GeoPoint2d>,
    /// Total length in meters.
    pub length_m: f64,
    /// Estimated travel time.
    pub duration: Duration,
    /// Bounding rectangle of the route geometry.
    pub bounds: GeoRect,
}

impl Route {
    /// Creates a route through the waypoints with bounds computed from them.
    pub fn new(
        id: RouteId,
        waypoints: Vec<GeoPoint2d>,
        length_m: f64,
        duration: Duration,
    ) -> Result<Self, TypesError> {
        let bounds = GeoRect::from_points(waypoints.iter())?;
        Ok(Self {
            id,
            waypoints,
            length_m,
            duration,
            bounds,
        })
    }
}

/// Means of transport the route is calculated for.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TransportMode {
    /// Passenger car.
    #[default]
    Car,
    /// Truck with lorry restrictions.
    Lorry,
    /// Walking.
    Pedestrian,
    /// Bicycle.
    Bicycle,
    /// Public transport connections.
    PublicTransport,
}

/// Route calculation preferences.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutePreferences {
    /// Transport mode.
    pub transport: TransportMode,
    /// Avoid motorways.
    pub avoid_motorways: bool,
    /// Avoid toll roads.
    pub avoid_tolls: bool,
    /// Avoid ferries.
    pub avoid_ferries: bool,
    /// Ask for alternative routes in addition to the best one.
    pub alternatives: bool,
}

impl RoutePreferences {
    /// Preferences for the given transport mode with no avoidances.
    pub fn for_transport(transport: TransportMode) -> Self {
        Self {
            transport,
            ..Default::default()
        }
    }

    /// Requests alternative routes.
    pub fn with_alternatives(mut self, alternatives: bool) -> Self {
        self.alternatives = alternatives;
        self
    }
}

/// Progress of a route calculation reported by the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RouteStatus {
    /// Calculation in progress.
    Calculating,
    /// Calculation paused until the network is back.
    WaitingInternetConnection,
    /// Result is about to be delivered.
    Ready,
}

#[cfg(test)]
mod tests {
    use mapsession_types::latlon;

    use super::*;

    #[test]
    fn route_bounds_cover_waypoints() {
        let route = Route::new(
            RouteId(1),
            vec![latlon!(48.85, 2.35), latlon!(50.85, 4.35)],
            300_000.0,
            Duration::from_secs(3 * 3600),
        )
        .expect("waypoints are not empty");

        assert_eq!(route.bounds.min(), latlon!(48.85, 2.35));
        assert_eq!(route.bounds.max(), latlon!(50.85, 4.35));
    }

    #[test]
    fn route_without_waypoints_is_rejected() {
        assert_eq!(
            Route::new(RouteId(1), vec![], 0.0, Duration::ZERO),
            Err(TypesError::EmptyPointSet)
        );
    }
}
