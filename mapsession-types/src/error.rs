//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    /// Latitude or longitude is outside of the valid range or is not a finite number.
    #[error("invalid coordinates: lat {lat}, lon {lon}")]
    InvalidCoordinates {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
    },
    /// A bounding rectangle cannot be built from an empty point set.
    #[error("cannot build a bounding rectangle from an empty point set")]
    EmptyPointSet,
}
