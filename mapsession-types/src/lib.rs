//! Geographic value types used by `mapsession` and by native engine integrations.
//!
//! The types here carry no behaviour tied to a particular engine. They are plain values that can
//! be copied across the engine boundary and compared in tests.

mod color;
pub mod error;
pub mod geo;
mod rect;

pub use color::Color;
pub use error::TypesError;
pub use geo::{GeoPoint, GeoPoint2d, NewGeoPoint};
pub use rect::GeoRect;
