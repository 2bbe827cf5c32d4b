use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::geo::{GeoPoint, GeoPoint2d, NewGeoPoint};

/// Geographic bounding rectangle in degrees.
///
/// Rectangles crossing the antimeridian are not supported: `lon_min` is always less or equal to
/// `lon_max`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRect {
    lat_min: f64,
    lon_min: f64,
    lat_max: f64,
    lon_max: f64,
}

impl GeoRect {
    /// Creates a rectangle from two opposite corners given in any order.
    pub fn new(a: impl GeoPoint<Num = f64>, b: impl GeoPoint<Num = f64>) -> Self {
        Self {
            lat_min: a.lat().min(b.lat()),
            lon_min: a.lon().min(b.lon()),
            lat_max: a.lat().max(b.lat()),
            lon_max: a.lon().max(b.lon()),
        }
    }

    /// Smallest rectangle containing all the given points.
    pub fn from_points<'a>(
        points: impl IntoIterator<Item = &'a GeoPoint2d>,
    ) -> Result<Self, TypesError> {
        let mut iter = points.into_iter();
        let first = iter.next().ok_or(TypesError::EmptyPointSet)?;
        let mut rect = Self::new(*first, *first);
        for point in iter {
            rect = rect.merge_point(point);
        }

        Ok(rect)
    }

    /// South-west corner.
    pub fn min(&self) -> GeoPoint2d {
        GeoPoint2d::latlon(self.lat_min, self.lon_min)
    }

    /// North-east corner.
    pub fn max(&self) -> GeoPoint2d {
        GeoPoint2d::latlon(self.lat_max, self.lon_max)
    }

    /// Center of the rectangle.
    pub fn center(&self) -> GeoPoint2d {
        GeoPoint2d::latlon(
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// Returns true if the point is inside the rectangle or on its border.
    pub fn contains(&self, point: &impl GeoPoint<Num = f64>) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.lat())
            && (self.lon_min..=self.lon_max).contains(&point.lon())
    }

    /// Extends the rectangle to include the point.
    pub fn merge_point(&self, point: &impl GeoPoint<Num = f64>) -> Self {
        Self {
            lat_min: self.lat_min.min(point.lat()),
            lon_min: self.lon_min.min(point.lon()),
            lat_max: self.lat_max.max(point.lat()),
            lon_max: self.lon_max.max(point.lon()),
        }
    }

    /// Smallest rectangle containing both rectangles.
    pub fn merge(&self, other: &Self) -> Self {
        self.merge_point(&other.min()).merge_point(&other.max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latlon;

    #[test]
    fn from_points_builds_bounds() {
        let points = [latlon!(1.0, 5.0), latlon!(-2.0, 3.0), latlon!(4.0, 4.0)];
        let rect = GeoRect::from_points(points.iter()).expect("non-empty");

        assert_eq!(rect.min(), latlon!(-2.0, 3.0));
        assert_eq!(rect.max(), latlon!(4.0, 5.0));
        assert_eq!(rect.center(), latlon!(1.0, 4.0));
        assert!(rect.contains(&latlon!(0.0, 4.5)));
        assert!(!rect.contains(&latlon!(0.0, 5.5)));
    }

    #[test]
    fn from_empty_points_fails() {
        let empty: [GeoPoint2d; 0] = [];
        assert_eq!(
            GeoRect::from_points(empty.iter()),
            Err(TypesError::EmptyPointSet)
        );
    }

    #[test]
    fn merge_rects() {
        let a = GeoRect::new(latlon!(0.0, 0.0), latlon!(1.0, 1.0));
        let b = GeoRect::new(latlon!(2.0, -1.0), latlon!(3.0, 0.5));
        let merged = a.merge(&b);

        assert_eq!(merged.min(), latlon!(0.0, -1.0));
        assert_eq!(merged.max(), latlon!(3.0, 1.0));
    }
}
