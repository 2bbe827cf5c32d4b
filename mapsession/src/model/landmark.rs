use mapsession_types::GeoPoint2d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Generic landmark category that searches can be restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LandmarkCategory {
    /// Fuel and charging stations.
    GasStation,
    /// Parking lots and garages.
    Parking,
    /// Restaurants, cafes and bars.
    FoodAndDrink,
    /// Hotels and other lodging.
    Accommodation,
    /// Hospitals, pharmacies, clinics.
    Medical,
    /// Shops and malls.
    Shopping,
    /// Sights and museums.
    Sightseeing,
    /// Engine specific category identified by its name.
    Other(String),
}

/// A point of interest returned by a search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Landmark {
    /// Display name.
    pub name: String,
    /// Location of the landmark.
    pub position: GeoPoint2d,
    /// Category the engine put the landmark into, if any.
    pub category: Option<LandmarkCategory>,
}

impl Landmark {
    /// Creates a landmark without a category.
    pub fn new(name: impl Into<String>, position: GeoPoint2d) -> Self {
        Self {
            name: name.into(),
            position,
            category: None,
        }
    }

    /// Sets the category of the landmark.
    pub fn with_category(mut self, category: LandmarkCategory) -> Self {
        self.category = Some(category);
        self
    }
}
