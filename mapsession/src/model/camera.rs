#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Camera perspective of the map.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Perspective {
    /// Map viewed straight from above.
    #[default]
    TwoDimensional,
    /// Tilted camera.
    ThreeDimensional,
}

impl Perspective {
    /// The other perspective. Used by perspective toggle buttons.
    pub fn toggled(self) -> Self {
        match self {
            Self::TwoDimensional => Self::ThreeDimensional,
            Self::ThreeDimensional => Self::TwoDimensional,
        }
    }
}

/// How the surface reacts to touches.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TouchBehaviour {
    /// Pan, zoom and rotate gestures move the camera. A pan stops following the position.
    #[default]
    Default,
    /// Gestures move the camera, and a tap on the position indicator starts following again.
    FollowPositionOnRecenter,
    /// The surface ignores touches.
    Disabled,
}
