#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cartesian point in the scan frame, in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Point2 {
        Point2 { x, y }
    }

    /// Point at `range` along the ray `angle_radian`.
    pub fn from_polar(range: f64, angle_radian: f64) -> Point2 {
        Point2 {
            x: range * angle_radian.cos(),
            y: range * angle_radian.sin(),
        }
    }
}
