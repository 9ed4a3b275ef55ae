#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One planar laser scan, laid out like `sensor_msgs/msg/LaserScan`.
#[derive(Clone, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LaserScan {
    /// Frame the scan was taken in.
    pub frame_id: String,
    /// Start angle of the scan in radian.
    pub angle_min: f32,
    /// End angle of the scan in radian.
    pub angle_max: f32,
    /// Angular distance between two readings in radian.
    pub angle_increment: f32,
    /// Time between two readings in seconds.
    pub time_increment: f32,
    /// Time between two scans in seconds.
    pub scan_time: f32,
    /// Minimum valid range in meters.
    pub range_min: f32,
    /// Maximum valid range in meters.
    pub range_max: f32,
    /// Range readings in meters, one per angular step.
    pub ranges: Vec<f32>,
    /// Return strength of each reading. May be empty.
    pub intensities: Vec<f32>,
}

impl LaserScan {
    /// Angle of the `index`-th reading in radian.
    pub fn angle_at(&self, index: usize) -> f64 {
        (self.angle_min as f64) + (index as f64) * (self.angle_increment as f64)
    }

    /// Whether `range` lies within `[range_min, range_max]`. NaN never does.
    pub fn is_valid_range(&self, range: f32) -> bool {
        range >= self.range_min && range <= self.range_max
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
