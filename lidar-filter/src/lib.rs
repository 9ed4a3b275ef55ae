mod constants;
mod error;
mod source_threads;

pub mod config;
pub mod node;
pub mod ransac;
pub mod regression;
pub mod replay;
#[cfg(feature = "ros2")]
pub mod ros;
pub mod transform;
pub mod view;

pub use crate::config::{ErrorPolicy, FilterConfig, ViewMode};
pub use crate::error::{LidarFilterError, Result};
pub use crate::node::ScanFilterNode;
pub use crate::ransac::{RansacConfig, RansacRegressor};
pub use crate::regression::{LinearRegression, Regressor};
pub use crate::replay::run_replay_source;
#[cfg(feature = "ros2")]
pub use crate::ros::run_ros_source;
pub use crate::source_threads::{join, SourceThreads};
pub use crate::transform::{polar_to_cartesian, scan_to_points, split_xy};
pub use lidar_data::{FitResult, LaserScan, LineModel, Point2};
