pub mod fit;
pub mod point;
pub mod scan;

pub use fit::{FitResult, LineModel};
pub use point::Point2;
pub use scan::LaserScan;
