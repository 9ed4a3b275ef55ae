use lidar_data::{LaserScan, Point2};

/// Projects every valid reading of `scan` into the scan frame.
///
/// A reading is kept when [`LaserScan::is_valid_range`] accepts it. The angle
/// of the `i`-th reading is [`LaserScan::angle_at`], so skipped readings still
/// advance the angle. The output keeps the input order.
pub fn scan_to_points(scan: &LaserScan) -> Vec<Point2> {
    scan.ranges
        .iter()
        .enumerate()
        .filter(|(_, &r)| scan.is_valid_range(r))
        .map(|(i, &r)| Point2::from_polar(r as f64, scan.angle_at(i)))
        .collect()
}

/// Converts bare range readings to Cartesian points.
/// See [`scan_to_points`].
pub fn polar_to_cartesian(
    ranges: &[f32],
    range_min: f32,
    range_max: f32,
    angle_min: f32,
    angle_increment: f32,
) -> Vec<Point2> {
    let scan = LaserScan {
        angle_min,
        angle_increment,
        range_min,
        range_max,
        ranges: ranges.to_vec(),
        ..Default::default()
    };
    scan_to_points(&scan)
}

/// Splits points into the independent (`x`) and dependent (`y`) arrays.
pub fn split_xy(points: &[Point2]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.x, p.y)).unzip()
}
