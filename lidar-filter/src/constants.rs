pub(crate) const NODE_NAME: &str = "lidar_filters";
pub(crate) const SCAN_TOPIC: &str = "/scan";
// Capacity of the queue between the source thread and the processing loop.
pub(crate) const SCAN_QUEUE_DEPTH: usize = 10;
pub(crate) const TERMINATOR_QUEUE_DEPTH: usize = 10;
pub(crate) const RECV_TIMEOUT_MS: u64 = 100;
#[cfg(feature = "ros2")]
pub(crate) const SPIN_TIMEOUT_MS: u64 = 10;

pub(crate) const RESIDUAL_THRESHOLD: f64 = 5.0;
pub(crate) const MIN_SAMPLES: usize = 2;
pub(crate) const MAX_TRIALS: usize = 100;
pub(crate) const STOP_PROBABILITY: f64 = 0.99;
pub(crate) const RANDOM_SEED: u64 = 0;

pub(crate) const PLOT_WIDTH: u32 = 800;
pub(crate) const PLOT_HEIGHT: u32 = 800;
// Fraction of the point extent added on each side of the chart.
pub(crate) const PLOT_MARGIN_RATIO: f64 = 0.05;
pub(crate) const PLOT_MIN_SPAN: f64 = 1.0;
