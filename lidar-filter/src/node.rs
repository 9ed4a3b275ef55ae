use crate::config::{ErrorPolicy, FilterConfig};
use crate::constants::RECV_TIMEOUT_MS;
use crate::error::Result;
use crate::ransac::RansacRegressor;
use crate::transform::{scan_to_points, split_xy};
use crate::view::{build_view, ScanPlot, ScanView};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use lidar_data::{FitResult, LaserScan, LineModel, Point2};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Subscriber state: the line estimator, re-fitted on every scan, and the
/// view every fitted scan is handed to.
pub struct ScanFilterNode {
    ransac: RansacRegressor,
    view: Box<dyn ScanView>,
    processed: u64,
    failed: u64,
}

impl ScanFilterNode {
    pub fn new(ransac: RansacRegressor, view: Box<dyn ScanView>) -> ScanFilterNode {
        ScanFilterNode {
            ransac,
            view,
            processed: 0,
            failed: 0,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Result<ScanFilterNode> {
        let ransac = RansacRegressor::new(config.fit.clone())?;
        let view = build_view(&config.view)?;
        Ok(ScanFilterNode::new(ransac, view))
    }

    /// Scan callback: transform, fit, then show.
    pub fn on_scan(&mut self, scan: &LaserScan) -> Result<FitResult> {
        let points = scan_to_points(scan);
        debug!(
            "Scan from '{}': {} of {} readings in range",
            scan.frame_id,
            points.len(),
            scan.len()
        );
        self.filter_points(&points)
    }

    /// Splits `points` into inliers and outliers of the dominant line.
    pub fn filter_points(&mut self, points: &[Point2]) -> Result<FitResult> {
        let sequence = self.processed + self.failed;
        let (x, y) = split_xy(points);
        let fit = match self.ransac.fit(&x, &y) {
            Ok(fit) => fit,
            Err(e) => {
                self.failed += 1;
                return Err(e);
            }
        };
        self.processed += 1;

        debug!(
            "Scan #{sequence}: {} inliers, {} outliers, y = {:.3} x + {:.3} after {} trials",
            fit.n_inliers(),
            fit.n_outliers(),
            fit.model.slope,
            fit.model.intercept,
            fit.n_trials
        );

        let plot = ScanPlot::new(points, &fit, sequence);
        if let Err(e) = self.view.show(&plot) {
            warn!("Failed to show scan #{sequence}: {e}");
        }
        Ok(fit)
    }

    /// Processes scans in arrival order until the source closes or `running`
    /// is cleared.
    ///
    /// With [`ErrorPolicy::Shutdown`] the first failing scan ends the loop
    /// and its error is returned.
    pub fn spin(
        &mut self,
        scan_rx: &Receiver<LaserScan>,
        running: &AtomicBool,
        policy: ErrorPolicy,
    ) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let scan = match scan_rx.recv_timeout(Duration::from_millis(RECV_TIMEOUT_MS)) {
                Ok(scan) => scan,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            if let Err(e) = self.on_scan(&scan) {
                match policy {
                    ErrorPolicy::Shutdown => return Err(e),
                    ErrorPolicy::Skip => warn!("Skipping scan: {e}"),
                }
            }
        }
        Ok(())
    }

    /// Line of the last successful fit.
    pub fn estimator(&self) -> Option<LineModel> {
        self.ransac.estimator()
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LidarFilterError;
    use crate::ransac::RansacConfig;
    use std::cell::RefCell;
    use std::rc::Rc;
    use crossbeam_channel::bounded;

    #[derive(Default)]
    struct RecordingView {
        shown: Rc<RefCell<Vec<(u64, usize, usize)>>>,
    }

    impl ScanView for RecordingView {
        fn show(&mut self, plot: &ScanPlot) -> Result<()> {
            self.shown.borrow_mut().push((
                plot.sequence,
                plot.fit.n_inliers(),
                plot.fit.n_outliers(),
            ));
            Ok(())
        }
    }

    struct FailingView;

    impl ScanView for FailingView {
        fn show(&mut self, _plot: &ScanPlot) -> Result<()> {
            Err(LidarFilterError::Plot("no display".to_string()))
        }
    }

    /// Wall 2 m ahead seen over +-60 degrees, with a box 1 m ahead in the middle.
    fn wall_scan() -> LaserScan {
        let n = 121;
        let angle_min = -std::f32::consts::FRAC_PI_3;
        let angle_increment = 2. * std::f32::consts::FRAC_PI_3 / ((n - 1) as f32);
        let ranges = (0..n)
            .map(|i| {
                let angle = angle_min + (i as f32) * angle_increment;
                if (55..=65).contains(&i) {
                    1.0 / angle.cos()
                } else {
                    2.0 / angle.cos()
                }
            })
            .collect();
        LaserScan {
            frame_id: "laser".to_string(),
            angle_min,
            angle_max: -angle_min,
            angle_increment,
            range_min: 0.12,
            range_max: 10.,
            ranges,
            ..Default::default()
        }
    }

    fn node(view: Box<dyn ScanView>, residual_threshold: f64) -> ScanFilterNode {
        let config = RansacConfig {
            residual_threshold,
            ..Default::default()
        };
        ScanFilterNode::new(RansacRegressor::new(config).unwrap(), view)
    }

    #[test]
    fn test_on_scan_separates_box_from_wall() {
        // A quarter turn puts the wall on the line y = 2.
        let mut scan = wall_scan();
        scan.angle_min += std::f32::consts::FRAC_PI_2;
        scan.angle_max += std::f32::consts::FRAC_PI_2;

        let view = RecordingView::default();
        let shown = view.shown.clone();
        let mut node = node(Box::new(view), 0.1);

        let fit = node.on_scan(&scan).unwrap();
        assert_eq!(fit.inlier_mask.len(), 121);
        assert_eq!(fit.n_outliers(), 11);
        for (i, &inlier) in fit.inlier_mask.iter().enumerate() {
            assert_eq!(inlier, !(55..=65).contains(&i), "index {i}");
        }
        let line = node.estimator().unwrap();
        assert!(f64::abs(line.slope) < 1e-3);
        assert!(f64::abs(line.intercept - 2.) < 1e-3);

        assert_eq!(*shown.borrow(), vec![(0, 110, 11)]);
        assert_eq!(node.processed(), 1);
        assert_eq!(node.failed(), 0);
    }

    #[test]
    fn test_on_scan_without_valid_readings() {
        let mut scan = wall_scan();
        scan.ranges = vec![f32::INFINITY; 121];
        let mut node = node(Box::new(RecordingView::default()), 5.);
        assert!(matches!(
            node.on_scan(&scan),
            Err(LidarFilterError::EmptyPointSet)
        ));
        scan.ranges[3] = 1.;
        assert!(matches!(
            node.on_scan(&scan),
            Err(LidarFilterError::TooFewPoints { .. })
        ));
        assert_eq!(node.failed(), 2);
        assert!(node.estimator().is_none());
    }

    #[test]
    fn test_view_failure_keeps_fit() {
        let mut node = node(Box::new(FailingView), 5.);
        assert!(node.on_scan(&wall_scan()).is_ok());
        assert_eq!(node.processed(), 1);
    }

    #[test]
    fn test_spin_until_source_closes() {
        let view = RecordingView::default();
        let shown = view.shown.clone();
        let mut node = node(Box::new(view), 5.);
        let (tx, rx) = bounded(4);
        tx.send(wall_scan()).unwrap();
        tx.send(wall_scan()).unwrap();
        drop(tx);

        let running = AtomicBool::new(true);
        node.spin(&rx, &running, ErrorPolicy::Shutdown).unwrap();
        assert_eq!(node.processed(), 2);
        let sequences: Vec<u64> = shown.borrow().iter().map(|s| s.0).collect();
        assert_eq!(sequences, vec![0, 1]);
    }

    #[test]
    fn test_spin_error_policy() {
        let empty = LaserScan {
            ranges: vec![0.; 10],
            range_min: 0.1,
            range_max: 1.,
            ..Default::default()
        };
        let running = AtomicBool::new(true);

        let mut shutdown_node = node(Box::new(RecordingView::default()), 5.);
        let (tx, rx) = bounded(4);
        tx.send(empty.clone()).unwrap();
        tx.send(wall_scan()).unwrap();
        drop(tx);
        assert!(shutdown_node
            .spin(&rx, &running, ErrorPolicy::Shutdown)
            .is_err());
        assert_eq!(shutdown_node.processed(), 0);

        let mut skip_node = node(Box::new(RecordingView::default()), 5.);
        let (tx, rx) = bounded(4);
        tx.send(empty).unwrap();
        tx.send(wall_scan()).unwrap();
        drop(tx);
        skip_node.spin(&rx, &running, ErrorPolicy::Skip).unwrap();
        assert_eq!(skip_node.failed(), 1);
        assert_eq!(skip_node.processed(), 1);
    }

    #[test]
    fn test_spin_stops_when_interrupted() {
        let mut node = node(Box::new(RecordingView::default()), 5.);
        let (tx, rx) = bounded(4);
        tx.send(wall_scan()).unwrap();
        let running = AtomicBool::new(false);
        node.spin(&rx, &running, ErrorPolicy::Shutdown).unwrap();
        assert_eq!(node.processed(), 0);
        drop(tx);
    }
}
