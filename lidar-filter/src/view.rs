use crate::config::{ViewConfig, ViewMode};
use crate::constants::{PLOT_MARGIN_RATIO, PLOT_MIN_SPAN};
use crate::error::{LidarFilterError, Result};
use lidar_data::{FitResult, Point2};
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::path::PathBuf;

/// One processed scan ready to be drawn.
pub struct ScanPlot<'a> {
    pub points: &'a [Point2],
    pub fit: &'a FitResult,
    /// Index of the scan since the node started.
    pub sequence: u64,
}

/// Visible window of a chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl<'a> ScanPlot<'a> {
    pub fn new(points: &'a [Point2], fit: &'a FitResult, sequence: u64) -> ScanPlot<'a> {
        ScanPlot {
            points,
            fit,
            sequence,
        }
    }

    pub fn bounds(&self) -> PlotBounds {
        plot_bounds(self.points)
    }

    /// Draws inliers, outliers and the fitted line onto `root`.
    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE).map_err(plot_error)?;
        let bounds = self.bounds();

        let mut chart = ChartBuilder::on(root)
            .caption(format!("scan #{}", self.sequence), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(bounds.x_min..bounds.x_max, bounds.y_min..bounds.y_max)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("X")
            .y_desc("Y")
            .draw()
            .map_err(plot_error)?;

        chart
            .draw_series(
                self.fit
                    .inliers(self.points)
                    .map(|p| Circle::new((p.x, p.y), 3, BLUE.filled())),
            )
            .map_err(plot_error)?
            .label("Inliers")
            .legend(|(x, y)| Circle::new((x, y), 3, BLUE.filled()));

        chart
            .draw_series(
                self.fit
                    .outliers(self.points)
                    .map(|p| Cross::new((p.x, p.y), 4, RED.stroke_width(2))),
            )
            .map_err(plot_error)?
            .label("Outliers")
            .legend(|(x, y)| Cross::new((x, y), 4, RED.stroke_width(2)));

        let model = self.fit.model;
        let x_range = x_extent(self.points);
        chart
            .draw_series(LineSeries::new(
                x_range.map(|x| (x, model.predict(x))),
                BLACK.stroke_width(2),
            ))
            .map_err(plot_error)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
        Ok(())
    }
}

/// Point extent padded by a margin, never narrower than `PLOT_MIN_SPAN`.
pub fn plot_bounds(points: &[Point2]) -> PlotBounds {
    if points.is_empty() {
        let half = PLOT_MIN_SPAN / 2.;
        return PlotBounds {
            x_min: -half,
            x_max: half,
            y_min: -half,
            y_max: half,
        };
    }
    let (x_min, x_max) = min_max(points.iter().map(|p| p.x));
    let (y_min, y_max) = min_max(points.iter().map(|p| p.y));
    let (x_min, x_max) = pad(x_min, x_max);
    let (y_min, y_max) = pad(y_min, y_max);
    PlotBounds {
        x_min,
        x_max,
        y_min,
        y_max,
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn pad(lo: f64, hi: f64) -> (f64, f64) {
    let span = f64::max(hi - lo, PLOT_MIN_SPAN);
    let center = (lo + hi) / 2.;
    let half = span * (0.5 + PLOT_MARGIN_RATIO);
    (center - half, center + half)
}

fn x_extent(points: &[Point2]) -> impl Iterator<Item = f64> {
    let (lo, hi) = if points.is_empty() {
        (0., 0.)
    } else {
        min_max(points.iter().map(|p| p.x))
    };
    [lo, hi].into_iter()
}

fn plot_error<E: Display>(e: E) -> LidarFilterError {
    LidarFilterError::Plot(e.to_string())
}

/// Sink for processed scans.
pub trait ScanView {
    fn show(&mut self, plot: &ScanPlot) -> Result<()>;
}

/// Discards every scan.
pub struct NullView;

impl ScanView for NullView {
    fn show(&mut self, _plot: &ScanPlot) -> Result<()> {
        Ok(())
    }
}

/// Writes every scan as a PNG file. Never blocks on user interaction.
pub struct SnapshotView {
    output_dir: PathBuf,
    keep_all: bool,
    size: (u32, u32),
}

impl SnapshotView {
    pub fn new(output_dir: PathBuf, keep_all: bool, size: (u32, u32)) -> Result<SnapshotView> {
        std::fs::create_dir_all(&output_dir)?;
        Ok(SnapshotView {
            output_dir,
            keep_all,
            size,
        })
    }

    pub fn path_for(&self, sequence: u64) -> PathBuf {
        if self.keep_all {
            self.output_dir.join(format!("scan_{:06}.png", sequence))
        } else {
            self.output_dir.join("latest.png")
        }
    }
}

impl ScanView for SnapshotView {
    fn show(&mut self, plot: &ScanPlot) -> Result<()> {
        let path = self.path_for(plot.sequence);
        let root = BitMapBackend::new(&path, self.size).into_drawing_area();
        plot.draw(&root)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(feature = "window")]
mod window {
    use super::{ScanPlot, ScanView};
    use crate::error::{LidarFilterError, Result};
    use piston_window::{EventLoop, PistonWindow, WindowSettings};
    use plotters::drawing::IntoDrawingArea;
    use plotters_piston::{draw_piston_window, PistonBackend};

    const FPS: u64 = 30;

    /// Opens a window per scan and blocks until the user closes it.
    pub struct WindowView {
        size: (u32, u32),
    }

    impl WindowView {
        pub fn new(size: (u32, u32)) -> WindowView {
            WindowView { size }
        }
    }

    impl ScanView for WindowView {
        fn show(&mut self, plot: &ScanPlot) -> Result<()> {
            let title = format!("LiDAR scan #{}", plot.sequence);
            let mut window: PistonWindow = WindowSettings::new(title, [self.size.0, self.size.1])
                .exit_on_esc(true)
                .build()
                .map_err(|e| LidarFilterError::Plot(e.to_string()))?;
            window.set_max_fps(FPS);

            let mut failure = None;
            while draw_piston_window(&mut window, |b: PistonBackend| {
                if let Err(e) = plot.draw(&b.into_drawing_area()) {
                    failure = Some(e);
                }
                Ok(())
            })
            .is_some()
            {
                if failure.is_some() {
                    break;
                }
            }
            failure.map_or(Ok(()), Err)
        }
    }
}

#[cfg(feature = "window")]
pub use window::WindowView;

/// Builds the view selected by `config`.
pub fn build_view(config: &ViewConfig) -> Result<Box<dyn ScanView>> {
    let size = (config.width, config.height);
    match config.mode {
        ViewMode::Off => Ok(Box::new(NullView)),
        ViewMode::Snapshot => Ok(Box::new(SnapshotView::new(
            config.output_dir.clone(),
            config.keep_all,
            size,
        )?)),
        #[cfg(feature = "window")]
        ViewMode::Window => Ok(Box::new(WindowView::new(size))),
        #[cfg(not(feature = "window"))]
        ViewMode::Window => Err(LidarFilterError::InvalidConfig(
            "the window view requires the `window` feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lidar_data::LineModel;

    #[test]
    fn test_plot_bounds_contain_points() {
        let points = vec![Point2::new(-2., 1.), Point2::new(4., 3.)];
        let b = plot_bounds(&points);
        assert!(b.x_min < -2. && b.x_max > 4.);
        assert!(b.y_min < 1. && b.y_max > 3.);
        assert!(f64::abs((b.x_min + b.x_max) / 2. - 1.) < 1e-12);
    }

    #[test]
    fn test_plot_bounds_min_span() {
        let b = plot_bounds(&[Point2::new(1., 1.)]);
        assert!(b.x_max - b.x_min >= PLOT_MIN_SPAN);
        assert!(b.y_max - b.y_min >= PLOT_MIN_SPAN);

        let b = plot_bounds(&[]);
        assert_eq!(b.x_max - b.x_min, PLOT_MIN_SPAN);
    }

    #[test]
    fn test_x_extent() {
        let points = vec![Point2::new(3., 0.), Point2::new(-1., 0.), Point2::new(2., 0.)];
        assert_eq!(x_extent(&points).collect::<Vec<_>>(), vec![-1., 3.]);
    }

    #[test]
    fn test_snapshot_paths() {
        let dir = tempfile::tempdir().unwrap();
        let view = SnapshotView::new(dir.path().join("all"), true, (100, 100)).unwrap();
        assert_eq!(view.path_for(42), dir.path().join("all").join("scan_000042.png"));
        assert!(dir.path().join("all").is_dir());

        let view = SnapshotView::new(dir.path().to_path_buf(), false, (100, 100)).unwrap();
        assert_eq!(view.path_for(42), dir.path().join("latest.png"));
    }

    #[test]
    fn test_null_view() {
        let points = vec![Point2::new(0., 0.)];
        let fit = FitResult {
            model: LineModel::new(0., 0.),
            inlier_mask: vec![true],
            n_trials: 1,
            score: 1.,
        };
        assert!(NullView.show(&ScanPlot::new(&points, &fit, 0)).is_ok());
    }

    #[test]
    fn test_build_view() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewConfig {
            mode: ViewMode::Off,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(build_view(&config).is_ok());

        #[cfg(not(feature = "window"))]
        {
            let config = ViewConfig {
                mode: ViewMode::Window,
                ..config
            };
            assert!(matches!(
                build_view(&config),
                Err(LidarFilterError::InvalidConfig(_))
            ));
        }
    }
}
