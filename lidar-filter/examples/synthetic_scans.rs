use clap::{Arg, Command};
use lidar_data::LaserScan;
use lidar_filter::replay::write_scan;
use lidar_filter::view::{ScanPlot, ScanView, SnapshotView};
use lidar_filter::{scan_to_points, split_xy, RansacConfig, RansacRegressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

const N_READINGS: usize = 360;
const WALL_DISTANCE: f32 = 2.0;
const NOISE: f32 = 0.01;

fn get_args() -> (PathBuf, usize, Option<PathBuf>) {
    let matches = Command::new("Synthetic LiDAR scans.")
        .about("Writes scans of a wall with a box in front of it, for --replay.")
        .disable_version_flag(true)
        .arg(
            Arg::new("output")
                .help("JSON lines file to write")
                .required(true),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .help("Number of scans")
                .value_parser(clap::value_parser!(usize))
                .default_value("20"),
        )
        .arg(
            Arg::new("plot")
                .long("plot")
                .help("Directory to render the fit of the first scan into"),
        )
        .get_matches();

    let output: &String = matches.get_one("output").unwrap();
    let count: usize = *matches.get_one("count").unwrap();
    let plot = matches.get_one::<String>("plot").map(PathBuf::from);
    (PathBuf::from(output), count, plot)
}

/// Wall on `y = WALL_DISTANCE` over the front half turn, with a box that
/// slides along it from scan to scan.
fn synthetic_scan(rng: &mut StdRng, index: usize) -> LaserScan {
    let angle_min = 0.1_f32;
    let angle_max = std::f32::consts::PI - 0.1;
    let angle_increment = (angle_max - angle_min) / ((N_READINGS - 1) as f32);
    let box_start = 100 + (index * 7) % 140;

    let ranges = (0..N_READINGS)
        .map(|i| {
            let angle = angle_min + (i as f32) * angle_increment;
            let depth = if (box_start..box_start + 20).contains(&i) {
                WALL_DISTANCE * 0.6
            } else {
                WALL_DISTANCE
            };
            depth / angle.sin() + rng.gen_range(-NOISE..NOISE)
        })
        .collect();

    LaserScan {
        frame_id: "laser".to_string(),
        angle_min,
        angle_max,
        angle_increment,
        time_increment: 0.1 / (N_READINGS as f32),
        scan_time: 0.1,
        range_min: 0.12,
        range_max: 12.,
        ranges,
        intensities: Vec::new(),
    }
}

fn main() {
    let (output, count, plot) = get_args();
    let mut rng = StdRng::seed_from_u64(0);
    let scans: Vec<LaserScan> = (0..count).map(|i| synthetic_scan(&mut rng, i)).collect();

    let mut writer = BufWriter::new(File::create(&output).unwrap());
    for scan in scans.iter() {
        write_scan(&mut writer, scan).unwrap();
    }
    println!("Wrote {} scans to {}", scans.len(), output.display());

    if let (Some(dir), Some(scan)) = (plot, scans.first()) {
        let points = scan_to_points(scan);
        let (x, y) = split_xy(&points);
        let config = RansacConfig {
            residual_threshold: 0.1,
            ..Default::default()
        };
        let mut ransac = RansacRegressor::new(config).unwrap();
        let fit = ransac.fit(&x, &y).unwrap();
        println!(
            "{} inliers, {} outliers, y = {:.3} x + {:.3}",
            fit.n_inliers(),
            fit.n_outliers(),
            fit.model.slope,
            fit.model.intercept
        );

        let mut view = SnapshotView::new(dir, true, (800, 800)).unwrap();
        view.show(&ScanPlot::new(&points, &fit, 0)).unwrap();
        println!("Rendered {}", view.path_for(0).display());
    }
}
