use clap::Parser;
use crossbeam_channel::Receiver;
use lidar_filter::{
    run_replay_source, ErrorPolicy, FilterConfig, LaserScan, Result, ScanFilterNode,
    SourceThreads, ViewMode,
};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Separates walls from obstacles in 2D LiDAR scans.
#[derive(Parser, Debug)]
#[command(name = "lidar_filters", version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay scans from a JSON lines file instead of subscribing to ROS 2
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Replay rate in scans per second
    #[arg(long, requires = "replay")]
    rate: Option<f64>,

    /// Laser scan topic
    #[arg(long)]
    topic: Option<String>,

    /// Largest residual of an inlier
    #[arg(long)]
    threshold: Option<f64>,

    /// Seed of the RANSAC sampling
    #[arg(long)]
    seed: Option<u64>,

    /// How processed scans are shown
    #[arg(long, value_enum)]
    view: Option<ViewMode>,

    /// Directory for snapshot images
    #[arg(long)]
    output: Option<PathBuf>,

    /// What to do with a scan that cannot be fitted
    #[arg(long, value_enum)]
    on_error: Option<ErrorPolicy>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> Result<FilterConfig> {
    let mut config = match &args.config {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };
    if let Some(topic) = &args.topic {
        config.node.topic = topic.clone();
    }
    if let Some(policy) = args.on_error {
        config.node.error_policy = policy;
    }
    if let Some(threshold) = args.threshold {
        config.fit.residual_threshold = threshold;
    }
    if let Some(seed) = args.seed {
        config.fit.seed = seed;
    }
    if let Some(mode) = args.view {
        config.view.mode = mode;
    }
    if let Some(output) = &args.output {
        config.view.output_dir = output.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.fit.validate()?;
    Ok(config)
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn setup_ctrl_c_handler() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}

fn start_source(
    args: &Args,
    config: &FilterConfig,
) -> Result<(SourceThreads, Receiver<LaserScan>)> {
    if let Some(path) = &args.replay {
        return run_replay_source(path, args.rate);
    }
    #[cfg(feature = "ros2")]
    {
        lidar_filter::run_ros_source(&config.node.name, &config.node.topic)
    }
    #[cfg(not(feature = "ros2"))]
    {
        let _ = config;
        Err(lidar_filter::LidarFilterError::InvalidConfig(
            "built without the `ros2` feature, pass --replay FILE".to_string(),
        ))
    }
}

/// Runs the node until the source ends or Ctrl-C is pressed. A scan that
/// fails under the shutdown policy is logged and tears the node down cleanly;
/// only startup failures are returned.
fn run(args: &Args, config: FilterConfig) -> Result<()> {
    let mut node = ScanFilterNode::from_config(&config)?;
    let running = setup_ctrl_c_handler()?;
    let (source_threads, scan_rx) = start_source(args, &config)?;
    info!(
        "{} started, residual threshold {}",
        config.node.name, config.fit.residual_threshold
    );

    if let Err(e) = node.spin(&scan_rx, &running, config.node.error_policy) {
        error!("Failed to process scan: {e}");
    }

    drop(scan_rx);
    drop(source_threads);
    info!(
        "{} shut down: {} scans processed, {} failed",
        config.node.name,
        node.processed(),
        node.failed()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = load_config(&args);
    let level = match &config {
        Ok(config) => config.logging.level.clone(),
        Err(_) => args.log_level.clone().unwrap_or_else(|| "info".to_string()),
    };
    init_logging(&level);

    match config.and_then(|config| run(&args, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
