use std::io;

pub type Result<T> = std::result::Result<T, LidarFilterError>;

#[derive(Debug, thiserror::Error)]
pub enum LidarFilterError {
    #[error("Cannot fit a line to an empty point set.")]
    EmptyPointSet,
    #[error("At least {required} points are required to fit a line but {found} were given.")]
    TooFewPoints { required: usize, found: usize },
    #[error("Independent and dependent arrays differ in length: {0} != {1}.")]
    LengthMismatch(usize, usize),
    #[error("No consensus set was found after {0} trials.")]
    NoConsensus(usize),
    #[error("Regressor has not been fitted yet.")]
    NotFitted,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Plotting failed: {0}")]
    Plot(String),
    #[error("Malformed scan record at line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize a scan: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Scan source failed to start: {0}")]
    SourceStartup(String),
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Failed to install the interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[cfg(feature = "ros2")]
    #[error("ROS 2 error: {0}")]
    Ros(#[from] r2r::Error),
    #[error(transparent)]
    IoError(#[from] io::Error),
}
