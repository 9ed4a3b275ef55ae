//! Recorded scans stored as newline-delimited JSON, one `LaserScan` per line.

use crate::error::{LidarFilterError, Result};
use crate::source_threads::{do_terminate, spawn_source, wait_for_terminate, SourceThreads};
use lidar_data::LaserScan;
use log::{error, info};
use std::fs::File;
use crossbeam_channel::Receiver;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::Duration;

/// Parses one record. Blank lines yield `None`.
pub fn parse_scan_line(line: &str, line_number: usize) -> Result<Option<LaserScan>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| LidarFilterError::Replay {
            line: line_number,
            source,
        })
}

pub fn write_scan<W: Write>(writer: &mut W, scan: &LaserScan) -> Result<()> {
    serde_json::to_writer(&mut *writer, scan)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Function to replay a recorded scan file.
/// # Arguments
///
/// * `path` - JSON lines file with one scan per line.
/// * `rate_hz` - Scans per second. `None` replays as fast as they are consumed.
pub fn run_replay_source(
    path: &Path,
    rate_hz: Option<f64>,
) -> Result<(SourceThreads, Receiver<LaserScan>)> {
    let period = match rate_hz {
        Some(rate) if rate > 0. && rate.is_finite() => Some(Duration::from_secs_f64(1. / rate)),
        Some(rate) => {
            return Err(LidarFilterError::InvalidConfig(format!(
                "replay rate must be positive, got {rate}"
            )))
        }
        None => None,
    };
    let reader = BufReader::new(File::open(path)?);
    let name = path.display().to_string();
    info!("Replaying scans from {name}");

    Ok(spawn_source(move |terminator_rx, queue| {
        let mut n_sent = 0;
        for (i, line) in reader.lines().enumerate() {
            if do_terminate(&terminator_rx) {
                break;
            }
            let scan = match line
                .map_err(LidarFilterError::from)
                .and_then(|line| parse_scan_line(&line, i + 1))
            {
                Ok(Some(scan)) => scan,
                Ok(None) => continue,
                Err(e) => {
                    error!("Stopping replay of {name}: {e}");
                    break;
                }
            };
            if !queue.send_or_wait(&terminator_rx, scan) {
                break;
            }
            n_sent += 1;
            if let Some(period) = period {
                if wait_for_terminate(&terminator_rx, period) {
                    break;
                }
            }
        }
        info!("Replay of {name} finished after {n_sent} scans");
    }))
}
