//! `/scan` subscription through the ROS 2 middleware.

use crate::constants::SPIN_TIMEOUT_MS;
use crate::error::{LidarFilterError, Result};
use crate::source_threads::{do_terminate, spawn_source, ScanQueue, SourceThreads};
use crossbeam_channel::Receiver;
use futures::executor::LocalPool;
use futures::future;
use futures::stream::StreamExt;
use futures::task::LocalSpawnExt;
use lidar_data::LaserScan;
use log::{error, info};
use r2r::sensor_msgs::msg::LaserScan as RosLaserScan;
use r2r::QosProfile;
use std::sync::mpsc;
use std::time::Duration;

type StartupResult = std::result::Result<(), String>;

fn from_ros(msg: RosLaserScan) -> LaserScan {
    LaserScan {
        frame_id: msg.header.frame_id,
        angle_min: msg.angle_min,
        angle_max: msg.angle_max,
        angle_increment: msg.angle_increment,
        time_increment: msg.time_increment,
        scan_time: msg.scan_time,
        range_min: msg.range_min,
        range_max: msg.range_max,
        ranges: msg.ranges,
        intensities: msg.intensities,
    }
}

/// Function to start the ROS 2 node and subscribe to `topic` with the
/// sensor data QoS profile.
/// # Arguments
///
/// * `node_name` - Name of the ROS 2 node, such as `lidar_filters`.
/// * `topic` - Laser scan topic, such as `/scan`.
pub fn run_ros_source(
    node_name: &str,
    topic: &str,
) -> Result<(SourceThreads, Receiver<LaserScan>)> {
    let node_name = node_name.to_string();
    let topic = topic.to_string();
    let (startup_tx, startup_rx) = mpsc::sync_channel::<StartupResult>(1);

    let (threads, scan_rx) = spawn_source(move |terminator_rx, queue| {
        let spun = spin_node(&node_name, &topic, &terminator_rx, queue, &startup_tx);
        if let Err(e) = spun {
            // Only the first message reaches the caller.
            let _ = startup_tx.try_send(Err(e.to_string()));
            error!("Node {node_name} stopped: {e}");
        }
    });

    match startup_rx.recv() {
        Ok(Ok(())) => Ok((threads, scan_rx)),
        Ok(Err(msg)) => Err(LidarFilterError::SourceStartup(msg)),
        Err(_) => Err(LidarFilterError::SourceStartup(
            "spin thread exited before the node was ready".to_string(),
        )),
    }
}

fn spin_node(
    node_name: &str,
    topic: &str,
    terminator_rx: &Receiver<bool>,
    queue: ScanQueue,
    startup_tx: &mpsc::SyncSender<StartupResult>,
) -> Result<()> {
    let ctx = r2r::Context::create()?;
    let mut node = r2r::Node::create(ctx, node_name, "")?;
    let subscriber = node.subscribe::<RosLaserScan>(topic, QosProfile::sensor_data())?;

    let mut pool = LocalPool::new();
    pool.spawner()
        .spawn_local(async move {
            subscriber
                .for_each(|msg| {
                    queue.forward(from_ros(msg));
                    future::ready(())
                })
                .await
        })
        .map_err(|e| LidarFilterError::SourceStartup(e.to_string()))?;

    let _ = startup_tx.try_send(Ok(()));
    info!("Node {node_name} subscribed to {topic}");

    while !do_terminate(terminator_rx) {
        node.spin_once(Duration::from_millis(SPIN_TIMEOUT_MS));
        pool.run_until_stalled();
    }

    info!("Tearing down node {node_name}");
    // Dropping the node and its context shuts the middleware down.
    Ok(())
}
