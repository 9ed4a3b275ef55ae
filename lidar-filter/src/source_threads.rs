use crate::constants::{SCAN_QUEUE_DEPTH, TERMINATOR_QUEUE_DEPTH};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use lidar_data::LaserScan;
use log::{error, warn};
use std::thread::JoinHandle;
use std::time::Duration;

/// Struct that contains the scan source thread.
pub struct SourceThreads {
    pub(crate) terminator_tx: Sender<bool>,
    pub(crate) source_thread: Option<JoinHandle<()>>,
}

/// Sending side of the scan queue. It also holds a handle on the receiving
/// side so a full queue can make room by discarding its oldest scan, the way
/// a keep-last subscription history does.
pub(crate) struct ScanQueue {
    scan_tx: Sender<LaserScan>,
    stale_rx: Receiver<LaserScan>,
}

impl ScanQueue {
    pub(crate) fn bounded(capacity: usize) -> (ScanQueue, Receiver<LaserScan>) {
        let (scan_tx, scan_rx) = bounded(capacity);
        let queue = ScanQueue {
            scan_tx,
            stale_rx: scan_rx.clone(),
        };
        (queue, scan_rx)
    }

    /// Hands `scan` to the processing loop without waiting. A full queue
    /// drops its oldest scan.
    pub(crate) fn forward(&self, mut scan: LaserScan) {
        loop {
            match self.scan_tx.try_send(scan) {
                Ok(()) => return,
                Err(TrySendError::Full(s)) => {
                    scan = s;
                    if self.stale_rx.try_recv().is_ok() {
                        warn!("Scan queue is full, dropping the oldest scan");
                    }
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Hands `scan` to the processing loop, waiting for room in the queue.
    ///
    /// Returns `false` when termination was requested before the scan could
    /// be queued.
    pub(crate) fn send_or_wait(
        &self,
        terminator_rx: &Receiver<bool>,
        mut scan: LaserScan,
    ) -> bool {
        loop {
            match self.scan_tx.try_send(scan) {
                Ok(()) => return true,
                Err(TrySendError::Disconnected(_)) => return false,
                Err(TrySendError::Full(s)) => {
                    scan = s;
                    if wait_for_terminate(terminator_rx, Duration::from_millis(10)) {
                        return false;
                    }
                }
            }
        }
    }
}

/// Runs `source` on its own thread. It receives the termination signal and
/// the sending half of the scan queue.
pub(crate) fn spawn_source<F>(source: F) -> (SourceThreads, Receiver<LaserScan>)
where
    F: FnOnce(Receiver<bool>, ScanQueue) + Send + 'static,
{
    let (terminator_tx, terminator_rx) = bounded(TERMINATOR_QUEUE_DEPTH);
    let (queue, scan_rx) = ScanQueue::bounded(SCAN_QUEUE_DEPTH);

    let source_thread = Some(std::thread::spawn(move || {
        source(terminator_rx, queue);
    }));

    let threads = SourceThreads {
        terminator_tx,
        source_thread,
    };
    (threads, scan_rx)
}

pub(crate) fn do_terminate(terminator_rx: &Receiver<bool>) -> bool {
    terminator_rx.try_recv().unwrap_or(false)
}

/// Sleeps up to `timeout`, waking early when termination is requested.
pub(crate) fn wait_for_terminate(terminator_rx: &Receiver<bool>, timeout: Duration) -> bool {
    match terminator_rx.recv_timeout(timeout) {
        Ok(terminate) => terminate,
        Err(RecvTimeoutError::Timeout) => false,
        Err(RecvTimeoutError::Disconnected) => true,
    }
}

/// Function to join the source thread.
/// This function is automatically called when `source_threads` is dropped.
pub fn join(source_threads: &mut SourceThreads) {
    // The thread may already have returned and dropped its receiver.
    let _ = source_threads.terminator_tx.send(true);

    if let Some(thread) = source_threads.source_thread.take() {
        if thread.join().is_err() {
            error!("Scan source thread panicked");
        }
    }
}

impl Drop for SourceThreads {
    fn drop(&mut self) {
        join(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(range: f32) -> LaserScan {
        LaserScan {
            ranges: vec![range],
            ..Default::default()
        }
    }

    fn drain(scan_rx: &Receiver<LaserScan>) -> Vec<f32> {
        scan_rx.try_iter().map(|s| s.ranges[0]).collect()
    }

    #[test]
    fn test_forward_keeps_latest_scans() {
        let (queue, scan_rx) = ScanQueue::bounded(2);
        for range in [1., 2., 3., 4.] {
            queue.forward(scan(range));
        }
        assert_eq!(drain(&scan_rx), vec![3., 4.]);

        queue.forward(scan(5.));
        assert_eq!(drain(&scan_rx), vec![5.]);
    }

    #[test]
    fn test_send_or_wait_stops_on_terminate() {
        let (queue, scan_rx) = ScanQueue::bounded(1);
        let (terminator_tx, terminator_rx) = bounded(1);
        assert!(queue.send_or_wait(&terminator_rx, scan(1.)));
        terminator_tx.send(true).unwrap();
        assert!(!queue.send_or_wait(&terminator_rx, scan(2.)));
        assert_eq!(drain(&scan_rx), vec![1.]);
    }

    #[test]
    fn test_spawn_and_join() {
        let (mut threads, scan_rx) = spawn_source(|terminator_rx, queue| {
            let mut i = 0;
            while !do_terminate(&terminator_rx) {
                if !queue.send_or_wait(&terminator_rx, scan(i as f32)) {
                    break;
                }
                i += 1;
            }
        });
        assert_eq!(scan_rx.recv().unwrap().ranges, vec![0.]);
        assert_eq!(scan_rx.recv().unwrap().ranges, vec![1.]);
        join(&mut threads);
        assert!(threads.source_thread.is_none());
    }

    #[test]
    fn test_drop_joins_finished_thread() {
        let (threads, scan_rx) = spawn_source(|_, queue| {
            queue.forward(scan(5.));
        });
        assert_eq!(scan_rx.recv().unwrap().ranges, vec![5.]);
        drop(threads);
        assert!(scan_rx.recv().is_err());
    }
}
