//! Runs a duplicate scan on a background task and relays its snapshots.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use futures::stream::{self, Stream};
use shared::library::{DuplicateGroup, ScanSnapshot, TrackRecord};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::engine::{self, DuplicateScanner};
use crate::error::{DedupError, Result};

/// Handle to a scan running in the background.
///
/// Dropping the handle cancels the scan.
pub struct ScanHandle {
    id: Uuid,
    progress: broadcast::Receiver<ScanSnapshot>,
    /// Receiver subscribed before the task started, handed out once.
    initial: Option<broadcast::Receiver<ScanSnapshot>>,
    task: JoinHandle<Result<Vec<DuplicateGroup>>>,
    cancellation_token: CancellationToken,
    guard: DropGuard,
    finished_at: Arc<OnceLock<Instant>>,
}

/// Start scanning `tracks` on a blocking task.
///
/// Must be called from within a tokio runtime.
pub fn start_scan(tracks: Vec<TrackRecord>, config: &ScanConfig) -> ScanHandle {
    let id = Uuid::new_v4();
    let (tx, rx) = broadcast::channel(config.progress_capacity());
    let cancellation_token = CancellationToken::new();
    let token = cancellation_token.clone();
    let scanner = engine::scan(tracks, config);

    info!("Starting duplicate scan {} over {} tracks", id, scanner.total());

    let finished_at = Arc::new(OnceLock::new());
    let finished = finished_at.clone();

    let task = tokio::task::spawn_blocking(move || {
        let result = run_scan(id, scanner, &token, &tx);
        let _ = finished.set(Instant::now());
        result
    });

    ScanHandle {
        id,
        initial: Some(rx.resubscribe()),
        progress: rx,
        task,
        guard: cancellation_token.clone().drop_guard(),
        cancellation_token,
        finished_at,
    }
}

fn run_scan(
    id: Uuid,
    scanner: DuplicateScanner,
    token: &CancellationToken,
    tx: &broadcast::Sender<ScanSnapshot>,
) -> Result<Vec<DuplicateGroup>> {
    let mut groups = Vec::new();

    for snapshot in scanner {
        if token.is_cancelled() {
            info!("Duplicate scan {} cancelled", id);
            return Err(DedupError::Cancelled);
        }

        if let Some(found) = &snapshot.duplicate_groups {
            groups = found.clone();
        }

        // No receivers is fine, the result is still delivered
        if tx.send(snapshot).is_err() {
            debug!("No progress receivers for scan {}", id);
        }
    }

    info!("Duplicate scan {} finished with {} groups", id, groups.len());
    Ok(groups)
}

impl ScanHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A receiver for snapshots sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanSnapshot> {
        self.progress.resubscribe()
    }

    /// Snapshots as a stream that ends when the scan does.
    ///
    /// The first call sees every snapshot. Later calls only see snapshots
    /// sent after they were made.
    pub fn progress(&mut self) -> impl Stream<Item = ScanSnapshot> + Send + 'static {
        let rx = self.initial.take().unwrap_or_else(|| self.subscribe());
        snapshot_stream(rx)
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// When the worker stopped, whether it completed or was cancelled.
    /// Stays `None` if the worker panicked.
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at.get().copied()
    }

    /// Wait for the final groups.
    ///
    /// Fails with [`DedupError::Cancelled`] if the scan was cancelled and with
    /// [`DedupError::Worker`] if the background task died.
    pub async fn result(self) -> Result<Vec<DuplicateGroup>> {
        let ScanHandle { id, task, guard, .. } = self;

        let outcome = task.await;
        let _ = guard.disarm();

        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!("Duplicate scan {} worker failed: {}", id, e);
                Err(e.into())
            }
        }
    }
}

/// Turn a broadcast receiver into a stream, skipping over lag.
pub fn snapshot_stream(
    rx: broadcast::Receiver<ScanSnapshot>,
) -> impl Stream<Item = ScanSnapshot> + Send + 'static {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => return Some((snapshot, rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // lagged is recoverable, the final snapshot is always the newest
                    warn!("Scan progress lagged, skipped {} snapshots", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}
