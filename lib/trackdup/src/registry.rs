//! Keeps at most one running scan per owner (usually a user or a
//! user/playlist pair) so a front end can reconnect to its progress.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use shared::library::{DuplicateGroup, ScanSnapshot, TrackRecord};
use tokio::sync::{broadcast, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::error::Result;
use crate::worker::{start_scan, ScanHandle};

/// Finished scans nobody collected are dropped this long after they finished
/// (10 minutes).
const SCAN_STALE_THRESHOLD_SECS: u64 = 600;

struct ActiveScan {
    handle: ScanHandle,
    started_at: Instant,
}

impl ActiveScan {
    fn is_stale(&self, threshold: Duration) -> bool {
        match self.handle.finished_at() {
            Some(finished_at) => finished_at.elapsed() > threshold,
            // a panicked worker never records when it stopped
            None => self.handle.is_finished() && self.started_at.elapsed() > threshold,
        }
    }
}

pub struct ScanRegistry {
    config: ScanConfig,
    scans: RwLock<HashMap<String, ActiveScan>>,
    stale_after: Duration,
}

impl ScanRegistry {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            scans: RwLock::new(HashMap::new()),
            stale_after: Duration::from_secs(SCAN_STALE_THRESHOLD_SECS),
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Start a scan for `owner`, cancelling any scan it already had running.
    pub async fn start(&self, owner: &str, tracks: Vec<TrackRecord>) -> Uuid {
        let handle = start_scan(tracks, &self.config);
        let id = handle.id();

        let previous = self.scans.write().await.insert(
            owner.to_string(),
            ActiveScan {
                handle,
                started_at: Instant::now(),
            },
        );

        if let Some(previous) = previous {
            info!(
                "Replacing scan {} for {} with scan {}",
                previous.handle.id(),
                owner,
                id
            );
            previous.handle.cancel();
        }

        id
    }

    /// Subscribe to progress of the owner's current scan.
    pub async fn subscribe(&self, owner: &str) -> Option<broadcast::Receiver<ScanSnapshot>> {
        self.scans
            .read()
            .await
            .get(owner)
            .map(|scan| scan.handle.subscribe())
    }

    /// Id of the owner's current scan, if any.
    pub async fn scan_id(&self, owner: &str) -> Option<Uuid> {
        self.scans.read().await.get(owner).map(|scan| scan.handle.id())
    }

    /// Cancel and forget the owner's scan. Returns false if there was none.
    pub async fn cancel(&self, owner: &str) -> bool {
        match self.scans.write().await.remove(owner) {
            Some(scan) => {
                info!("Cancelling scan {} for {}", scan.handle.id(), owner);
                scan.handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove the owner's scan and wait for its groups.
    pub async fn finish(&self, owner: &str) -> Result<Option<Vec<DuplicateGroup>>> {
        let scan = self.scans.write().await.remove(owner);
        match scan {
            Some(scan) => scan.handle.result().await.map(Some),
            None => Ok(None),
        }
    }

    /// Drop finished scans that have been sitting around too long.
    pub async fn cleanup_stale(&self) -> usize {
        let mut map = self.scans.write().await;
        let stale: Vec<String> = map
            .iter()
            .filter(|(_, scan)| scan.is_stale(self.stale_after))
            .map(|(owner, _)| owner.clone())
            .collect();

        for owner in &stale {
            info!("Cleaning up stale scan for {}", owner);
            map.remove(owner);
        }
        stale.len()
    }

    pub async fn active_count(&self) -> usize {
        self.scans.read().await.len()
    }
}
