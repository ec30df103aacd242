//! Single forward pass over a track list that groups duplicates under the
//! first track accepted for them.
//!
//! The scan is exposed as an iterator of [`ScanSnapshot`]s. Intermediate
//! snapshots only carry progress; the last one carries the groups.

use std::collections::HashMap;
use std::iter::FusedIterator;

use shared::library::{DuplicateEntry, DuplicateGroup, DuplicateReason, ScanSnapshot, TrackRecord};
use tracing::debug;

use crate::classify::classify;
use crate::config::ScanConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
}

/// Start a scan over `tracks`. Nothing is processed until the first snapshot
/// is requested.
pub fn scan(tracks: Vec<TrackRecord>, config: &ScanConfig) -> DuplicateScanner {
    DuplicateScanner::new(tracks, config.clone())
}

/// Run a scan to completion and return its groups.
pub fn find_duplicates(tracks: Vec<TrackRecord>, config: &ScanConfig) -> Vec<DuplicateGroup> {
    scan(tracks, config)
        .last()
        .and_then(|snapshot| snapshot.duplicate_groups)
        .unwrap_or_default()
}

pub struct DuplicateScanner {
    config: ScanConfig,
    tracks: std::vec::IntoIter<TrackRecord>,
    total: usize,
    processed: usize,
    last_progress: u8,
    state: ScanState,
    /// id -> index into `originals`
    seen: HashMap<String, usize>,
    originals: Vec<TrackRecord>,
    groups: Vec<DuplicateGroup>,
    /// (artist, title) -> index into `groups`
    group_index: HashMap<(String, String), usize>,
}

impl DuplicateScanner {
    fn new(tracks: Vec<TrackRecord>, config: ScanConfig) -> Self {
        let total = tracks.len();
        Self {
            config,
            tracks: tracks.into_iter(),
            total,
            processed: 0,
            last_progress: 0,
            state: ScanState::Idle,
            seen: HashMap::new(),
            originals: Vec::new(),
            groups: Vec::new(),
            group_index: HashMap::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    fn step(&mut self, candidate: TrackRecord) {
        let matched = classify(
            &candidate,
            &self.seen,
            &self.originals,
            self.config.similarity(),
            self.config.similarity_threshold(),
        )
        .map(|c| {
            let key = (c.original.artist.clone(), c.original.title.clone());
            (key, c.original.clone(), c.reason)
        });

        match matched {
            Some((key, original, reason)) => {
                let index = *self.group_index.entry(key).or_insert_with(|| {
                    self.groups.push(DuplicateGroup {
                        original,
                        duplicates: Vec::new(),
                        is_same_id: false,
                    });
                    self.groups.len() - 1
                });
                let group = &mut self.groups[index];
                group.is_same_id |= reason == DuplicateReason::SameId;
                group.duplicates.push(DuplicateEntry {
                    track: candidate,
                    reason,
                });
            }
            None => {
                self.seen.insert(candidate.id.clone(), self.originals.len());
                self.originals.push(candidate);
            }
        }

        self.processed += 1;
    }

    fn progress(&self) -> u8 {
        // round(processed / total * 100) with halves rounding up
        ((self.processed * 200 + self.total) / (self.total * 2)) as u8
    }

    fn finish(&mut self) -> ScanSnapshot {
        self.state = ScanState::Completed;
        self.last_progress = 100;
        let groups = std::mem::take(&mut self.groups);
        debug!(
            "Duplicate scan finished: {} tracks, {} originals, {} groups",
            self.total,
            self.originals.len(),
            groups.len()
        );
        ScanSnapshot {
            progress_percent: 100,
            duplicate_group_count: groups.len(),
            duplicate_groups: Some(groups),
        }
    }
}

impl Iterator for DuplicateScanner {
    type Item = ScanSnapshot;

    fn next(&mut self) -> Option<ScanSnapshot> {
        match self.state {
            ScanState::Completed => return None,
            ScanState::Idle if self.total == 0 => {
                self.state = ScanState::Completed;
                return None;
            }
            _ => self.state = ScanState::Scanning,
        }

        while let Some(candidate) = self.tracks.next() {
            self.step(candidate);

            if self.processed == self.total {
                break;
            }

            // 100 is reserved for the terminal snapshot
            let progress = self.progress();
            if progress != self.last_progress && progress < 100 {
                self.last_progress = progress;
                return Some(ScanSnapshot {
                    progress_percent: progress,
                    duplicate_group_count: self.groups.len(),
                    duplicate_groups: None,
                });
            }
        }

        Some(self.finish())
    }
}

impl FusedIterator for DuplicateScanner {}
