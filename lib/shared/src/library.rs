use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A track from a provider listing (playlist, library, saved tracks).
///
/// Only `id`, `title` and `artist` are interpreted. Everything else the
/// provider sent is kept in `extra` and handed back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Why a track was considered a duplicate of an original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuplicateReason {
    /// Same provider id as an earlier track
    SameId,
    /// Different id, but title and artist are close enough
    SameNameArtist,
}

/// A track annotated with the reason it matched its original
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    #[serde(flatten)]
    pub track: TrackRecord,
    pub reason: DuplicateReason,
}

/// An original track and every later track that matched it, in scan order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub original: TrackRecord,
    pub duplicates: Vec<DuplicateEntry>,
    /// True as soon as one duplicate matched by id
    pub is_same_id: bool,
}

impl DuplicateGroup {
    /// The (artist, title) pair this group is keyed by.
    pub fn key(&self) -> (&str, &str) {
        (&self.original.artist, &self.original.title)
    }

    pub fn duplicate_ids(&self) -> impl Iterator<Item = &str> {
        self.duplicates.iter().map(|d| d.track.id.as_str())
    }
}

/// Progress report emitted while a scan runs.
///
/// `duplicate_groups` is only set on the terminal snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub progress_percent: u8,
    pub duplicate_group_count: usize,
    pub duplicate_groups: Option<Vec<DuplicateGroup>>,
}

impl ScanSnapshot {
    pub fn is_final(&self) -> bool {
        self.duplicate_groups.is_some()
    }
}

/// Result of a duplicate scan over one provider collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub scan_id: Uuid,
    pub provider: String,
    pub collection_id: String,
    pub groups: Vec<DuplicateGroup>,
    pub total_tracks: usize,
    pub total_duplicate_tracks: usize,
    pub same_id_groups: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
