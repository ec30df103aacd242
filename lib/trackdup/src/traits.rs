use async_trait::async_trait;
use shared::library::TrackRecord;

use crate::error::Result;

/// A music service that lists track collections and can remove items from them.
#[async_trait]
pub trait TrackProvider: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Tracks of a collection (playlist, saved tracks...) in listing order.
    async fn fetch_tracks(&self, collection_id: &str) -> Result<Vec<TrackRecord>>;

    /// Remove the given track ids from a collection, returning how many were removed.
    async fn remove_tracks(&self, collection_id: &str, track_ids: &[String]) -> Result<usize>;
}
