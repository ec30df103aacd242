//! Summaries over scan results and validation of removal selections.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use shared::library::{DuplicateGroup, DuplicateReport};
use uuid::Uuid;

use crate::error::{DedupError, Result};

pub fn build_report(
    scan_id: Uuid,
    provider: &str,
    collection_id: &str,
    total_tracks: usize,
    groups: Vec<DuplicateGroup>,
    started_at: DateTime<Utc>,
) -> DuplicateReport {
    let total_duplicate_tracks = groups.iter().map(|g| g.duplicates.len()).sum();
    let same_id_groups = groups.iter().filter(|g| g.is_same_id).count();

    DuplicateReport {
        scan_id,
        provider: provider.to_string(),
        collection_id: collection_id.to_string(),
        groups,
        total_tracks,
        total_duplicate_tracks,
        same_id_groups,
        started_at,
        finished_at: Utc::now(),
    }
}

/// Every duplicate id, once each, in group order.
pub fn all_duplicate_ids(groups: &[DuplicateGroup]) -> Vec<String> {
    groups
        .iter()
        .flat_map(|g| g.duplicate_ids())
        .unique()
        .map(str::to_string)
        .collect()
}

/// Check a user's selection against the reported duplicates.
///
/// Each selected id must belong to a reported duplicate. Repeated ids are
/// collapsed, keeping the first occurrence.
pub fn removal_plan(groups: &[DuplicateGroup], selected: &[String]) -> Result<Vec<String>> {
    let known: HashSet<&str> = groups.iter().flat_map(|g| g.duplicate_ids()).collect();

    if let Some(unknown) = selected.iter().find(|id| !known.contains(id.as_str())) {
        return Err(DedupError::UnknownDuplicate(unknown.clone()));
    }

    Ok(selected.iter().unique().cloned().collect())
}
