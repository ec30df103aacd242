use std::collections::HashMap;

use shared::library::{DuplicateReason, TrackRecord};

use crate::similarity::Similarity;

/// The original a candidate matched, and how.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification<'a> {
    pub original: &'a TrackRecord,
    pub reason: DuplicateReason,
}

/// Decide whether `candidate` duplicates one of the accepted `originals`.
///
/// `seen` maps every accepted id to its index in `originals`. Ids are checked
/// first; otherwise originals are tried in acceptance order and the first one
/// whose title and artist both score strictly above `threshold` wins.
pub fn classify<'a>(
    candidate: &TrackRecord,
    seen: &HashMap<String, usize>,
    originals: &'a [TrackRecord],
    similarity: &dyn Similarity,
    threshold: f64,
) -> Option<Classification<'a>> {
    if let Some(original) = seen.get(&candidate.id).and_then(|&i| originals.get(i)) {
        return Some(Classification {
            original,
            reason: DuplicateReason::SameId,
        });
    }

    originals
        .iter()
        .find(|prev| {
            similarity.score(&candidate.title, &prev.title) > threshold
                && similarity.score(&candidate.artist, &prev.artist) > threshold
        })
        .map(|original| Classification {
            original,
            reason: DuplicateReason::SameNameArtist,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::BigramDice;

    fn accepted(tracks: &[TrackRecord]) -> HashMap<String, usize> {
        tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect()
    }

    #[test]
    fn same_id_wins_over_names() {
        let originals = vec![
            TrackRecord::new("1", "Imagine", "John Lennon"),
            TrackRecord::new("2", "Something Else", "Nobody"),
        ];
        let seen = accepted(&originals);
        let candidate = TrackRecord::new("2", "Imagine", "John Lennon");

        let found = classify(&candidate, &seen, &originals, &BigramDice, 0.8).unwrap();
        assert_eq!(found.original.id, "2");
        assert_eq!(found.reason, DuplicateReason::SameId);
    }

    #[test]
    fn fuzzy_match_on_title_and_artist() {
        let originals = vec![TrackRecord::new("1", "Imagine", "John Lennon")];
        let seen = accepted(&originals);
        let candidate = TrackRecord::new("2", "imagine ", "John  Lennon");

        let found = classify(&candidate, &seen, &originals, &BigramDice, 0.8).unwrap();
        assert_eq!(found.original.id, "1");
        assert_eq!(found.reason, DuplicateReason::SameNameArtist);
    }

    #[test]
    fn title_alone_is_not_enough() {
        let originals = vec![TrackRecord::new("1", "Imagine", "John Lennon")];
        let seen = accepted(&originals);
        let candidate = TrackRecord::new("2", "Imagine", "A Perfect Circle");

        assert!(classify(&candidate, &seen, &originals, &BigramDice, 0.8).is_none());
    }

    #[test]
    fn first_accepted_original_wins() {
        let originals = vec![
            TrackRecord::new("1", "Song", "Band"),
            TrackRecord::new("2", "Song", "Band"),
        ];
        let seen = accepted(&originals);
        let candidate = TrackRecord::new("3", "Song", "Band");

        let found = classify(&candidate, &seen, &originals, &BigramDice, 0.8).unwrap();
        assert_eq!(found.original.id, "1");
    }

    #[test]
    fn threshold_is_exclusive() {
        let originals = vec![TrackRecord::new("1", "abcdef", "Artist")];
        let seen = accepted(&originals);
        let at_boundary = TrackRecord::new("2", "abcdeX", "Artist");

        assert!(classify(&at_boundary, &seen, &originals, &BigramDice, 0.8).is_none());
        assert!(classify(&at_boundary, &seen, &originals, &BigramDice, 0.79).is_some());
    }

    #[test]
    fn nothing_accepted_yet() {
        let candidate = TrackRecord::new("1", "Imagine", "John Lennon");
        assert!(classify(&candidate, &HashMap::new(), &[], &BigramDice, 0.8).is_none());
    }
}
