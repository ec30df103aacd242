//! Pairwise string similarity used to compare titles and artists.

use std::collections::HashMap;

/// Scores how alike two short strings are, from 0.0 (nothing shared) to 1.0.
///
/// Implementations must be symmetric and must not panic on empty input.
pub trait Similarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn score(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Dice coefficient over adjacent character pairs.
///
/// Whitespace is dropped before pairing. Case and diacritics are kept as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigramDice;

impl Similarity for BigramDice {
    fn score(&self, a: &str, b: &str) -> f64 {
        similarity(a, b)
    }
}

/// Bigram Dice similarity: `2 * shared / (pairs_a + pairs_b)`.
///
/// Pairs are taken over `char`s, not bytes, so accented letters count once.
/// Two strings that are equal once whitespace is removed score 1.0, which
/// includes two empty strings. Otherwise anything shorter than two characters
/// has no pairs and scores 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut pairs: HashMap<(char, char), usize> = HashMap::new();
    for w in a.windows(2) {
        *pairs.entry((w[0], w[1])).or_default() += 1;
    }

    let mut shared = 0usize;
    for w in b.windows(2) {
        if let Some(count) = pairs.get_mut(&(w[0], w[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    let total = (a.len() - 1) + (b.len() - 1);
    (2 * shared) as f64 / total as f64
}
