//! The master word list and per-turn sampling.

use rand::seq::IndexedRandom;

/// How many candidate words each turn draws from the master list.
pub(crate) const WORDS_PER_TURN: usize = 10;

/// Drawable nouns for the built-in game. Kept short and concrete — the
/// artist has to paint these on a ten-by-ten grid.
const DEFAULT_WORDS: &[&str] = &[
    "anchor", "apple", "arrow", "banana", "bell", "boat", "bone",
    "book", "bridge", "butterfly", "cactus", "candle", "castle", "cat",
    "cloud", "crown", "dog", "door", "eye", "fish", "flag", "flower",
    "ghost", "guitar", "hammer", "hat", "heart", "house", "igloo",
    "kite", "ladder", "leaf", "lightning", "moon", "mountain",
    "mushroom", "pencil", "rainbow", "rocket", "shark", "skull",
    "snail", "snake", "snowman", "spider", "star", "sun", "sword",
    "tree", "umbrella",
];

/// A pool of candidate secret words.
///
/// Every peer ships the same pool; only the sampled *subset* is
/// transmitted (inside `TurnStart`), so guessers never need the master
/// list to agree on the turn's candidates.
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    /// A bank over a custom word pool.
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    /// Samples `count` distinct words uniformly, without replacement.
    ///
    /// If the pool is smaller than `count` the whole pool is returned —
    /// a degenerate bank still produces a playable turn.
    pub fn sample(&self, count: usize) -> Vec<String> {
        self.words
            .choose_multiple(&mut rand::rng(), count)
            .cloned()
            .collect()
    }

    /// Number of words in the pool.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for WordBank {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_returns_requested_count_of_distinct_words() {
        let bank = WordBank::default();

        let drawn = bank.sample(WORDS_PER_TURN);

        assert_eq!(drawn.len(), WORDS_PER_TURN);
        let unique: HashSet<&String> = drawn.iter().collect();
        assert_eq!(unique.len(), WORDS_PER_TURN);
    }

    #[test]
    fn test_sample_words_all_come_from_the_pool() {
        let bank = WordBank::default();
        let pool: HashSet<&str> = DEFAULT_WORDS.iter().copied().collect();

        for word in bank.sample(WORDS_PER_TURN) {
            assert!(pool.contains(word.as_str()));
        }
    }

    #[test]
    fn test_sample_from_small_pool_returns_whole_pool() {
        let bank =
            WordBank::new(vec!["cat".to_string(), "dog".to_string()]);

        let drawn = bank.sample(WORDS_PER_TURN);

        assert_eq!(drawn.len(), 2);
    }

    #[test]
    fn test_default_pool_is_large_enough_for_a_turn() {
        assert!(WordBank::default().len() >= WORDS_PER_TURN);
    }
}
