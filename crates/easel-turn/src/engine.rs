//! Per-turn match state: words, guesses, and the countdown value.

use std::collections::HashSet;

use easel_protocol::PersistentId;
use rand::Rng;

use crate::words::{WordBank, WORDS_PER_TURN};

/// The countdown value at the start of each guessing turn. It decrements
/// once per tick down to a floor of 1, and a correct guess is worth the
/// value at the moment the guess is submitted.
pub const COUNTDOWN_START: u32 = 30;

/// Outcome of a *local* guess submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalGuess {
    /// Countdown value captured at submission — what a correct guess is
    /// worth, and what gets stamped into the outgoing envelope either way.
    pub potential_points: u32,
    /// Whether the guessed index matched the secret word.
    pub correct: bool,
}

/// Outcome of a guess envelope received from a remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteGuess {
    /// That peer already guessed this turn; the envelope is discarded
    /// so it can't be double-counted.
    Duplicate,
    /// Correct guess; award `points` to the guesser.
    Correct { points: u32 },
    /// Wrong word; recorded, nothing awarded.
    Incorrect,
}

/// Owns everything that resets at a turn boundary, plus the monotonic
/// turn number that doesn't.
///
/// Role derivation (artist vs guesser) deliberately lives elsewhere — it
/// needs the registry's sorted membership, and this type stays a pure
/// function of turn data and guess events.
pub struct TurnEngine {
    bank: WordBank,
    turn_number: u64,
    turn_words: Vec<String>,
    correct_word_index: usize,
    /// Who has guessed this turn, by stable identity. Cleared at turn
    /// start; also the remote double-count guard.
    guessers: HashSet<PersistentId>,
    has_local_guessed: bool,
    countdown: u32,
}

impl TurnEngine {
    pub fn new(bank: WordBank) -> Self {
        Self {
            bank,
            turn_number: 0,
            turn_words: Vec::new(),
            correct_word_index: 0,
            guessers: HashSet::new(),
            has_local_guessed: false,
            countdown: COUNTDOWN_START,
        }
    }

    /// Enters the given turn with transmitted (or freshly dealt) turn
    /// data, resetting all per-turn bookkeeping.
    pub fn begin_turn(
        &mut self,
        turn_number: u64,
        words: Vec<String>,
        correct_word_index: usize,
    ) {
        tracing::info!(
            turn = turn_number,
            words = words.len(),
            "turn began"
        );
        self.turn_number = turn_number;
        self.turn_words = words;
        self.correct_word_index = correct_word_index;
        self.guessers.clear();
        self.has_local_guessed = false;
        self.countdown = COUNTDOWN_START;
    }

    /// Deals words for `turn_number`, begins it locally, and returns the
    /// `(turn_number, words, correct_word_index)` tuple for broadcast.
    fn deal(&mut self, turn_number: u64) -> (u64, Vec<String>, usize) {
        let words = self.bank.sample(WORDS_PER_TURN);
        // A degenerate bank deals an unplayable but non-panicking turn.
        let correct = if words.is_empty() {
            0
        } else {
            rand::rng().random_range(0..words.len())
        };
        self.begin_turn(turn_number, words.clone(), correct);
        (turn_number, words, correct)
    }

    /// Deals the opening turn of a match (turn number unchanged).
    pub fn start_match(&mut self) -> (u64, Vec<String>, usize) {
        self.deal(self.turn_number)
    }

    /// Ends the current turn: increments the turn number and deals the
    /// next one. Artist-only and player-initiated — there is no timeout
    /// and guessers cannot force this.
    pub fn end_turn(&mut self) -> (u64, Vec<String>, usize) {
        self.deal(self.turn_number + 1)
    }

    /// Records a local guess.
    ///
    /// Returns `None` if the local peer already guessed this turn — a
    /// strict no-op: no state change, and the caller must not send an
    /// envelope. Otherwise the countdown stops and its captured value is
    /// the guess's point worth.
    pub fn submit_guess(
        &mut self,
        local_id: &PersistentId,
        word_index: usize,
    ) -> Option<LocalGuess> {
        if self.has_local_guessed {
            tracing::debug!("repeat local guess ignored");
            return None;
        }
        self.has_local_guessed = true;
        self.guessers.insert(local_id.clone());
        let correct = word_index == self.correct_word_index;
        tracing::info!(
            turn = self.turn_number,
            word_index,
            correct,
            points = self.countdown,
            "local guess submitted"
        );
        Some(LocalGuess {
            potential_points: self.countdown,
            correct,
        })
    }

    /// Records a guess received from a remote peer.
    ///
    /// Each peer gets one counted guess per turn; repeats are reported as
    /// [`RemoteGuess::Duplicate`] and must not be awarded again.
    pub fn on_guess_received(
        &mut self,
        guesser: PersistentId,
        word_index: usize,
        potential_points: u32,
    ) -> RemoteGuess {
        if !self.guessers.insert(guesser.clone()) {
            tracing::warn!(
                %guesser,
                turn = self.turn_number,
                "duplicate guess envelope discarded"
            );
            return RemoteGuess::Duplicate;
        }
        if word_index == self.correct_word_index {
            RemoteGuess::Correct {
                points: potential_points,
            }
        } else {
            RemoteGuess::Incorrect
        }
    }

    /// One countdown tick: decrements toward the floor of 1. Frozen once
    /// the local guess is in. Returns the current value.
    pub fn tick(&mut self) -> u32 {
        if !self.has_local_guessed && self.countdown > 1 {
            self.countdown -= 1;
        }
        self.countdown
    }

    /// Whether every guesser has guessed, given how many active
    /// participants are *not* the artist this turn.
    pub fn all_guessed(&self, non_artist_count: usize) -> bool {
        non_artist_count > 0 && self.guessers.len() >= non_artist_count
    }

    pub fn turn_number(&self) -> u64 {
        self.turn_number
    }

    /// The secret word, or `None` before the first turn is dealt.
    pub fn current_word(&self) -> Option<&str> {
        self.turn_words
            .get(self.correct_word_index)
            .map(String::as_str)
    }

    /// This turn's candidate words.
    pub fn words(&self) -> &[String] {
        &self.turn_words
    }

    pub fn correct_word_index(&self) -> usize {
        self.correct_word_index
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn has_local_guessed(&self) -> bool {
        self.has_local_guessed
    }

    pub fn guesser_count(&self) -> usize {
        self.guessers.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
