//! Turn state machine for Easel matches.
//!
//! Owns the turn number, the per-turn word subset, guess bookkeeping, and
//! the local guess countdown value. Deliberately knows nothing about the
//! network or the participant registry: the match controller feeds it
//! decoded turn data and remote guesses, asks it for local role-free
//! facts, and moves the results where they need to go.
//!
//! The countdown *timer* lives in [`GuessCountdown`], a thin async pacer
//! meant for a `tokio::select!` loop; the countdown *value* lives in
//! [`TurnEngine`] and only changes when the controller forwards a tick.
//! That split keeps all match-state mutation on one task.

mod countdown;
mod engine;
mod words;

pub use countdown::GuessCountdown;
pub use engine::{
    LocalGuess, RemoteGuess, TurnEngine, COUNTDOWN_START,
};
pub use words::WordBank;

/// The local peer's role for one turn, derived from the turn number and
/// the sorted active membership — never transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    /// Painting and holding the secret word.
    Artist,
    /// Watching strokes and guessing under the countdown.
    Guessing,
}
