//! Core protocol types for Easel's wire format.
//!
//! Everything here gets serialized to bytes, sent to other peers, and
//! deserialized on the far side. Five message kinds cover the whole game:
//! paint a cell, wipe the canvas, start a turn, record a guess, and
//! announce a participant joining or leaving.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A participant's stable identity, surviving reconnection.
///
/// For a mesh match this is derived from the platform profile id; for a
/// relay match it comes from the device identity. Either way it is the key
/// for score continuity and turn ordering: every peer sorts the set of
/// `PersistentId`s the same way, so everyone derives the same artist for a
/// given turn number without any coordination message.
///
/// `#[serde(transparent)]` makes this serialize as a plain string, not as
/// a one-field object — `PersistentId("p1")` becomes `"p1"` in JSON.
///
/// `Ord` matters here: the deterministic turn order is "ascending sort of
/// persistent ids", so the derive is part of the protocol contract.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersistentId(pub String);

impl fmt::Display for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PersistentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PersistentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A transport-routing address for one peer.
///
/// Unlike [`PersistentId`], this is opaque to the game and may change every
/// time a peer reconnects (a relay endpoint id, a socket address, a channel
/// label). It is only ever used to target a send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagingId(pub String);

impl fmt::Display for MessagingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessagingId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for MessagingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// One player in a drawing match.
///
/// A participant can arrive over either topology, which is why it carries
/// two ids: the routing address ([`MessagingId`]) and the stable identity
/// ([`PersistentId`]). The two transports populate these differently during
/// their connect handshakes, so "same person" is an asymmetric check — see
/// [`Participant::is_same_person`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Address used to target a send. May change across reconnects.
    pub messaging_id: MessagingId,

    /// Stable identity used for scores and turn order.
    pub persistent_id: PersistentId,

    /// Name shown next to this participant's score.
    pub display_name: String,

    /// Optional reference to an avatar image (a URL or platform URI).
    pub avatar_ref: Option<String>,

    /// Accumulated score this match. Only ever increased by point awards.
    pub score: u32,

    /// True exactly for the local registry's own entry.
    ///
    /// This flag is receiver-relative, so it never travels on the wire:
    /// a `ParticipantChange` describing *me* is still *them* on every
    /// other peer. `#[serde(skip)]` drops it on encode and defaults it to
    /// `false` on decode.
    #[serde(skip)]
    pub is_local: bool,
}

impl Participant {
    /// Creates a remote participant with a zero score.
    pub fn new(
        messaging_id: impl Into<MessagingId>,
        persistent_id: impl Into<PersistentId>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            messaging_id: messaging_id.into(),
            persistent_id: persistent_id.into(),
            display_name: display_name.into(),
            avatar_ref: None,
            score: 0,
            is_local: false,
        }
    }

    /// Creates the local peer's own entry (`is_local` set).
    pub fn local(
        messaging_id: impl Into<MessagingId>,
        persistent_id: impl Into<PersistentId>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            is_local: true,
            ..Self::new(messaging_id, persistent_id, display_name)
        }
    }

    /// Returns `true` if `other` refers to the same person.
    ///
    /// Two records match when *either* id matches. The mesh transport fills
    /// both ids with the same value while the relay transport uses an
    /// endpoint id and a device id, so requiring both to match would break
    /// one topology and requiring a specific one would break the other.
    pub fn is_same_person(&self, other: &Participant) -> bool {
        self.messaging_id == other.messaging_id
            || self.persistent_id == other.persistent_id
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.persistent_id)
    }
}

// ---------------------------------------------------------------------------
// DrawMessage — the wire envelope
// ---------------------------------------------------------------------------

/// Every message exchanged during a match.
///
/// This is a closed tagged union: `#[serde(tag = "type")]` embeds an
/// explicit discriminator in the JSON (`{"type": "Stroke", "x": 3, ...}`),
/// and decoding is exhaustive over exactly these five kinds. Anything with
/// a missing or unrecognized tag, or a payload that doesn't match its
/// declared kind, fails with
/// [`ProtocolError::MalformedEnvelope`](crate::ProtocolError::MalformedEnvelope).
///
/// Messages are values: the sender builds one, serializes it, and forgets
/// it. Receivers decode into local state and drop the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DrawMessage {
    /// The artist painted one cell; mirror it on the local canvas.
    Stroke { x: u8, y: u8, color_index: u8 },

    /// The artist wiped the canvas; do the same locally.
    Clear,

    /// A new turn is starting. Sent by the previous artist when they end
    /// their turn (and by the turn-0 artist at match start). Carries
    /// everything a guesser needs: the candidate words in display order
    /// and which index is the secret word.
    TurnStart {
        turn_number: u64,
        words: Vec<String>,
        correct_word_index: usize,
    },

    /// A guesser picked a word. `potential_points` is the guesser's local
    /// countdown value at submission time; receivers award it as-is when
    /// the guess is correct — there is no acknowledgement round.
    Guess {
        word_index: usize,
        potential_points: u32,
        guesser_id: PersistentId,
    },

    /// A participant joined (`is_joining`) or left the match.
    ParticipantChange {
        participant: Participant,
        is_joining: bool,
    },
}

impl DrawMessage {
    /// Checks protocol-level validity that deserialization can't express.
    ///
    /// A `TurnStart` whose `correct_word_index` falls outside its own word
    /// list decodes fine but can never be played; receivers drop it.
    pub fn validate(&self) -> Result<(), crate::ProtocolError> {
        match self {
            DrawMessage::TurnStart {
                words,
                correct_word_index,
                ..
            } if *correct_word_index >= words.len() => {
                Err(crate::ProtocolError::InvalidMessage(format!(
                    "correct_word_index {} out of range for {} words",
                    correct_word_index,
                    words.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Short name of this message's kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            DrawMessage::Stroke { .. } => "Stroke",
            DrawMessage::Clear => "Clear",
            DrawMessage::TurnStart { .. } => "TurnStart",
            DrawMessage::Guess { .. } => "Guess",
            DrawMessage::ParticipantChange { .. } => "ParticipantChange",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
