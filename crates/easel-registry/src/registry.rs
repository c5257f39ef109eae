//! The participant registry: membership, scores, and turn order.
//!
//! # Concurrency note
//!
//! `Registry` is NOT thread-safe by itself — it's a plain struct over
//! `HashMap`s. This is intentional: all match-state mutation happens on
//! the match controller's single task, so locking here would only hide
//! that invariant. The countdown timer and inbound network traffic are
//! funneled into that same task as events before they ever touch this.

use std::collections::HashMap;

use easel_protocol::{Participant, PersistentId};

use crate::RegistryError;

/// What [`Registry::upsert`] did with the incoming record.
///
/// The match controller cares about the distinction: a `Rejoined` outcome
/// means the restored score must be re-broadcast so peers that never saw
/// this participant depart still converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting — added as a new active participant.
    Joined,
    /// A former participant came back; their old record (and score) was
    /// promoted to active, with the incoming record's transient fields
    /// (messaging id, display name, avatar) overwriting the stale ones.
    Rejoined,
    /// Already active; only transient fields were refreshed.
    AlreadyActive,
}

/// Tracks every participant in the current match.
///
/// ## Lifecycle
///
/// ```text
/// upsert() ──→ [active] ──remove()──→ [former] ──upsert()──→ [active]
///                                        │                  (score kept)
///                                        └──end_match()──→ discarded
/// ```
///
/// A participant is created on first sighting, parked in the former set on
/// disconnect (not destroyed — a later rejoin restores the prior score),
/// and only permanently discarded when the match ends.
///
/// ## Turn order
///
/// The artist for turn `T` is the participant at index `T mod N` in the
/// ascending sort of active persistent ids. This is the synchronization
/// primitive of the whole engine: it's a pure function of membership and
/// the turn number, so every peer derives the same answer from its own
/// registry without a turn-assignment message ever being sent. Any change
/// to this ordering silently breaks turn agreement across builds.
pub struct Registry {
    /// Active participants, keyed by persistent id.
    active: HashMap<PersistentId, Participant>,

    /// Participants that were in this match at one time but left.
    former: HashMap<PersistentId, Participant>,

    /// The local peer's own persistent id (always present in `active`
    /// until the match ends).
    local_id: PersistentId,
}

impl Registry {
    /// Creates a registry seeded with the local peer's own entry.
    pub fn new(local: Participant) -> Self {
        let local_id = local.persistent_id.clone();
        let mut active = HashMap::new();
        active.insert(local_id.clone(), local);
        Self {
            active,
            former: HashMap::new(),
            local_id,
        }
    }

    /// Adds or refreshes a participant.
    ///
    /// - Unknown id → inserted as-is (including any score the record
    ///   carries, which is how a rejoin re-broadcast reaches peers that
    ///   joined after the departure).
    /// - Former participant → promoted back to active carrying their
    ///   *old* score; the incoming record only contributes transient
    ///   fields. Rejoin restores score, not identity.
    /// - Already active → transient fields refreshed, score untouched
    ///   (a plain join envelope always carries score 0 and must not wipe
    ///   a live score).
    pub fn upsert(&mut self, incoming: Participant) -> UpsertOutcome {
        let id = incoming.persistent_id.clone();

        if let Some(mut returning) = self.former.remove(&id) {
            returning.messaging_id = incoming.messaging_id;
            returning.display_name = incoming.display_name;
            returning.avatar_ref = incoming.avatar_ref;
            tracing::info!(
                participant = %id,
                score = returning.score,
                "participant rejoined, score restored"
            );
            self.active.insert(id, returning);
            return UpsertOutcome::Rejoined;
        }

        if let Some(existing) = self.active.get_mut(&id) {
            existing.messaging_id = incoming.messaging_id;
            existing.display_name = incoming.display_name;
            existing.avatar_ref = incoming.avatar_ref;
            return UpsertOutcome::AlreadyActive;
        }

        tracing::info!(participant = %id, "participant joined");
        self.active.insert(id, incoming);
        UpsertOutcome::Joined
    }

    /// Moves a participant from active to former.
    ///
    /// Returns the removed record, or `None` if the id wasn't active
    /// (idempotent — removing twice is a no-op).
    pub fn remove(&mut self, id: &PersistentId) -> Option<Participant> {
        let departed = self.active.remove(id)?;
        tracing::info!(
            participant = %id,
            score = departed.score,
            "participant departed, record parked for rejoin"
        );
        self.former.insert(id.clone(), departed.clone());
        Some(departed)
    }

    /// Looks up an active participant.
    pub fn get(&self, id: &PersistentId) -> Option<&Participant> {
        self.active.get(id)
    }

    /// Looks up an active participant by routing address. Linear scan;
    /// used only when a link drops and all we have is the address.
    pub fn find_by_messaging(
        &self,
        messaging_id: &easel_protocol::MessagingId,
    ) -> Option<&Participant> {
        self.active
            .values()
            .find(|p| &p.messaging_id == messaging_id)
    }

    /// The local peer's own entry.
    pub fn local(&self) -> &Participant {
        // The local entry is inserted in `new` and never removed while
        // the registry exists.
        self.active
            .get(&self.local_id)
            .expect("local participant always registered")
    }

    /// The local peer's persistent id.
    pub fn local_id(&self) -> &PersistentId {
        &self.local_id
    }

    /// Active persistent ids in ascending order.
    ///
    /// This exact ordering is the turn-order contract (see the type-level
    /// docs); everything that derives a role goes through here.
    pub fn active_ordered_ids(&self) -> Vec<PersistentId> {
        let mut ids: Vec<PersistentId> =
            self.active.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The artist for the given turn, or `None` when nobody is active.
    pub fn artist_id(&self, turn_number: u64) -> Option<PersistentId> {
        let ids = self.active_ordered_ids();
        if ids.is_empty() {
            return None;
        }
        let index = (turn_number % ids.len() as u64) as usize;
        Some(ids[index].clone())
    }

    /// Whether the local peer is the artist for the given turn.
    ///
    /// With no participants registered there is no meaningful order; we
    /// default to "my turn" so a host alone in a fresh match starts as
    /// the artist.
    pub fn is_local_turn(&self, turn_number: u64) -> bool {
        match self.artist_id(turn_number) {
            Some(artist) => artist == self.local_id,
            None => {
                tracing::warn!("no participants — defaulting to local turn");
                true
            }
        }
    }

    /// The score of an active participant.
    pub fn score_of(&self, id: &PersistentId) -> Option<u32> {
        self.active.get(id).map(|p| p.score)
    }

    /// Awards points to a participant. Deltas are non-negative by type;
    /// no mechanism exists to deduct points.
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownParticipant`] if the id isn't
    /// active — e.g. a guess arriving just after its sender departed.
    /// Callers log and move on.
    pub fn add_score(
        &mut self,
        id: &PersistentId,
        delta: u32,
    ) -> Result<u32, RegistryError> {
        let participant = self
            .active
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownParticipant(id.clone()))?;
        participant.score = participant.score.saturating_add(delta);
        tracing::debug!(
            participant = %id,
            delta,
            score = participant.score,
            "score awarded"
        );
        Ok(participant.score)
    }

    /// Active participants in turn order, for score tables and rosters.
    pub fn scoreboard(&self) -> Vec<Participant> {
        self.active_ordered_ids()
            .into_iter()
            .filter_map(|id| self.active.get(&id).cloned())
            .collect()
    }

    /// Number of active participants.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Discards every record, active and former. Called when the match
    /// ends — this is the only point where former participants are
    /// permanently forgotten.
    pub fn end_match(&mut self) {
        self.active.clear();
        self.former.clear();
    }
}

// =========================================================================
// Tests
// =========================================================================
