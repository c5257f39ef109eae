//! The match controller actor.
//!
//! One isolated Tokio task owns every piece of mutable match state — the
//! participant registry, the turn engine, the canvas — and everything
//! else talks to it through channels. Local UI actions arrive as
//! [`Command`]s via a [`MatchHandle`], network traffic arrives as
//! [`LinkEvent`]s from the transport adapter, and the guess countdown is
//! a timer branch in the same `select!` loop. No shared mutable state,
//! just message passing.
//!
//! Contract with the negotiation layer: a peer's self-introduction
//! (`ParticipantChange`, joining) must carry the same messaging id the
//! link was registered under, or targeted sends back to it go nowhere.

use tokio::sync::{mpsc, oneshot};

use easel_protocol::{
    Codec, DrawMessage, MessagingId, Participant, PersistentId,
};
use easel_registry::{Registry, UpsertOutcome};
use easel_transport::{LinkEvent, TransportAdapter};
use easel_turn::{
    GuessCountdown, RemoteGuess, TurnEngine, TurnRole, WordBank,
};

use crate::{Canvas, EaselError, Milestones};

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// Everything needed to spawn a match.
pub struct MatchSetup<C: Codec> {
    /// The local player's own record (score 0, `is_local` set).
    pub local: Participant,
    /// Topology backend, selected at match setup.
    pub transport: Box<dyn TransportAdapter>,
    /// Wire codec shared by every peer in the match.
    pub codec: C,
    /// Where stroke and clear effects land.
    pub canvas: Box<dyn Canvas>,
    /// Achievement/reward observer. Use
    /// [`NoMilestones`](crate::NoMilestones) when there isn't one.
    pub milestones: Box<dyn Milestones>,
    /// The adapter's event stream.
    pub link_events: mpsc::UnboundedReceiver<LinkEvent>,
    /// Word pool to deal turns from.
    pub word_bank: WordBank,
}

/// Why a match stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The local player left.
    LocalLeft,
    /// The relay host vanished — unrecoverable for a relay client.
    HostDeparted,
}

/// Observations surfaced to the UI layer. Fire-and-forget; the match
/// never waits on an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// A new turn began and the local role was re-derived.
    TurnBegan { turn_number: u64, role: TurnRole },

    /// The guess countdown decremented (guessing turns only).
    CountdownTick { remaining: u32 },

    /// A guess resolved, locally or remotely. `points` is what was
    /// awarded — 0 for a wrong guess.
    GuessResult {
        guesser: PersistentId,
        correct: bool,
        points: u32,
    },

    /// Every guesser has guessed. Emitted only on the artist's peer.
    AllGuessed,

    /// Someone joined (or rejoined, with their old score restored).
    ParticipantJoined {
        participant: Participant,
        rejoined: bool,
    },

    /// Someone left. Their score survives in case they rejoin.
    ParticipantLeft { participant: Participant },

    /// The match is over on this peer; the handle is dead.
    Ended { reason: EndReason },
}

/// Snapshot answering the few questions a UI actually asks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub turn_number: u64,
    pub role: TurnRole,
    /// This turn's candidate words (what guessers pick from).
    pub words: Vec<String>,
    /// The secret word. Present on every peer — concealing it from the
    /// guessers' *screens* is the UI's job, not the engine's.
    pub current_word: Option<String>,
    pub countdown: u32,
    /// Active participants in turn order.
    pub scoreboard: Vec<Participant>,
}

enum Command {
    BeginMatch,
    DrawStroke { x: u8, y: u8, color_index: u8 },
    ClearCanvas,
    SubmitGuess { word_index: usize },
    EndTurn,
    Leave,
    GetInfo { reply: oneshot::Sender<MatchInfo> },
}

/// Handle to a running match actor. Cheap to clone.
#[derive(Clone)]
pub struct MatchHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl MatchHandle {
    fn send(&self, cmd: Command) -> Result<(), EaselError> {
        self.commands.send(cmd).map_err(|_| EaselError::MatchClosed)
    }

    /// Starts the match once the roster is assembled. Call it on every
    /// peer: only the one that derives itself as artist for turn 0
    /// deals and broadcasts the opening turn, the rest start on
    /// receipt. Ignored if the match already started.
    pub fn begin_match(&self) -> Result<(), EaselError> {
        self.send(Command::BeginMatch)
    }

    /// Paints one cell and disseminates the stroke (artist only).
    pub fn draw_stroke(
        &self,
        x: u8,
        y: u8,
        color_index: u8,
    ) -> Result<(), EaselError> {
        self.send(Command::DrawStroke { x, y, color_index })
    }

    /// Wipes the canvas everywhere (artist only).
    pub fn clear_canvas(&self) -> Result<(), EaselError> {
        self.send(Command::ClearCanvas)
    }

    /// Submits the local guess for this turn. At most one per turn;
    /// repeats are silently ignored.
    pub fn submit_guess(
        &self,
        word_index: usize,
    ) -> Result<(), EaselError> {
        self.send(Command::SubmitGuess { word_index })
    }

    /// Ends the local artist's turn and deals the next one.
    pub fn end_turn(&self) -> Result<(), EaselError> {
        self.send(Command::EndTurn)
    }

    /// Leaves the match: announces the departure, drops every link, and
    /// stops the actor.
    pub fn leave(&self) -> Result<(), EaselError> {
        self.send(Command::Leave)
    }

    /// Requests a state snapshot.
    pub async fn info(&self) -> Result<MatchInfo, EaselError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::GetInfo { reply: reply_tx })?;
        reply_rx.await.map_err(|_| EaselError::MatchClosed)
    }
}

/// Spawns the match actor. Returns its handle and the event stream.
pub fn spawn_match<C: Codec>(
    setup: MatchSetup<C>,
) -> (MatchHandle, mpsc::UnboundedReceiver<MatchEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let actor = MatchActor {
        registry: Registry::new(setup.local),
        engine: TurnEngine::new(setup.word_bank),
        transport: setup.transport,
        codec: setup.codec,
        canvas: setup.canvas,
        milestones: setup.milestones,
        countdown: GuessCountdown::new(),
        commands: cmd_rx,
        link_events: setup.link_events,
        events: event_tx,
        started: false,
    };

    tokio::spawn(actor.run());

    (MatchHandle { commands: cmd_tx }, event_rx)
}

// ---------------------------------------------------------------------------
// The actor
// ---------------------------------------------------------------------------

struct MatchActor<C: Codec> {
    registry: Registry,
    engine: TurnEngine,
    transport: Box<dyn TransportAdapter>,
    codec: C,
    canvas: Box<dyn Canvas>,
    milestones: Box<dyn Milestones>,
    countdown: GuessCountdown,
    commands: mpsc::UnboundedReceiver<Command>,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
    events: mpsc::UnboundedSender<MatchEvent>,
    /// Set once the first turn is dealt or received.
    started: bool,
}

impl<C: Codec> MatchActor<C> {
    async fn run(mut self) {
        tracing::info!(
            local = %self.registry.local_id(),
            "match actor started"
        );

        loop {
            let keep_running = tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    // Every handle dropped — same as an explicit leave.
                    None => self.finish(EndReason::LocalLeft),
                },
                Some(event) = self.link_events.recv() => {
                    self.handle_link_event(event)
                }
                _ = self.countdown.wait_for_tick() => {
                    self.handle_tick()
                }
            };
            if !keep_running {
                break;
            }
        }

        tracing::info!("match actor stopped");
    }

    // -- local commands ----------------------------------------------------

    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::BeginMatch => {
                self.handle_begin_match();
                true
            }
            Command::DrawStroke { x, y, color_index } => {
                if self.local_role() != TurnRole::Artist {
                    tracing::debug!("stroke ignored, not the artist");
                    return true;
                }
                self.send_all(
                    &DrawMessage::Stroke { x, y, color_index },
                    None,
                );
                self.canvas.paint_cell(x, y, color_index);
                true
            }
            Command::ClearCanvas => {
                if self.local_role() != TurnRole::Artist {
                    tracing::debug!("clear ignored, not the artist");
                    return true;
                }
                self.send_all(&DrawMessage::Clear, None);
                self.canvas.clear_all();
                true
            }
            Command::SubmitGuess { word_index } => {
                self.handle_local_guess(word_index);
                true
            }
            Command::EndTurn => {
                if self.local_role() != TurnRole::Artist {
                    tracing::debug!("end turn ignored, not the artist");
                    return true;
                }
                let ended = self.engine.turn_number();
                let (turn_number, words, correct_word_index) =
                    self.engine.end_turn();
                self.milestones.turn_finished(ended);
                self.send_all(
                    &DrawMessage::TurnStart {
                        turn_number,
                        words,
                        correct_word_index,
                    },
                    None,
                );
                self.enter_turn();
                true
            }
            Command::Leave => {
                let local = self.registry.local().clone();
                self.send_all(
                    &DrawMessage::ParticipantChange {
                        participant: local,
                        is_joining: false,
                    },
                    None,
                );
                self.finish(EndReason::LocalLeft)
            }
            Command::GetInfo { reply } => {
                let _ = reply.send(self.info());
                true
            }
        }
    }

    fn handle_local_guess(&mut self, word_index: usize) {
        if self.local_role() == TurnRole::Artist {
            tracing::debug!("guess ignored, local peer is the artist");
            return;
        }
        let local_id = self.registry.local_id().clone();
        let Some(guess) = self.engine.submit_guess(&local_id, word_index)
        else {
            // Already guessed this turn: no envelope, no state change.
            return;
        };
        self.countdown.disarm();
        self.milestones.local_guess(guess.correct);
        self.send_all(
            &DrawMessage::Guess {
                word_index,
                potential_points: guess.potential_points,
                guesser_id: local_id.clone(),
            },
            None,
        );
        // Optimistic local award — no acknowledgement expected.
        let points = if guess.correct {
            match self
                .registry
                .add_score(&local_id, guess.potential_points)
            {
                Ok(_) => guess.potential_points,
                Err(e) => {
                    tracing::warn!(error = %e, "local award failed");
                    0
                }
            }
        } else {
            0
        };
        self.emit(MatchEvent::GuessResult {
            guesser: local_id,
            correct: guess.correct,
            points,
        });
    }

    // -- transport events --------------------------------------------------

    fn handle_link_event(&mut self, event: LinkEvent) -> bool {
        match event {
            LinkEvent::PeerConnected { peer } => {
                // Introduce ourselves; the full identity (persistent id,
                // name, current score) travels in-band because the link
                // layer only knows routing addresses.
                let local = self.registry.local().clone();
                self.send_one(
                    &peer,
                    &DrawMessage::ParticipantChange {
                        participant: local,
                        is_joining: true,
                    },
                );
                true
            }
            LinkEvent::PeerDisconnected { peer } => {
                self.handle_peer_disconnected(peer)
            }
            LinkEvent::Inbound { from, bytes } => {
                match self.codec.decode::<DrawMessage>(&bytes) {
                    Ok(msg) => self.dispatch(msg),
                    Err(e) => {
                        // Never fatal: drop the envelope and move on.
                        tracing::warn!(
                            %from,
                            error = %e,
                            "malformed envelope dropped"
                        );
                        true
                    }
                }
            }
        }
    }

    fn handle_peer_disconnected(&mut self, peer: MessagingId) -> bool {
        if let Some(departed) =
            self.registry.find_by_messaging(&peer).cloned()
        {
            self.registry.remove(&departed.persistent_id);
            // Relay clients can't observe this link dying; announce the
            // departure in-band. Mesh peers see it twice — removal is
            // idempotent, so the echo is harmless.
            self.send_all(
                &DrawMessage::ParticipantChange {
                    participant: departed.clone(),
                    is_joining: false,
                },
                None,
            );
            self.emit(MatchEvent::ParticipantLeft {
                participant: departed,
            });
        }

        if self.transport.host_id() == Some(peer) {
            tracing::warn!("relay host unreachable, leaving match");
            return self.finish(EndReason::HostDeparted);
        }
        true
    }

    // -- inbound dispatch --------------------------------------------------

    fn dispatch(&mut self, msg: DrawMessage) -> bool {
        if let Err(e) = msg.validate() {
            tracing::warn!(
                kind = msg.kind(),
                error = %e,
                "invalid envelope dropped"
            );
            return true;
        }
        match msg {
            DrawMessage::Stroke { x, y, color_index } => {
                self.canvas.paint_cell(x, y, color_index);
                true
            }
            DrawMessage::Clear => {
                self.canvas.clear_all();
                true
            }
            DrawMessage::TurnStart {
                turn_number,
                words,
                correct_word_index,
            } => {
                self.on_turn_start(turn_number, words, correct_word_index);
                true
            }
            DrawMessage::Guess {
                word_index,
                potential_points,
                guesser_id,
            } => {
                self.on_guess(guesser_id, word_index, potential_points);
                true
            }
            DrawMessage::ParticipantChange {
                participant,
                is_joining,
            } => {
                if is_joining {
                    self.on_participant_joined(participant);
                    true
                } else {
                    self.on_participant_left(participant)
                }
            }
        }
    }

    fn on_turn_start(
        &mut self,
        turn_number: u64,
        words: Vec<String>,
        correct_word_index: usize,
    ) {
        // The turn number never moves backwards. A replayed snapshot for
        // the current turn would wipe live guess state, and cross-peer
        // reordering can deliver an old artist's turn data after a newer
        // turn already began; both are dropped.
        if self.started && turn_number <= self.engine.turn_number() {
            tracing::debug!(
                turn = turn_number,
                current = self.engine.turn_number(),
                "stale turn start dropped"
            );
            return;
        }
        if self.started {
            self.milestones.turn_finished(self.engine.turn_number());
        }
        self.engine.begin_turn(turn_number, words, correct_word_index);
        self.enter_turn();
    }

    fn on_guess(
        &mut self,
        guesser: PersistentId,
        word_index: usize,
        potential_points: u32,
    ) {
        if guesser == *self.registry.local_id() {
            // Our own guess reflected back through a relay.
            return;
        }
        let outcome = self.engine.on_guess_received(
            guesser.clone(),
            word_index,
            potential_points,
        );
        match outcome {
            RemoteGuess::Duplicate => return,
            RemoteGuess::Correct { points } => {
                if let Err(e) = self.registry.add_score(&guesser, points)
                {
                    // Guess from a peer that just departed: no-op.
                    tracing::warn!(error = %e, "award skipped");
                }
                self.emit(MatchEvent::GuessResult {
                    guesser,
                    correct: true,
                    points,
                });
            }
            RemoteGuess::Incorrect => {
                self.emit(MatchEvent::GuessResult {
                    guesser,
                    correct: false,
                    points: 0,
                });
            }
        }

        // The artist alone gets the "everyone has guessed" nudge; it's a
        // UI affordance, never an enforced turn end.
        let guesser_count = self.registry.active_len().saturating_sub(1);
        if self.local_role() == TurnRole::Artist
            && self.engine.all_guessed(guesser_count)
        {
            self.emit(MatchEvent::AllGuessed);
        }
    }

    fn on_participant_joined(&mut self, participant: Participant) {
        if self.registry.local().is_same_person(&participant) {
            // A sibling's view of us — relevant only after a rejoin,
            // when it remembers more score than our fresh process does.
            // Either id may match: a record from before the rejoin
            // carries our old address but our persistent id.
            let local_id = self.registry.local_id().clone();
            let known = self.registry.score_of(&local_id).unwrap_or(0);
            if participant.score > known {
                let _ = self
                    .registry
                    .add_score(&local_id, participant.score - known);
                tracing::info!(
                    score = participant.score,
                    "own score restored from sibling"
                );
            }
            return;
        }

        let outcome = self.registry.upsert(participant.clone());
        let rejoined = outcome == UpsertOutcome::Rejoined;
        if outcome != UpsertOutcome::AlreadyActive {
            // First sighting of this peer (fresh or rejoining):
            // introduce ourselves back, so a newcomer who only shook
            // hands with the relay host still learns every sibling's
            // identity. Terminates because the echo lands as
            // `AlreadyActive` on the other side.
            let local = self.registry.local().clone();
            self.send_one(
                &participant.messaging_id,
                &DrawMessage::ParticipantChange {
                    participant: local,
                    is_joining: true,
                },
            );
        }
        if rejoined {
            // Re-broadcast the restored record so peers that never saw
            // the departure (and the rejoiner itself) converge on the
            // restored score.
            if let Some(restored) =
                self.registry.get(&participant.persistent_id).cloned()
            {
                self.send_all(
                    &DrawMessage::ParticipantChange {
                        participant: restored,
                        is_joining: true,
                    },
                    None,
                );
            }
        }
        if outcome != UpsertOutcome::AlreadyActive {
            self.emit(MatchEvent::ParticipantJoined {
                participant: participant.clone(),
                rejoined,
            });
        }

        // Mid-match join: the artist owns the turn data, so it alone
        // sends the newcomer a snapshot of the current turn.
        if self.started && self.local_role() == TurnRole::Artist {
            self.send_one(
                &participant.messaging_id,
                &DrawMessage::TurnStart {
                    turn_number: self.engine.turn_number(),
                    words: self.engine.words().to_vec(),
                    correct_word_index: self.engine.correct_word_index(),
                },
            );
        }
    }

    fn on_participant_left(&mut self, participant: Participant) -> bool {
        if self.registry.local().is_same_person(&participant) {
            // A stale echo of our own departure; the local entry stays
            // until the actor itself finishes.
            return true;
        }
        if self.registry.remove(&participant.persistent_id).is_some() {
            self.emit(MatchEvent::ParticipantLeft {
                participant: participant.clone(),
            });
        }
        // A graceful host goodbye ends the match for relay clients just
        // like a dead host link does.
        if self.transport.host_id() == Some(participant.messaging_id) {
            tracing::warn!("relay host left, leaving match");
            return self.finish(EndReason::HostDeparted);
        }
        true
    }

    // -- countdown ---------------------------------------------------------

    fn handle_tick(&mut self) -> bool {
        let remaining = self.engine.tick();
        self.emit(MatchEvent::CountdownTick { remaining });
        if remaining <= 1 {
            // Floor reached; a correct guess stays worth 1 from here on,
            // so there's nothing left to count down.
            self.countdown.disarm();
        }
        true
    }

    // -- shared plumbing ---------------------------------------------------

    /// Turn 0 needs exactly one dealer; deriving it from the assembled
    /// roster (rather than racing on "first to connect") keeps every
    /// peer's word list identical.
    fn handle_begin_match(&mut self) {
        if self.started {
            tracing::debug!("begin ignored, match already started");
            return;
        }
        if !self.registry.is_local_turn(self.engine.turn_number()) {
            // Another peer deals; we start when its turn data arrives.
            return;
        }
        let (turn_number, words, correct_word_index) =
            self.engine.start_match();
        self.send_all(
            &DrawMessage::TurnStart {
                turn_number,
                words,
                correct_word_index,
            },
            None,
        );
        self.enter_turn();
    }

    /// Applies a just-begun turn: fresh canvas, countdown armed for
    /// guessers only, observers notified.
    fn enter_turn(&mut self) {
        self.canvas.clear_all();
        let role = self.local_role();
        match role {
            TurnRole::Artist => self.countdown.disarm(),
            TurnRole::Guessing => self.countdown.arm(),
        }
        if !self.started {
            self.started = true;
            self.milestones.match_started();
        }
        self.emit(MatchEvent::TurnBegan {
            turn_number: self.engine.turn_number(),
            role,
        });
    }

    fn local_role(&self) -> TurnRole {
        if self.registry.is_local_turn(self.engine.turn_number()) {
            TurnRole::Artist
        } else {
            TurnRole::Guessing
        }
    }

    /// Tears the match down. Always returns `false` so callers can
    /// `return self.finish(..)` out of the actor loop.
    fn finish(&mut self, reason: EndReason) -> bool {
        tracing::info!(?reason, "match ended");
        self.countdown.disarm();
        self.transport.shutdown();
        self.registry.end_match();
        self.emit(MatchEvent::Ended { reason });
        false
    }

    fn send_all(
        &self,
        msg: &DrawMessage,
        excluding: Option<&MessagingId>,
    ) {
        match self.codec.encode(msg) {
            Ok(bytes) => self.transport.broadcast(&bytes, excluding),
            Err(e) => {
                tracing::error!(
                    kind = msg.kind(),
                    error = %e,
                    "encode failed, envelope not sent"
                );
            }
        }
    }

    fn send_one(&self, to: &MessagingId, msg: &DrawMessage) {
        match self.codec.encode(msg) {
            Ok(bytes) => self.transport.send_to(to, &bytes),
            Err(e) => {
                tracing::error!(
                    kind = msg.kind(),
                    error = %e,
                    "encode failed, envelope not sent"
                );
            }
        }
    }

    fn emit(&self, event: MatchEvent) {
        // The observer may be gone; the match doesn't care.
        let _ = self.events.send(event);
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            turn_number: self.engine.turn_number(),
            role: self.local_role(),
            words: self.engine.words().to_vec(),
            current_word: self.engine.current_word().map(str::to_owned),
            countdown: self.engine.countdown(),
            scoreboard: self.registry.scoreboard(),
        }
    }
}
