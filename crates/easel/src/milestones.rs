//! Achievement/reward observation hooks.
//!
//! An identity layer (platform achievements, analytics) can watch a few
//! fixed moments in a match. Purely observational: every hook has a
//! no-op default, the controller never inspects a result, and nothing in
//! match state depends on an implementation being present at all.

/// Fixed match milestones an observer can react to.
///
/// Hooks fire on every occurrence; "first time ever" bookkeeping (the
/// usual achievement rule) belongs to the implementor.
pub trait Milestones: Send + 'static {
    /// A match started on this peer.
    fn match_started(&mut self) {}

    /// The local player guessed, correctly or not.
    fn local_guess(&mut self, _correct: bool) {}

    /// A turn finished; `turn_number` is the turn that just ended.
    fn turn_finished(&mut self, _turn_number: u64) {}
}

/// The default observer: ignores everything.
pub struct NoMilestones;

impl Milestones for NoMilestones {}
