//! The seam between local play and the remote ledger.
//!
//! The session only ever emits [`LedgerIntent`]s into a [`LedgerOutbox`] and gets
//! [`LedgerNotice`]s back. Nothing here waits: the board stays authoritative for play
//! whatever the ledger answers, notices only move bookkeeping.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::*;

/// Opaque game identifier assigned by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteGameId(String);

impl RemoteGameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteGameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlates a request with the notice that answers it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionHandle(pub u64);

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Requests the session wants delivered to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerIntent {
    CreateGame {
        handle: SubmissionHandle,
        difficulty: Difficulty,
    },
    /// `cell_indices` and `adjacent_mines` are positionally paired, in reveal order.
    SubmitRevealBatch {
        handle: SubmissionHandle,
        game: RemoteGameId,
        cell_indices: Vec<u32>,
        adjacent_mines: Vec<u8>,
    },
    ToggleFlag {
        game: RemoteGameId,
        coords: Coord2,
    },
    ClaimWin {
        game: RemoteGameId,
    },
}

/// Coarse answers coming back from the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerNotice {
    GameCreated {
        handle: SubmissionHandle,
        game: RemoteGameId,
    },
    GameCreationFailed {
        handle: SubmissionHandle,
        reason: String,
    },
    BatchConfirmed {
        handle: SubmissionHandle,
    },
    BatchRejected {
        handle: SubmissionHandle,
        reason: String,
    },
}

/// Where outbound intents go, delivery and retries are the receiver's business.
pub trait LedgerOutbox {
    fn submit(&mut self, intent: LedgerIntent);
}

impl LedgerOutbox for Vec<LedgerIntent> {
    fn submit(&mut self, intent: LedgerIntent) {
        self.push(intent);
    }
}

impl<O: LedgerOutbox + ?Sized> LedgerOutbox for &mut O {
    fn submit(&mut self, intent: LedgerIntent) {
        (**self).submit(intent);
    }
}

#[cfg(feature = "std")]
impl LedgerOutbox for futures_channel::mpsc::UnboundedSender<LedgerIntent> {
    fn submit(&mut self, intent: LedgerIntent) {
        if let Err(err) = self.unbounded_send(intent) {
            log::warn!("Ledger outbox closed, dropping {:?}", err.into_inner());
        }
    }
}

/// Whether the session has a game on the ledger yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerLink {
    /// Creation requested, intents are held back until the id arrives.
    AwaitingGame(SubmissionHandle),
    Linked(RemoteGameId),
    /// Creation failed, play continues locally and nothing more is sent.
    Unlinked,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    /// Waiting for the game id before it can be sent.
    Deferred,
    Pending,
    Confirmed,
    Rejected,
}

impl SubmissionStatus {
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum DeferredIntent {
    RevealBatch {
        handle: SubmissionHandle,
        cell_indices: Vec<u32>,
        adjacent_mines: Vec<u8>,
    },
    ToggleFlag {
        coords: Coord2,
    },
    ClaimWin,
}

impl DeferredIntent {
    fn into_intent(self, game: RemoteGameId) -> LedgerIntent {
        match self {
            Self::RevealBatch {
                handle,
                cell_indices,
                adjacent_mines,
            } => LedgerIntent::SubmitRevealBatch {
                handle,
                game,
                cell_indices,
                adjacent_mines,
            },
            Self::ToggleFlag { coords } => LedgerIntent::ToggleFlag { game, coords },
            Self::ClaimWin => LedgerIntent::ClaimWin { game },
        }
    }
}

/// Per-session ledger bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    link: LedgerLink,
    deferred: Vec<DeferredIntent>,
    submissions: BTreeMap<SubmissionHandle, SubmissionStatus>,
    submitted_cells: HashSet<u32>,
}

impl LedgerState {
    pub(crate) fn awaiting(creation: SubmissionHandle) -> Self {
        Self {
            link: LedgerLink::AwaitingGame(creation),
            deferred: Vec::new(),
            submissions: BTreeMap::new(),
            submitted_cells: HashSet::new(),
        }
    }

    pub fn link(&self) -> &LedgerLink {
        &self.link
    }

    pub fn remote_game_id(&self) -> Option<&RemoteGameId> {
        match &self.link {
            LedgerLink::Linked(game) => Some(game),
            _ => None,
        }
    }

    pub fn submission_status(&self, handle: SubmissionHandle) -> Option<SubmissionStatus> {
        self.submissions.get(&handle).copied()
    }

    /// Batches not yet confirmed or rejected, oldest first.
    pub fn unconfirmed(&self) -> impl Iterator<Item = SubmissionHandle> + '_ {
        self.submissions
            .iter()
            .filter(|(_, status)| !status.is_settled())
            .map(|(&handle, _)| handle)
    }

    pub fn rejected(&self) -> impl Iterator<Item = SubmissionHandle> + '_ {
        self.submissions
            .iter()
            .filter(|(_, status)| matches!(status, SubmissionStatus::Rejected))
            .map(|(&handle, _)| handle)
    }

    /// Nothing is held back and every batch has an answer.
    pub fn is_settled(&self) -> bool {
        self.deferred.is_empty() && self.unconfirmed().next().is_none()
    }

    /// Queues `batch` under `handle`, minus any cell already handed out before.
    ///
    /// Returns `None` when nothing was left to send or the session is unlinked.
    pub(crate) fn submit_batch(
        &mut self,
        handle: SubmissionHandle,
        batch: &RevealBatch,
        outbox: &mut impl LedgerOutbox,
    ) -> Option<SubmissionHandle> {
        if matches!(self.link, LedgerLink::Unlinked) {
            return None;
        }

        let mut cell_indices = Vec::with_capacity(batch.len());
        let mut adjacent_mines = Vec::with_capacity(batch.len());
        for (&index, cell) in batch.cell_indices().iter().zip(batch.cells()) {
            if self.submitted_cells.insert(index) {
                cell_indices.push(index);
                adjacent_mines.push(cell.adjacent_mines);
            } else {
                log::warn!("Cell {} was already submitted, leaving it out", index);
            }
        }
        if cell_indices.is_empty() {
            return None;
        }

        let deferred = DeferredIntent::RevealBatch {
            handle,
            cell_indices,
            adjacent_mines,
        };
        let status = self.dispatch(deferred, outbox);
        self.submissions.insert(handle, status);
        Some(handle)
    }

    pub(crate) fn submit_flag(&mut self, coords: Coord2, outbox: &mut impl LedgerOutbox) {
        self.dispatch(DeferredIntent::ToggleFlag { coords }, outbox);
    }

    pub(crate) fn claim_win(&mut self, outbox: &mut impl LedgerOutbox) {
        self.dispatch(DeferredIntent::ClaimWin, outbox);
    }

    fn dispatch(
        &mut self,
        intent: DeferredIntent,
        outbox: &mut impl LedgerOutbox,
    ) -> SubmissionStatus {
        match &self.link {
            LedgerLink::Linked(game) => {
                outbox.submit(intent.into_intent(game.clone()));
                SubmissionStatus::Pending
            }
            LedgerLink::AwaitingGame(_) => {
                self.deferred.push(intent);
                SubmissionStatus::Deferred
            }
            LedgerLink::Unlinked => SubmissionStatus::Rejected,
        }
    }

    pub(crate) fn on_notice(&mut self, notice: LedgerNotice, outbox: &mut impl LedgerOutbox) {
        use LedgerNotice::*;

        match notice {
            GameCreated { handle, game } => {
                if self.link != LedgerLink::AwaitingGame(handle) {
                    log::warn!("Ignoring stale game creation {} ({})", handle, game);
                    return;
                }
                log::debug!(
                    "Linked to remote game {}, flushing {} deferred intents",
                    game,
                    self.deferred.len()
                );
                for intent in core::mem::take(&mut self.deferred) {
                    if let DeferredIntent::RevealBatch { handle, .. } = &intent {
                        self.submissions.insert(*handle, SubmissionStatus::Pending);
                    }
                    outbox.submit(intent.into_intent(game.clone()));
                }
                self.link = LedgerLink::Linked(game);
            }
            GameCreationFailed { handle, reason } => {
                if self.link != LedgerLink::AwaitingGame(handle) {
                    log::warn!("Ignoring stale creation failure {}: {}", handle, reason);
                    return;
                }
                log::warn!("Game creation failed, continuing offline: {}", reason);
                for intent in core::mem::take(&mut self.deferred) {
                    if let DeferredIntent::RevealBatch { handle, .. } = intent {
                        self.submissions.insert(handle, SubmissionStatus::Rejected);
                    }
                }
                self.link = LedgerLink::Unlinked;
            }
            BatchConfirmed { handle } => self.settle(handle, SubmissionStatus::Confirmed),
            BatchRejected { handle, reason } => {
                log::warn!("Batch {} rejected: {}", handle, reason);
                self.settle(handle, SubmissionStatus::Rejected);
            }
        }
    }

    fn settle(&mut self, handle: SubmissionHandle, outcome: SubmissionStatus) {
        match self.submissions.get_mut(&handle) {
            Some(status) if *status == SubmissionStatus::Pending => *status = outcome,
            _ => log::warn!("Ignoring stale {:?} for batch {}", outcome, handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn batch(width: Coord, cells: &[(Coord2, u8)]) -> RevealBatch {
        let mut batch = RevealBatch::new(width);
        for &(coords, count) in cells {
            batch.push(coords, count);
        }
        batch
    }

    fn game() -> RemoteGameId {
        RemoteGameId::new("game-7")
    }

    #[test]
    fn intents_wait_for_the_game_id_and_keep_their_order() {
        let mut state = LedgerState::awaiting(SubmissionHandle(0));
        let mut outbox: Vec<LedgerIntent> = Vec::new();

        let first = batch(9, &[((0, 0), 0), ((1, 0), 1)]);
        let second = batch(9, &[((0, 1), 2)]);

        state.submit_batch(SubmissionHandle(1), &first, &mut outbox);
        state.submit_flag((5, 5), &mut outbox);
        state.submit_batch(SubmissionHandle(2), &second, &mut outbox);
        assert!(outbox.is_empty());
        assert_eq!(
            state.submission_status(SubmissionHandle(1)),
            Some(SubmissionStatus::Deferred)
        );

        state.on_notice(
            LedgerNotice::GameCreated {
                handle: SubmissionHandle(0),
                game: game(),
            },
            &mut outbox,
        );

        assert_eq!(
            outbox,
            vec![
                LedgerIntent::SubmitRevealBatch {
                    handle: SubmissionHandle(1),
                    game: game(),
                    cell_indices: vec![0, 1],
                    adjacent_mines: vec![0, 1],
                },
                LedgerIntent::ToggleFlag {
                    game: game(),
                    coords: (5, 5)
                },
                LedgerIntent::SubmitRevealBatch {
                    handle: SubmissionHandle(2),
                    game: game(),
                    cell_indices: vec![9],
                    adjacent_mines: vec![2],
                },
            ]
        );
        assert_eq!(state.remote_game_id(), Some(&game()));
        assert_eq!(
            state.unconfirmed().collect::<Vec<_>>(),
            [SubmissionHandle(1), SubmissionHandle(2)]
        );
    }

    #[test]
    fn confirmations_and_rejections_settle_batches() {
        let mut state = LedgerState::awaiting(SubmissionHandle(0));
        let mut outbox: Vec<LedgerIntent> = Vec::new();
        state.on_notice(
            LedgerNotice::GameCreated {
                handle: SubmissionHandle(0),
                game: game(),
            },
            &mut outbox,
        );
        let first = batch(9, &[((0, 0), 1)]);
        let second = batch(9, &[((1, 0), 1)]);
        state.submit_batch(SubmissionHandle(1), &first, &mut outbox);
        state.submit_batch(SubmissionHandle(2), &second, &mut outbox);

        // answers may arrive out of order
        state.on_notice(
            LedgerNotice::BatchRejected {
                handle: SubmissionHandle(2),
                reason: "stale nonce".into(),
            },
            &mut outbox,
        );
        state.on_notice(
            LedgerNotice::BatchConfirmed {
                handle: SubmissionHandle(1),
            },
            &mut outbox,
        );

        assert_eq!(
            state.submission_status(SubmissionHandle(1)),
            Some(SubmissionStatus::Confirmed)
        );
        assert_eq!(state.rejected().collect::<Vec<_>>(), [SubmissionHandle(2)]);
        assert!(state.is_settled());
    }

    #[test]
    fn a_cell_is_never_submitted_twice() {
        let mut state = LedgerState::awaiting(SubmissionHandle(0));
        let mut outbox: Vec<LedgerIntent> = Vec::new();

        let first = batch(4, &[((0, 0), 0), ((1, 0), 1)]);
        let overlapping = batch(4, &[((1, 0), 1)]);

        state.submit_batch(SubmissionHandle(1), &first, &mut outbox);
        let again = state.submit_batch(SubmissionHandle(2), &overlapping, &mut outbox);

        assert_eq!(again, None);
        assert_eq!(state.submission_status(SubmissionHandle(2)), None);
    }

    #[test]
    fn failed_creation_drops_deferred_intents() {
        let mut state = LedgerState::awaiting(SubmissionHandle(0));
        let mut outbox: Vec<LedgerIntent> = Vec::new();
        let first = batch(9, &[((0, 0), 0)]);
        state.submit_batch(SubmissionHandle(1), &first, &mut outbox);

        state.on_notice(
            LedgerNotice::GameCreationFailed {
                handle: SubmissionHandle(0),
                reason: "rejected".into(),
            },
            &mut outbox,
        );
        state.claim_win(&mut outbox);

        assert_eq!(state.link(), &LedgerLink::Unlinked);
        assert!(outbox.is_empty());
        assert_eq!(
            state.submission_status(SubmissionHandle(1)),
            Some(SubmissionStatus::Rejected)
        );
        assert!(state.is_settled());
    }

    #[test]
    fn stale_batch_answers_are_ignored() {
        let mut state = LedgerState::awaiting(SubmissionHandle(0));
        let mut outbox: Vec<LedgerIntent> = Vec::new();
        state.on_notice(
            LedgerNotice::GameCreated {
                handle: SubmissionHandle(0),
                game: game(),
            },
            &mut outbox,
        );
        let first = batch(9, &[((0, 0), 1)]);
        state.submit_batch(SubmissionHandle(1), &first, &mut outbox);
        state.on_notice(
            LedgerNotice::BatchRejected {
                handle: SubmissionHandle(1),
                reason: "stale nonce".into(),
            },
            &mut outbox,
        );

        state.on_notice(
            LedgerNotice::BatchConfirmed {
                handle: SubmissionHandle(1),
            },
            &mut outbox,
        );
        state.on_notice(
            LedgerNotice::BatchConfirmed {
                handle: SubmissionHandle(42),
            },
            &mut outbox,
        );

        assert_eq!(
            state.submission_status(SubmissionHandle(1)),
            Some(SubmissionStatus::Rejected)
        );
        assert_eq!(state.submission_status(SubmissionHandle(42)), None);
        assert!(state.is_settled());
    }

    #[test]
    fn stale_creation_is_ignored() {
        let mut state = LedgerState::awaiting(SubmissionHandle(4));
        let mut outbox: Vec<LedgerIntent> = Vec::new();

        state.on_notice(
            LedgerNotice::GameCreated {
                handle: SubmissionHandle(3),
                game: game(),
            },
            &mut outbox,
        );

        assert_eq!(state.link(), &LedgerLink::AwaitingGame(SubmissionHandle(4)));
    }

    #[cfg(feature = "std")]
    #[test]
    fn channel_outbox_delivers_intents() {
        let (mut sender, mut receiver) = futures_channel::mpsc::unbounded();

        sender.submit(LedgerIntent::ClaimWin { game: game() });

        assert_eq!(
            receiver.try_recv().unwrap(),
            LedgerIntent::ClaimWin { game: game() }
        );
    }
}
