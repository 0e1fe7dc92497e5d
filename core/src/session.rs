use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - NotStarted -> InProgress (first reveal places the mines)
/// - InProgress -> Won
/// - InProgress -> Lost
/// - any -> NotStarted (new game)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// One game from difficulty selection to win or loss.
///
/// Only the [`SessionController`] moves a session forward, every move swaps in a
/// new board snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    difficulty: Difficulty,
    status: GameStatus,
    board: Board,
    moves_count: u32,
    flags_placed: CellCount,
    cells_revealed: CellCount,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    detonated: Option<Coord2>,
    ledger: LedgerState,
}

impl GameSession {
    fn new(difficulty: Difficulty, creation: SubmissionHandle) -> Result<Self> {
        let config = difficulty.config();
        config.validate()?;
        Ok(Self {
            difficulty,
            status: GameStatus::NotStarted,
            board: Board::new(config.size),
            moves_count: 0,
            flags_placed: 0,
            cells_revealed: 0,
            started_at: None,
            finished_at: None,
            detonated: None,
            ledger: LedgerState::awaiting(creation),
        })
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn config(&self) -> GameConfig {
        self.difficulty.config()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves_count(&self) -> u32 {
        self.moves_count
    }

    pub fn flags_placed(&self) -> CellCount {
        self.flags_placed
    }

    pub fn cells_revealed(&self) -> CellCount {
        self.cells_revealed
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// The mine that ended the game.
    pub fn detonated(&self) -> Option<Coord2> {
        self.detonated
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    pub fn remote_game_id(&self) -> Option<&RemoteGameId> {
        self.ledger.remote_game_id()
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> i32 {
        i32::from(self.config().mines) - i32::from(self.flags_placed)
    }

    /// How many seconds have passed since the game started, 0 if it hasn't started.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        if let Some(started_at) = self.started_at {
            (self.finished_at.unwrap_or(now) - started_at)
                .num_seconds()
                .max(0) as u32
        } else {
            0
        }
    }

    fn finish(&mut self, status: GameStatus, now: DateTime<Utc>) {
        log::debug!("Game {:?} at {}", status, now);
        self.status = status;
        self.finished_at = Some(now);
    }
}

/// Drives [`GameSession`]s: turns reveal and flag intents into board snapshots and
/// hands every exposed batch to the ledger outbox.
#[derive(Debug)]
pub struct SessionController<G, O> {
    generator: G,
    outbox: O,
    next_handle: u64,
}

impl<G: MineGenerator, O: LedgerOutbox> SessionController<G, O> {
    pub fn new(generator: G, outbox: O) -> Self {
        Self {
            generator,
            outbox,
            next_handle: 0,
        }
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    /// Fresh session for `difficulty`, asking the ledger for a game id on the side.
    pub fn start(&mut self, difficulty: Difficulty) -> Result<GameSession> {
        let handle = self.next_handle();
        let session = GameSession::new(difficulty, handle)?;
        self.outbox.submit(LedgerIntent::CreateGame { handle, difficulty });
        log::debug!("New {:?} game, creation request {}", difficulty, handle);
        Ok(session)
    }

    /// Replaces `session` with a fresh one, valid from any status.
    pub fn new_game(&mut self, session: &mut GameSession, difficulty: Difficulty) -> Result<()> {
        *session = self.start(difficulty)?;
        Ok(())
    }

    pub fn reveal(
        &mut self,
        session: &mut GameSession,
        coords: Coord2,
        now: DateTime<Utc>,
    ) -> Result<RevealOutcome> {
        let coords = session.board.validate_coords(coords)?;
        if session.status.is_finished() || !session.board[coords].state().is_closed() {
            return Ok(RevealOutcome::NoChange);
        }

        if !session.board.has_mines() {
            let mines = session.config().mines;
            session.board = self.generator.place_mines(&session.board, mines, coords)?;
            session.status = GameStatus::InProgress;
            session.started_at = Some(now);
            log::debug!("Started at {}, first reveal {:?}", now, coords);
        }

        let cell = session.board[coords];
        if cell.is_mine() {
            session.board = reveal_one(&session.board, coords, now)?;
            session.moves_count = session.moves_count.saturating_add(1);
            session.detonated = Some(coords);
            session.finish(GameStatus::Lost, now);
            return Ok(RevealOutcome::HitMine);
        }

        let batch = if cell.adjacent_mines() == 0 {
            flood_fill(&session.board, coords)?
        } else {
            let mut batch = RevealBatch::new(session.board.width());
            batch.push(coords, cell.adjacent_mines());
            batch
        };
        let board = apply_reveal_batch(&session.board, &batch, now);
        Ok(self.commit_reveal(session, board, &batch, now))
    }

    pub fn toggle_flag(
        &mut self,
        session: &mut GameSession,
        coords: Coord2,
    ) -> Result<MarkOutcome> {
        let coords = session.board.validate_coords(coords)?;
        if session.status.is_finished() || session.board[coords].state().is_open() {
            return Ok(MarkOutcome::NoChange);
        }

        session.board = crate::toggle_flag(&session.board, coords)?;
        session.flags_placed = session.board.flagged_count();
        session.ledger.submit_flag(coords, &mut self.outbox);
        Ok(MarkOutcome::Changed)
    }

    /// Reveals the neighbours of an open cell whose flags are all placed.
    pub fn chord(
        &mut self,
        session: &mut GameSession,
        coords: Coord2,
        now: DateTime<Utc>,
    ) -> Result<RevealOutcome> {
        let coords = session.board.validate_coords(coords)?;
        if session.status != GameStatus::InProgress {
            return Ok(RevealOutcome::NoChange);
        }

        let chord = chord_reveal(&session.board, coords, now)?;
        if let Some(mine) = chord.detonated {
            session.board = chord.board;
            session.moves_count = session.moves_count.saturating_add(1);
            session.cells_revealed = session.board.revealed_safe_count();
            self.submit_batch(session, &chord.batch);
            session.detonated = Some(mine);
            session.finish(GameStatus::Lost, now);
            return Ok(RevealOutcome::HitMine);
        }
        if chord.batch.is_empty() {
            return Ok(RevealOutcome::NoChange);
        }

        Ok(self.commit_reveal(session, chord.board, &chord.batch, now))
    }

    /// Feeds an answer from the ledger into the session's bookkeeping.
    ///
    /// Never touches the board or the status.
    pub fn handle_notice(&mut self, session: &mut GameSession, notice: LedgerNotice) {
        session.ledger.on_notice(notice, &mut self.outbox);
    }

    fn commit_reveal(
        &mut self,
        session: &mut GameSession,
        board: Board,
        batch: &RevealBatch,
        now: DateTime<Utc>,
    ) -> RevealOutcome {
        session.board = board;
        session.moves_count = session.moves_count.saturating_add(1);
        session.cells_revealed = session.board.revealed_safe_count();
        self.submit_batch(session, batch);
        log::debug!(
            "Revealed {} cells, {} open in total",
            batch.len(),
            session.cells_revealed
        );

        let mut outcome = RevealOutcome::Revealed;
        if has_won(&session.board, session.config().mines) {
            session.finish(GameStatus::Won, now);
            session.ledger.claim_win(&mut self.outbox);
            outcome = outcome | RevealOutcome::Won;
        }
        outcome
    }

    fn submit_batch(&mut self, session: &mut GameSession, batch: &RevealBatch) {
        if batch.is_empty() {
            return;
        }
        let handle = self.next_handle();
        session.ledger.submit_batch(handle, batch, &mut self.outbox);
    }

    fn next_handle(&mut self) -> SubmissionHandle {
        let handle = SubmissionHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}
