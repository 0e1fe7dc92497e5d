//! Copy-on-write reveal operations over a [`Board`].
//!
//! None of these functions look at the game status: on a finished board they behave
//! exactly like on a live one, deciding whether a move is allowed is the session's
//! job.

use alloc::vec::Vec;
use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::*;

/// A cell exposed by a reveal together with the number it shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCell {
    pub coords: Coord2,
    pub adjacent_mines: u8,
}

/// Cells exposed by one action, in first-visit order.
///
/// Keeps the flat `y * width + x` indices next to the cells since the ledger takes
/// them positionally paired with the adjacency counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealBatch {
    width: Coord,
    cells: Vec<RevealedCell>,
    cell_indices: Vec<u32>,
}

impl RevealBatch {
    pub fn new(width: Coord) -> Self {
        Self {
            width,
            cells: Vec::new(),
            cell_indices: Vec::new(),
        }
    }

    pub fn push(&mut self, coords: Coord2, adjacent_mines: u8) {
        self.cells.push(RevealedCell {
            coords,
            adjacent_mines,
        });
        self.cell_indices.push(cell_index(coords, self.width));
    }

    /// Appends `other` after the cells already in this batch.
    pub fn merge(&mut self, other: RevealBatch) {
        debug_assert_eq!(self.width, other.width);
        self.cells.extend(other.cells);
        self.cell_indices.extend(other.cell_indices);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[RevealedCell] {
        &self.cells
    }

    pub fn cell_indices(&self) -> &[u32] {
        &self.cell_indices
    }

    pub fn adjacent_mines(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.adjacent_mines).collect()
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        self.cells.iter().any(|cell| cell.coords == coords)
    }
}

/// Result of a chord: the new board, what it exposed, and the mine it hit if any.
#[derive(Clone, Debug, PartialEq)]
pub struct ChordReveal {
    pub board: Board,
    pub batch: RevealBatch,
    pub detonated: Option<Coord2>,
}

/// Opens a single closed cell without cascading.
pub fn reveal_one(board: &Board, coords: Coord2, now: DateTime<Utc>) -> Result<Board> {
    let coords = board.validate_coords(coords)?;
    if !board[coords].state().is_closed() {
        return Ok(board.clone());
    }
    Ok(board.with_cell_mutated(coords, |cell| {
        cell.open(now);
    }))
}

/// Collects the cells a click on `coords` exposes, without touching the board.
///
/// Depth-first from `coords`: a cell is taken when it is closed and not a mine, and
/// only zero cells expand further. The explicit stack pops cells in the same order a
/// recursive walk would call them, neighbours in [`DISPLACEMENTS`] order.
pub fn flood_fill(board: &Board, coords: Coord2) -> Result<RevealBatch> {
    let coords = board.validate_coords(coords)?;
    let mut batch = RevealBatch::new(board.width());
    let mut visited = HashSet::new();
    let mut to_visit = Vec::from([coords]);

    while let Some(visit_coords) = to_visit.pop() {
        let cell = &board[visit_coords];
        if visited.contains(&visit_coords) || !cell.state().is_closed() || cell.is_mine() {
            continue;
        }
        visited.insert(visit_coords);

        let adjacent_mines = cell.adjacent_mines();
        batch.push(visit_coords, adjacent_mines);
        log::trace!(
            "Flood visited {:?}, adjacent mines: {}",
            visit_coords,
            adjacent_mines
        );

        if adjacent_mines == 0 {
            let neighbors: Vec<_> = board.iter_neighbors(visit_coords).collect();
            to_visit.extend(neighbors.into_iter().rev());
        }
    }

    Ok(batch)
}

/// Opens every still-closed cell of `batch` with the count it carries.
///
/// Cells that are no longer closed are skipped, so applying a batch twice is the
/// same as applying it once.
pub fn apply_reveal_batch(board: &Board, batch: &RevealBatch, now: DateTime<Utc>) -> Board {
    let mut board = board.clone();
    for revealed in batch.cells() {
        if !board.contains(revealed.coords) {
            log::warn!("Skipping out of bounds batch entry {:?}", revealed.coords);
            continue;
        }
        let cell = board.cell_mut(revealed.coords);
        if cell.open(now) {
            cell.adjacent_mines = revealed.adjacent_mines;
        }
    }
    board
}

/// Flips `Closed <-> Flagged`, open cells are left alone.
pub fn toggle_flag(board: &Board, coords: Coord2) -> Result<Board> {
    let coords = board.validate_coords(coords)?;
    if board[coords].state().is_open() {
        return Ok(board.clone());
    }
    Ok(board.with_cell_mutated(coords, |cell| {
        cell.toggle_flag();
    }))
}

pub fn count_flagged_neighbors(board: &Board, coords: Coord2) -> u8 {
    board
        .iter_neighbors(coords)
        .filter(|&pos| board[pos].state().is_flagged())
        .count() as u8
}

/// An open numbered cell whose flagged neighbours match its number exactly.
pub fn can_chord(board: &Board, coords: Coord2) -> Result<bool> {
    let cell = board.try_get(coords)?;
    Ok(cell.state().is_open()
        && !cell.is_mine()
        && cell.adjacent_mines() > 0
        && count_flagged_neighbors(board, coords) == cell.adjacent_mines())
}

/// Reveals every closed neighbour of a chordable cell.
///
/// Neighbours are handled in [`DISPLACEMENTS`] order. Zero neighbours flood, and the
/// first unflagged mine is opened and ends the chord with the board as it stands.
pub fn chord_reveal(board: &Board, coords: Coord2, now: DateTime<Utc>) -> Result<ChordReveal> {
    let mut chord = ChordReveal {
        board: board.clone(),
        batch: RevealBatch::new(board.width()),
        detonated: None,
    };
    if !can_chord(board, coords)? {
        return Ok(chord);
    }

    for pos in board.iter_neighbors(coords) {
        let cell = chord.board[pos];
        if !cell.state().is_closed() {
            continue;
        }

        if cell.is_mine() {
            chord.board.cell_mut(pos).open(now);
            chord.detonated = Some(pos);
            log::debug!("Chord at {:?} opened mine at {:?}", coords, pos);
            break;
        }

        if cell.adjacent_mines() == 0 {
            let flood = flood_fill(&chord.board, pos)?;
            chord.board = apply_reveal_batch(&chord.board, &flood, now);
            chord.batch.merge(flood);
        } else {
            chord.board.cell_mut(pos).open(now);
            chord.batch.push(pos, cell.adjacent_mines());
        }
    }

    Ok(chord)
}
