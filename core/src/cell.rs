use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Coord2;

/// Player-visible state of a cell, exactly one at a time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Closed,
    Open,
    Flagged,
}

impl CellState {
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }
}

/// A single board cell.
///
/// `is_mine` is only written by mine placement, `adjacent_mines` is only meaningful
/// for cells without a mine.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    coords: Coord2,
    pub(crate) state: CellState,
    pub(crate) is_mine: bool,
    pub(crate) adjacent_mines: u8,
    pub(crate) revealed_at: Option<DateTime<Utc>>,
}

impl Cell {
    pub const fn new(coords: Coord2) -> Self {
        Self {
            coords,
            state: CellState::Closed,
            is_mine: false,
            adjacent_mines: 0,
            revealed_at: None,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        self.coords
    }

    pub const fn state(&self) -> CellState {
        self.state
    }

    pub const fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub const fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    pub const fn revealed_at(&self) -> Option<DateTime<Utc>> {
        self.revealed_at
    }

    /// Opens a closed cell, returns whether anything changed.
    pub fn open(&mut self, now: DateTime<Utc>) -> bool {
        if !self.state.is_closed() {
            return false;
        }
        self.state = CellState::Open;
        self.revealed_at = Some(now);
        true
    }

    /// Flips `Closed <-> Flagged`, returns whether anything changed.
    pub fn toggle_flag(&mut self) -> bool {
        self.state = match self.state {
            CellState::Closed => CellState::Flagged,
            CellState::Flagged => CellState::Closed,
            CellState::Open => return false,
        };
        true
    }
}
