use thiserror::Error;

use crate::CellCount;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board must be at least one cell wide and tall")]
    EmptyBoard,
    #[error("Too many mines, requested {requested} but only {available} cells are available")]
    TooManyMines {
        requested: CellCount,
        available: CellCount,
    },
    #[error("Mines have already been placed on this board")]
    MinesAlreadyPlaced,
}

pub type Result<T> = core::result::Result<T, GameError>;
