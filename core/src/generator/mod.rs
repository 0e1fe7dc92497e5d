use crate::*;
pub use fixed::*;
pub use random::*;

mod fixed;
mod random;

/// Materializes the mine layout of a board, once, on the first reveal.
pub trait MineGenerator {
    /// Returns a copy of `board` holding `mine_count` mines with adjacency counts
    /// filled in. `safe` is the first revealed cell.
    fn place_mines(&mut self, board: &Board, mine_count: CellCount, safe: Coord2) -> Result<Board>;
}

impl<G: MineGenerator + ?Sized> MineGenerator for &mut G {
    fn place_mines(&mut self, board: &Board, mine_count: CellCount, safe: Coord2) -> Result<Board> {
        (**self).place_mines(board, mine_count, safe)
    }
}

/// Checks shared by every generator before anything is written.
fn check_placement(board: &Board, safe: Coord2) -> Result<Coord2> {
    let safe = board.validate_coords(safe)?;
    if board.has_mines() {
        return Err(GameError::MinesAlreadyPlaced);
    }
    Ok(safe)
}

/// Writes the given mines, recomputes adjacency and marks the layout as placed.
fn materialize(board: &Board, mines: impl IntoIterator<Item = Coord2>) -> Board {
    let mut board = board.clone();
    for coords in mines {
        board.cell_mut(coords).is_mine = true;
    }
    crate::adjacency::recompute_adjacency(&mut board);
    board.mark_mines_placed();
    board
}
