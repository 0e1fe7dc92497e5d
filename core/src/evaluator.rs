use crate::*;

/// Every safe cell is open.
///
/// Loss is not a board predicate, it is the event of opening a mine and is raised by
/// whoever performed the reveal.
pub fn has_won(board: &Board, total_mines: CellCount) -> bool {
    let safe_cells = board.total_cells().saturating_sub(total_mines);
    let open_safe = board.count_cells(|cell| !cell.is_mine() && cell.state().is_open());
    open_safe == safe_cells
}

/// Mine that was opened, if any.
pub fn detonated_mine(board: &Board) -> Option<Coord2> {
    board
        .iter_cells()
        .find(|cell| cell.is_mine() && cell.state().is_open())
        .map(Cell::coords)
}
