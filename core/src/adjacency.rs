use crate::*;

/// Number of mines among the in-bounds neighbours of `coords`.
pub fn count_adjacent_mines(board: &Board, coords: Coord2) -> u8 {
    board
        .iter_neighbors(coords)
        .filter(|&pos| board[pos].is_mine())
        .count() as u8
}

/// Writes `adjacent_mines` for every non-mine cell, mine cells are left at zero.
pub(crate) fn recompute_adjacency(board: &mut Board) {
    let (width, height) = board.size();
    for y in 0..height {
        for x in 0..width {
            let coords = (x, y);
            let count = if board[coords].is_mine() {
                0
            } else {
                count_adjacent_mines(board, coords)
            };
            board.cell_mut(coords).adjacent_mines = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_in_bounds_neighbors() {
        let board = FixedMineGenerator::new([(0, 0), (2, 0), (1, 2)])
            .place_mines(&Board::new((3, 3)), 3, (2, 2))
            .unwrap();

        assert_eq!(count_adjacent_mines(&board, (1, 1)), 3);
        assert_eq!(count_adjacent_mines(&board, (0, 1)), 2);
        assert_eq!(count_adjacent_mines(&board, (2, 2)), 1);
        assert_eq!(board[(1, 1)].adjacent_mines(), 3);
        assert_eq!(board[(0, 0)].adjacent_mines(), 0);
    }
}
