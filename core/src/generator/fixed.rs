use alloc::vec::Vec;

use super::*;

/// Places a predetermined layout, used for replays and shared boards.
///
/// The layout is trusted as given: the safe cell is only bounds checked, so a
/// fixed layout may put a mine under the first click.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedMineGenerator {
    mines: Vec<Coord2>,
}

impl FixedMineGenerator {
    pub fn new(mines: impl IntoIterator<Item = Coord2>) -> Self {
        Self {
            mines: mines.into_iter().collect(),
        }
    }
}

impl MineGenerator for FixedMineGenerator {
    fn place_mines(&mut self, board: &Board, mine_count: CellCount, safe: Coord2) -> Result<Board> {
        check_placement(board, safe)?;
        for &coords in &self.mines {
            board.validate_coords(coords)?;
        }

        let board = materialize(board, self.mines.iter().copied());
        let placed = board.mine_count();
        if placed != mine_count {
            log::warn!(
                "Fixed layout mine count mismatch, actual: {}, requested: {}",
                placed,
                mine_count
            );
        }
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_given_layout() {
        let board = FixedMineGenerator::new([(0, 0), (1, 1)])
            .place_mines(&Board::new((2, 2)), 2, (1, 0))
            .unwrap();

        assert!(board[(0, 0)].is_mine());
        assert!(board[(1, 1)].is_mine());
        assert_eq!(board[(1, 0)].adjacent_mines(), 2);
    }

    #[test]
    fn rejects_out_of_bounds_layout() {
        let result = FixedMineGenerator::new([(5, 0)]).place_mines(&Board::new((2, 2)), 1, (0, 0));

        assert_eq!(result, Err(GameError::InvalidCoords));
    }
}
