use core::ops::Index;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Rectangular grid of cells addressed by `(x, y)`.
///
/// Boards are values: every engine operation takes a `&Board` and hands back a new
/// one, so a caller can always keep or drop a previous snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mines_placed: bool,
}

impl Board {
    /// All cells closed, no mines placed yet.
    pub fn new(size: Coord2) -> Self {
        let cells = Array2::from_shape_fn(size.to_nd_index(), |(x, y)| {
            Cell::new((x as Coord, y as Coord))
        });
        Self {
            cells,
            mines_placed: false,
        }
    }

    pub fn size(&self) -> Coord2 {
        let (width, height) = self.cells.dim();
        (width as Coord, height as Coord)
    }

    pub fn width(&self) -> Coord {
        self.size().0
    }

    pub fn height(&self) -> Coord {
        self.size().1
    }

    pub fn total_cells(&self) -> CellCount {
        let (width, height) = self.size();
        mult(width, height)
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        let (width, height) = self.size();
        coords.0 < width && coords.1 < height
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    /// Cell at `coords`, panics when out of bounds.
    pub fn get(&self, coords: Coord2) -> &Cell {
        &self.cells[coords.to_nd_index()]
    }

    pub fn try_get(&self, coords: Coord2) -> Result<&Cell> {
        self.validate_coords(coords).map(|coords| self.get(coords))
    }

    /// Structural copy of this board with one cell changed by `f`.
    pub fn with_cell_mutated(&self, coords: Coord2, f: impl FnOnce(&mut Cell)) -> Board {
        let mut board = self.clone();
        f(board.cell_mut(coords));
        board
    }

    /// Whether the mine layout has materialized, it never reverts once set.
    pub fn has_mines(&self) -> bool {
        self.mines_placed
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> Neighbors {
        self.cells.iter_neighbors(coords)
    }

    /// Every cell in row-major order (`y` outer, `x` inner).
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        let (width, height) = self.size();
        (0..height).flat_map(move |y| (0..width).map(move |x| self.get((x, y))))
    }

    pub fn mine_count(&self) -> CellCount {
        self.count_cells(|cell| cell.is_mine())
    }

    pub fn open_count(&self) -> CellCount {
        self.count_cells(|cell| cell.state().is_open())
    }

    /// Open cells that are not mines, a detonated mine is not a revealed cell.
    pub fn revealed_safe_count(&self) -> CellCount {
        self.count_cells(|cell| cell.state().is_open() && !cell.is_mine())
    }

    pub fn flagged_count(&self) -> CellCount {
        self.count_cells(|cell| cell.state().is_flagged())
    }

    pub fn correct_flag_count(&self) -> CellCount {
        self.count_cells(|cell| cell.state().is_flagged() && cell.is_mine())
    }

    pub fn count_cells(&self, mut predicate: impl FnMut(&Cell) -> bool) -> CellCount {
        self.cells.iter().filter(|&cell| predicate(cell)).count() as CellCount
    }

    pub(crate) fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }

    pub(crate) fn mark_mines_placed(&mut self) {
        self.mines_placed = true;
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        self.get(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn new_board_is_closed_and_mine_free() {
        let board = Board::new((4, 3));

        assert_eq!(board.size(), (4, 3));
        assert_eq!(board.total_cells(), 12);
        assert!(!board.has_mines());
        assert!(board.iter_cells().all(|cell| {
            cell.state() == CellState::Closed && !cell.is_mine() && cell.adjacent_mines() == 0
        }));
        assert_eq!(board[(3, 2)].coords(), (3, 2));
    }

    #[test]
    fn with_cell_mutated_leaves_original_untouched() {
        let board = Board::new((2, 2));

        let flagged = board.with_cell_mutated((1, 0), |cell| {
            cell.toggle_flag();
        });

        assert_eq!(board[(1, 0)].state(), CellState::Closed);
        assert_eq!(flagged[(1, 0)].state(), CellState::Flagged);
        assert_eq!(flagged.flagged_count(), 1);
    }

    #[test]
    fn iter_cells_is_row_major() {
        let board = Board::new((3, 2));

        let coords: Vec<_> = board.iter_cells().map(Cell::coords).collect();

        assert_eq!(coords, [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn revealed_safe_count_leaves_out_open_mines() {
        let board = FixedMineGenerator::new([(0, 0)])
            .place_mines(&Board::new((2, 2)), 1, (1, 1))
            .unwrap();
        let board = board.with_cell_mutated((0, 0), |cell| {
            cell.state = CellState::Open;
        });
        let board = board.with_cell_mutated((1, 1), |cell| {
            cell.state = CellState::Open;
        });

        assert_eq!(board.open_count(), 2);
        assert_eq!(board.revealed_safe_count(), 1);
    }

    #[test]
    fn try_get_rejects_out_of_bounds() {
        let board = Board::new((2, 2));

        assert_eq!(board.try_get((2, 0)), Err(GameError::InvalidCoords));
        assert!(board.try_get((1, 1)).is_ok());
    }
}
