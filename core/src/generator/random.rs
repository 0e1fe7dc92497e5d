use alloc::vec::Vec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Uniform placement over every cell outside the 3x3 safe zone around the first
/// revealed cell.
///
/// Candidates are sampled without replacement, so generation never retries and
/// always finishes in one pass over the board.
#[derive(Clone, Debug)]
pub struct RandomMineGenerator<R = SmallRng> {
    rng: R,
}

impl RandomMineGenerator<SmallRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomMineGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> MineGenerator for RandomMineGenerator<R> {
    fn place_mines(&mut self, board: &Board, mine_count: CellCount, safe: Coord2) -> Result<Board> {
        let safe = check_placement(board, safe)?;

        let in_safe_zone = |(x, y): Coord2| x.abs_diff(safe.0) <= 1 && y.abs_diff(safe.1) <= 1;
        let candidates: Vec<Coord2> = board
            .iter_cells()
            .map(Cell::coords)
            .filter(|&coords| !in_safe_zone(coords))
            .collect();

        if usize::from(mine_count) > candidates.len() {
            return Err(GameError::TooManyMines {
                requested: mine_count,
                available: candidates.len() as CellCount,
            });
        }

        let picked = rand::seq::index::sample(
            &mut self.rng,
            candidates.len(),
            usize::from(mine_count),
        );
        log::debug!(
            "Placing {} mines on {:?} board, safe cell {:?}",
            mine_count,
            board.size(),
            safe
        );

        Ok(materialize(board, picked.into_iter().map(|i| candidates[i])))
    }
}
