use ndarray::Array2;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Flat `y * width + x` index used when talking to the ledger.
pub const fn cell_index((x, y): Coord2, width: Coord) -> u32 {
    (y as u32) * (width as u32) + (x as u32)
}

/// Size of the 3x3 block around `center` once clipped to `bounds`.
pub fn safe_zone_size(center: Coord2, bounds: Coord2) -> CellCount {
    1 + Neighbors::new(center, bounds).count() as CellCount
}

/// Largest safe zone any cell of a `bounds` board can have.
pub const fn max_safe_zone_size((width, height): Coord2) -> CellCount {
    let w = if width < 3 { width } else { 3 };
    let h = if height < 3 { height } else { 3 };
    mult(w, h)
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> Neighbors;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> Neighbors {
        let (width, height) = self.dim();
        let bounds = (
            Coord::try_from(width).unwrap_or(Coord::MAX),
            Coord::try_from(height).unwrap_or(Coord::MAX),
        );
        Neighbors::new(index, bounds)
    }
}

/// Neighbour offsets `(dx, dy)`, row-major: `dy` outer, `dx` inner.
///
/// Flood-fill batches are submitted in visitation order, so this order is part of
/// the observable behavior and must not change.
pub const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, (dx, dy): (i8, i8), (max_x, max_y): Coord2) -> Option<Coord2> {
    let next_x = coords.0.checked_add_signed(dx)?;
    let next_y = coords.1.checked_add_signed(dy)?;
    (next_x < max_x && next_y < max_y).then_some((next_x, next_y))
}

/// In-bounds neighbours of a cell, yielded in [`DISPLACEMENTS`] order.
#[derive(Clone, Debug)]
pub struct Neighbors {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl Neighbors {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for Neighbors {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&delta) = DISPLACEMENTS.get(usize::from(self.index)) {
            self.index += 1;
            if let Some(pos) = apply_delta(self.center, delta, self.bounds) {
                return Some(pos);
            }
        }
        None
    }
}
